use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

pub const MOUTH_PERIOD: Duration = Duration::from_millis(200);

type Gate = Arc<Mutex<Option<UnboundedSender<bool>>>>;

/// A running mouth open/closed ticker. The first toggle (open) is sent one
/// period after `start`, then the state flips every period.
///
/// Dropping the value stops the ticker and sends a final `false`; no toggle
/// is ever delivered after that.
pub struct MouthAnimation {
    gate: Gate,
    ticker: JoinHandle<()>,
}

impl MouthAnimation {
    /// Must be called from within a tokio runtime.
    pub fn start(output: UnboundedSender<bool>, period: Duration) -> Self {
        let gate: Gate = Arc::new(Mutex::new(Some(output)));
        let ticker_gate = gate.clone();

        let ticker = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            let mut open = false;
            loop {
                interval.tick().await;
                open = !open;
                let delivered = {
                    let slot = ticker_gate.lock().unwrap_or_else(PoisonError::into_inner);
                    slot.as_ref().is_some_and(|tx| tx.send(open).is_ok())
                };
                if !delivered {
                    break;
                }
            }
        });

        Self { gate, ticker }
    }

    pub fn is_running(&self) -> bool {
        !self.ticker.is_finished()
    }
}

impl Drop for MouthAnimation {
    fn drop(&mut self) {
        self.ticker.abort();
        let closed = self
            .gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = closed {
            let _ = tx.send(false);
        }
    }
}
