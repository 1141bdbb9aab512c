use super::{MOUTH_PERIOD, MouthAnimation, SpeechEngine, SpeechEvent, Utterance, VoiceSettings};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{
    mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
    watch,
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechStatus {
    /// Handed to the engine, no start event yet.
    Pending,
    Speaking,
    Ended,
    Errored,
    /// Cancelled by `stop`, by a newer utterance or by teardown.
    Stopped,
}

impl SpeechStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SpeechStatus::Ended | SpeechStatus::Errored | SpeechStatus::Stopped
        )
    }
}

/// Returned by `SpeechDevice::speak`; identifies one utterance.
#[derive(Debug, Clone)]
pub struct SpeechHandle {
    id: u64,
    status: watch::Receiver<SpeechStatus>,
}

impl SpeechHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn status(&self) -> SpeechStatus {
        *self.status.borrow()
    }

    /// Waits until the utterance ends, errors or is stopped.
    pub async fn finished(&mut self) -> SpeechStatus {
        match self.status.wait_for(|status| status.is_terminal()).await {
            Ok(status) => *status,
            Err(_) => SpeechStatus::Stopped,
        }
    }
}

struct SessionShared {
    finished: bool,
    animation: Option<MouthAnimation>,
    status: watch::Sender<SpeechStatus>,
}

impl SessionShared {
    fn finish(&mut self, status: SpeechStatus) -> bool {
        if self.finished {
            return false;
        }
        self.finished = true;
        self.animation = None;
        self.status.send_replace(status);
        true
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The session currently holding the device. Dropping it releases
/// everything the session acquired.
struct ActiveSession {
    id: u64,
    engine: Arc<dyn SpeechEngine>,
    shared: Arc<Mutex<SessionShared>>,
    driver: JoinHandle<()>,
}

impl ActiveSession {
    fn is_finished(&self) -> bool {
        lock(&self.shared).finished
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        self.driver.abort();
        if lock(&self.shared).finish(SpeechStatus::Stopped) {
            debug!(session = self.id, "Cancelling speech");
            self.engine.cancel();
        }
    }
}

#[derive(Default)]
struct DeviceState {
    next_id: u64,
    active: Option<ActiveSession>,
}

/// Handle to the single speech device. Clones share the device; when the
/// last clone is dropped, any active utterance is cancelled.
#[derive(Clone)]
pub struct SpeechDevice {
    engine: Arc<dyn SpeechEngine>,
    voice: VoiceSettings,
    mouth: UnboundedSender<bool>,
    period: Duration,
    state: Arc<Mutex<DeviceState>>,
}

impl SpeechDevice {
    /// `mouth` receives the animation signal: `true` for open, `false` for
    /// closed. A final `false` is always sent when speech stops.
    pub fn new(engine: Arc<dyn SpeechEngine>, mouth: UnboundedSender<bool>) -> Self {
        Self {
            engine,
            voice: VoiceSettings::default(),
            mouth,
            period: MOUTH_PERIOD,
            state: Arc::new(Mutex::new(DeviceState::default())),
        }
    }

    pub fn with_voice(mut self, voice: VoiceSettings) -> Self {
        self.voice = voice;
        self
    }

    pub fn with_mouth_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Stops whatever is speaking, then starts `text`. Must be called from
    /// within a tokio runtime.
    pub fn speak(&self, text: impl Into<String>) -> SpeechHandle {
        let mut state = lock(&self.state);
        drop(state.active.take());

        let id = state.next_id;
        state.next_id += 1;

        let (status_tx, status_rx) = watch::channel(SpeechStatus::Pending);
        let shared = Arc::new(Mutex::new(SessionShared {
            finished: false,
            animation: None,
            status: status_tx,
        }));
        let (events_tx, events_rx) = unbounded_channel();
        let driver = tokio::spawn(drive_session(
            id,
            events_rx,
            shared.clone(),
            self.mouth.clone(),
            self.period,
        ));

        let utterance = Utterance {
            text: text.into(),
            voice: self.voice,
        };
        debug!(session = id, chars = utterance.text.len(), "Starting speech");
        self.engine.speak(utterance, events_tx);

        state.active = Some(ActiveSession {
            id,
            engine: self.engine.clone(),
            shared,
            driver,
        });

        SpeechHandle {
            id,
            status: status_rx,
        }
    }

    /// Stops the utterance behind `handle`. Returns false if it is no longer
    /// the device's current utterance or has already finished.
    pub fn stop(&self, handle: &SpeechHandle) -> bool {
        let mut state = lock(&self.state);
        match &state.active {
            Some(active) if active.id == handle.id => {
                let was_running = !active.is_finished();
                drop(state.active.take());
                was_running
            }
            _ => false,
        }
    }

    pub fn stop_active(&self) -> bool {
        let mut state = lock(&self.state);
        match state.active.take() {
            Some(active) => !active.is_finished(),
            None => false,
        }
    }

    pub fn is_speaking(&self) -> bool {
        lock(&self.state)
            .active
            .as_ref()
            .is_some_and(|active| !active.is_finished())
    }
}

async fn drive_session(
    id: u64,
    mut events: UnboundedReceiver<SpeechEvent>,
    shared: Arc<Mutex<SessionShared>>,
    mouth: UnboundedSender<bool>,
    period: Duration,
) {
    while let Some(event) = events.recv().await {
        match event {
            SpeechEvent::Started => {
                let mut shared = lock(&shared);
                if shared.finished {
                    return;
                }
                if shared.animation.is_none() {
                    shared.animation = Some(MouthAnimation::start(mouth.clone(), period));
                }
                shared.status.send_replace(SpeechStatus::Speaking);
            }
            SpeechEvent::Ended => {
                lock(&shared).finish(SpeechStatus::Ended);
                return;
            }
            SpeechEvent::Error(reason) => {
                warn!(session = id, error = %reason, "Speech engine reported an error");
                lock(&shared).finish(SpeechStatus::Errored);
                return;
            }
        }
    }
    // The engine dropped its sender without a final event.
    lock(&shared).finish(SpeechStatus::Ended);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::test_support::ScriptedEngine;
    use tokio::sync::mpsc::error::TryRecvError;

    fn drain(rx: &mut UnboundedReceiver<bool>) -> Vec<bool> {
        let mut values = Vec::new();
        while let Ok(value) = rx.try_recv() {
            values.push(value);
        }
        values
    }

    fn device() -> (Arc<ScriptedEngine>, SpeechDevice, UnboundedReceiver<bool>) {
        let engine = Arc::new(ScriptedEngine::default());
        let (tx, rx) = unbounded_channel();
        (engine.clone(), SpeechDevice::new(engine, tx), rx)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_animation_runs_only_while_speaking() {
        let (engine, device, mut mouth) = device();
        let mut handle = device.speak("Great job!");

        assert_eq!(engine.spoken.lock().unwrap()[0].voice, VoiceSettings::default());
        assert_eq!(handle.status(), SpeechStatus::Pending);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(drain(&mut mouth).is_empty());

        engine.emit(SpeechEvent::Started);
        settle().await;
        assert_eq!(handle.status(), SpeechStatus::Speaking);

        tokio::time::sleep(Duration::from_millis(450)).await;
        assert_eq!(drain(&mut mouth), vec![true, false]);

        engine.emit(SpeechEvent::Ended);
        assert_eq!(handle.finished().await, SpeechStatus::Ended);
        assert!(!device.is_speaking());
        assert_eq!(drain(&mut mouth), vec![false]);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(mouth.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(engine.cancel_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_tears_down_immediately() {
        let (engine, device, mut mouth) = device();
        let handle = device.speak("Keep going!");
        engine.emit(SpeechEvent::Started);
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert!(device.stop(&handle));
        assert_eq!(handle.status(), SpeechStatus::Stopped);
        assert_eq!(engine.cancel_count(), 1);
        assert_eq!(drain(&mut mouth), vec![true, false]);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(mouth.try_recv(), Err(TryRecvError::Empty));
        assert!(!device.stop(&handle));
    }

    #[tokio::test(start_paused = true)]
    async fn test_speaking_twice_keeps_one_session() {
        let (engine, device, mut mouth) = device();
        let first = device.speak("one");
        engine.emit(SpeechEvent::Started);
        settle().await;

        let second = device.speak("two");
        assert_eq!(first.status(), SpeechStatus::Stopped);
        assert_eq!(engine.cancel_count(), 1);
        engine.emit(SpeechEvent::Started);
        settle().await;
        assert_eq!(second.status(), SpeechStatus::Speaking);
        assert_eq!(engine.spoken_texts(), vec!["one", "two"]);

        drain(&mut mouth);
        tokio::time::sleep(Duration::from_millis(450)).await;
        // A leaked first timer would double the toggles.
        assert_eq!(drain(&mut mouth), vec![true, false]);

        assert!(!device.stop(&first));
        assert!(device.stop(&second));
        drain(&mut mouth);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(mouth.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_error_cleans_up_like_end() {
        let (engine, device, mut mouth) = device();
        let mut handle = device.speak("oops");
        engine.emit(SpeechEvent::Started);
        settle().await;
        engine.emit(SpeechEvent::Error("audio device busy".to_string()));

        assert_eq!(handle.finished().await, SpeechStatus::Errored);
        assert!(!device.is_speaking());
        assert_eq!(drain(&mut mouth).last(), Some(&false));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(mouth.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(engine.cancel_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_device_cancels_speech() {
        let (engine, device, mut mouth) = device();
        let handle = device.speak("bye");
        engine.emit(SpeechEvent::Started);
        settle().await;

        drop(device);
        assert_eq!(handle.status(), SpeechStatus::Stopped);
        assert_eq!(engine.cancel_count(), 1);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(drain(&mut mouth), vec![false]);
        assert_eq!(mouth.try_recv(), Err(TryRecvError::Disconnected));
    }
}
