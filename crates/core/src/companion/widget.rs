use super::{CompanionPipeline, CompanionRequest, CompanionResponse};
use crate::speech::{SpeechDevice, SpeechHandle};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetPhase {
    Hidden,
    /// Waiting for the pipeline.
    Thinking,
    Showing {
        message: String,
        used_fallback: bool,
    },
}

struct WidgetInner {
    /// Bumped on every show and close; a pipeline result carrying an older
    /// generation is discarded.
    generation: u64,
    phase: WidgetPhase,
    in_flight: bool,
    device: SpeechDevice,
    speech: Option<SpeechHandle>,
}

impl WidgetInner {
    fn silence(&mut self) {
        if let Some(handle) = self.speech.take() {
            self.device.stop(&handle);
        }
    }

    fn deliver(&mut self, generation: u64, response: CompanionResponse) {
        if self.generation != generation {
            debug!(generation, "Discarding message for a closed companion");
            return;
        }
        info!(used_fallback = response.used_fallback, "Companion message ready");
        self.in_flight = false;
        self.speech = Some(self.device.speak(response.message.clone()));
        self.phase = WidgetPhase::Showing {
            message: response.message,
            used_fallback: response.used_fallback,
        };
    }
}

/// The last clone of a widget going away silences it.
impl Drop for WidgetInner {
    fn drop(&mut self) {
        self.silence();
    }
}

/// The on-screen companion: fetches one message through the pipeline, shows
/// it and speaks it.
///
/// Clones share the same widget; dropping the last clone stops its speech.
/// A pending pipeline call does not keep the widget alive. Lock order is
/// widget state, then the speech device.
#[derive(Clone)]
pub struct CompanionWidget {
    pipeline: Arc<CompanionPipeline>,
    inner: Arc<Mutex<WidgetInner>>,
    time_budget: Duration,
}

fn lock(inner: &Mutex<WidgetInner>) -> MutexGuard<'_, WidgetInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CompanionWidget {
    pub fn new(pipeline: Arc<CompanionPipeline>, device: SpeechDevice) -> Self {
        Self {
            pipeline,
            inner: Arc::new(Mutex::new(WidgetInner {
                generation: 0,
                phase: WidgetPhase::Hidden,
                in_flight: false,
                device,
                speech: None,
            })),
            time_budget: DEFAULT_TIME_BUDGET,
        }
    }

    pub fn with_time_budget(mut self, time_budget: Duration) -> Self {
        self.time_budget = time_budget;
        self
    }

    fn lock(&self) -> MutexGuard<'_, WidgetInner> {
        lock(&self.inner)
    }

    pub fn phase(&self) -> WidgetPhase {
        self.lock().phase.clone()
    }

    /// Starts a companion invocation. Returns false, and does nothing, while
    /// another invocation is still waiting for its message.
    pub fn show(&self, request: CompanionRequest) -> bool {
        let generation = {
            let mut inner = self.lock();
            if inner.in_flight {
                debug!("Companion is already thinking, ignoring show");
                return false;
            }
            inner.silence();
            inner.generation += 1;
            inner.in_flight = true;
            inner.phase = WidgetPhase::Thinking;
            inner.generation
        };

        let pipeline = self.pipeline.clone();
        let widget = Arc::downgrade(&self.inner);
        let time_budget = self.time_budget;
        tokio::spawn(async move {
            let response = pipeline.get_message(&request, time_budget).await;
            match widget.upgrade() {
                Some(inner) => lock(&inner).deliver(generation, response),
                None => debug!("Companion was dropped before its message arrived"),
            }
        });
        true
    }

    /// Hides the widget and silences it. A message still on its way is
    /// dropped when it arrives.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.in_flight = false;
        inner.phase = WidgetPhase::Hidden;
        inner.silence();
    }

    /// Stops speech if the widget is speaking, otherwise speaks the shown
    /// message again. Returns whether the widget is speaking afterwards.
    pub fn toggle_speech(&self) -> bool {
        let mut inner = self.lock();
        let speaking = inner
            .speech
            .as_ref()
            .is_some_and(|handle| !handle.status().is_terminal());

        if speaking {
            inner.silence();
            return false;
        }

        let message = match &inner.phase {
            WidgetPhase::Showing { message, .. } => message.clone(),
            _ => return false,
        };
        let handle = inner.device.speak(message);
        inner.speech = Some(handle);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::companion::{
        InferenceError, MessageType, TextGenerator, inference::MockTextGenerator,
    };
    use crate::speech::{SpeechStatus, test_support::ScriptedEngine};
    use async_trait::async_trait;
    use tokio::sync::mpsc::{UnboundedReceiver, error::TryRecvError, unbounded_channel};

    struct SlowGenerator;

    #[async_trait]
    impl TextGenerator for SlowGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, InferenceError> {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok("Look at you go!".to_string())
        }
    }

    struct Harness {
        widget: CompanionWidget,
        device: SpeechDevice,
        engine: Arc<ScriptedEngine>,
        mouth: UnboundedReceiver<bool>,
    }

    fn harness(generator: Arc<dyn TextGenerator>) -> Harness {
        let engine = Arc::new(ScriptedEngine::auto_starting());
        let (mouth_tx, mouth) = unbounded_channel();
        let device = SpeechDevice::new(engine.clone(), mouth_tx);
        let pipeline = Arc::new(CompanionPipeline::with_seed(generator, 11));
        Harness {
            widget: CompanionWidget::new(pipeline, device.clone()),
            device,
            engine,
            mouth,
        }
    }

    fn widget_with(
        generator: Arc<dyn TextGenerator>,
    ) -> (CompanionWidget, Arc<ScriptedEngine>, UnboundedReceiver<bool>) {
        let Harness {
            widget,
            engine,
            mouth,
            ..
        } = harness(generator);
        (widget, engine, mouth)
    }

    fn failing_generator() -> Arc<dyn TextGenerator> {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .returning(|_| Err(InferenceError::MissingApiKey));
        Arc::new(mock)
    }

    fn last_mouth_value(mouth: &mut UnboundedReceiver<bool>) -> Option<bool> {
        let mut last = None;
        while let Ok(open) = mouth.try_recv() {
            last = Some(open);
        }
        last
    }

    fn request() -> CompanionRequest {
        CompanionRequest::new("Amara", "found the match", MessageType::Celebration)
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_thinks_then_speaks_message() {
        let (widget, engine, _mouth) = widget_with(Arc::new(SlowGenerator));

        assert!(widget.show(request()));
        assert_eq!(widget.phase(), WidgetPhase::Thinking);
        assert!(engine.spoken_texts().is_empty());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(
            widget.phase(),
            WidgetPhase::Showing {
                message: "Look at you go!".to_string(),
                used_fallback: false,
            }
        );
        assert_eq!(engine.spoken_texts(), vec!["Look at you go!"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_show_while_thinking_is_refused() {
        let (widget, _engine, _mouth) = widget_with(Arc::new(SlowGenerator));

        assert!(widget.show(request()));
        assert!(!widget.show(request()));

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(widget.show(request()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_message_arriving_after_close_is_ignored() {
        let (widget, engine, _mouth) = widget_with(Arc::new(SlowGenerator));

        widget.show(request());
        tokio::time::sleep(Duration::from_millis(500)).await;
        widget.close();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(widget.phase(), WidgetPhase::Hidden);
        assert!(engine.spoken_texts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_silences_speech() {
        let (widget, engine, mut mouth) = widget_with(failing_generator());

        widget.show(request());
        tokio::time::sleep(Duration::from_millis(300)).await;
        match widget.phase() {
            WidgetPhase::Showing { message, used_fallback } => {
                assert!(used_fallback);
                assert!(message.contains("Amara"));
            }
            other => panic!("unexpected phase {other:?}"),
        }

        widget.close();
        assert_eq!(engine.cancel_count(), 1);
        assert_eq!(last_mouth_value(&mut mouth), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_widget_silences_speech() {
        let Harness {
            widget,
            device,
            engine,
            mut mouth,
        } = harness(failing_generator());

        widget.show(request());
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(device.is_speaking());

        let twin = widget.clone();
        drop(widget);
        assert!(device.is_speaking());
        drop(twin);

        assert!(!device.is_speaking());
        assert_eq!(engine.cancel_count(), 1);
        assert_eq!(last_mouth_value(&mut mouth), Some(false));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(matches!(mouth.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_message_arriving_after_drop_is_not_spoken() {
        let Harness {
            widget,
            device,
            engine,
            ..
        } = harness(Arc::new(SlowGenerator));

        widget.show(request());
        tokio::time::sleep(Duration::from_millis(500)).await;
        drop(widget);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(engine.spoken_texts().is_empty());
        assert!(!device.is_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_speech_stops_and_replays() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .returning(|_| Ok("Count with me!".to_string()));
        let (widget, engine, _mouth) = widget_with(Arc::new(mock));

        assert!(!widget.toggle_speech());

        widget.show(request());
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(!widget.toggle_speech());
        assert_eq!(engine.cancel_count(), 1);

        assert!(widget.toggle_speech());
        assert_eq!(engine.spoken_texts(), vec!["Count with me!", "Count with me!"]);

        let handle = widget.lock().speech.clone();
        assert!(handle.is_some_and(|h| h.status() != SpeechStatus::Stopped));
    }
}
