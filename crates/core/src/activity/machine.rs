//! Activity Lifecycle
//!
//! Drives one activity screen through `Idle → Active → Checked → Finished`,
//! with `reset` available from every state. Learner actions that are not
//! valid in the current state, or that name unknown items or buckets, are
//! no-ops reported as `false`.

use super::content::{ActivityKind, ContentProvider, DifficultyParams, RoundContent};
use super::item::{BucketKey, ItemId};
use super::selection::{Selection, SelectionTracker};
use super::validator::{self, AttemptResult};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const DEFAULT_COMPLETION_DELAY: Duration = Duration::from_secs(2);

/// What happens to the learner's placements when they retry after an
/// incorrect check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    KeepSelection,
    ClearSelection,
}

#[derive(Debug, Clone)]
pub struct ActivityConfig {
    pub kind: ActivityKind,
    pub params: DifficultyParams,
    pub retry: RetryPolicy,
    /// How long the success state stays on screen before the finished
    /// callback fires.
    pub completion_delay: Duration,
}

impl ActivityConfig {
    pub fn new(kind: ActivityKind, retry: RetryPolicy) -> Self {
        Self {
            kind,
            params: DifficultyParams::default(),
            retry,
            completion_delay: DEFAULT_COMPLETION_DELAY,
        }
    }

    pub fn with_params(mut self, params: DifficultyParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_completion_delay(mut self, delay: Duration) -> Self {
        self.completion_delay = delay;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active,
    Checked(Verdict),
    Finished,
}

/// One round: generated content, the learner's selection, and the last
/// check result. Never reused across rounds.
#[derive(Debug)]
pub struct ActivityRound {
    content: RoundContent,
    tracker: SelectionTracker,
    attempt: Option<AttemptResult>,
}

impl ActivityRound {
    fn new(content: RoundContent) -> Self {
        let tracker = SelectionTracker::for_round(&content);
        Self {
            content,
            tracker,
            attempt: None,
        }
    }

    pub fn content(&self) -> &RoundContent {
        &self.content
    }

    pub fn selection(&self) -> &Selection {
        self.tracker.selection()
    }

    pub fn attempt(&self) -> Option<&AttemptResult> {
        self.attempt.as_ref()
    }
}

pub struct Activity {
    config: ActivityConfig,
    provider: ContentProvider,
    phase: Phase,
    round: Option<ActivityRound>,
    pending_finish: Option<JoinHandle<()>>,
}

impl Activity {
    pub fn new(config: ActivityConfig, provider: ContentProvider) -> Self {
        Self {
            config,
            provider,
            phase: Phase::Idle,
            round: None,
            pending_finish: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &ActivityConfig {
        &self.config
    }

    pub fn round(&self) -> Option<&ActivityRound> {
        self.round.as_ref()
    }

    /// `Idle → Active` with a freshly generated round.
    pub fn start(&mut self) -> bool {
        if self.phase != Phase::Idle {
            return false;
        }
        let content = self
            .provider
            .generate(&self.config.kind, &self.config.params);
        self.round = Some(ActivityRound::new(content));
        self.phase = Phase::Active;
        debug!("Activity round started");
        true
    }

    pub fn select(&mut self, id: ItemId) -> bool {
        self.with_tracker(|tracker| tracker.select(id))
    }

    pub fn deselect(&mut self, id: ItemId) -> bool {
        self.with_tracker(|tracker| tracker.deselect(id))
    }

    pub fn toggle(&mut self, id: ItemId) -> bool {
        self.with_tracker(|tracker| tracker.toggle(id))
    }

    pub fn place(&mut self, id: ItemId, bucket: &BucketKey) -> bool {
        self.with_tracker(|tracker| tracker.place_in_bucket(id, bucket))
    }

    pub fn unplace(&mut self, id: ItemId) -> bool {
        self.with_tracker(|tracker| tracker.remove_from_bucket(id))
    }

    pub fn set_count(&mut self, bucket: &BucketKey, count: usize) -> bool {
        self.with_tracker(|tracker| tracker.set_count(bucket, count))
    }

    pub fn clear(&mut self) -> bool {
        self.with_tracker(|tracker| {
            tracker.clear();
            true
        })
    }

    /// Whether `check` would do anything right now.
    pub fn can_check(&self) -> bool {
        match (&self.phase, &self.round) {
            (Phase::Active, Some(round)) => {
                validator::is_ready(round.selection(), &round.content.ground_truth)
            }
            _ => false,
        }
    }

    /// `Active → Checked`. Returns `None` without changing anything when the
    /// activity is not ready to be checked.
    pub fn check(&mut self) -> Option<&AttemptResult> {
        if !self.can_check() {
            return None;
        }
        let round = self.round.as_mut()?;
        let result = validator::check(round.tracker.selection(), &round.content.ground_truth);
        let verdict = if result.is_correct {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        };
        info!(?verdict, "Activity answer checked");
        self.phase = Phase::Checked(verdict);
        round.attempt = Some(result);
        round.attempt.as_ref()
    }

    /// `Checked(Incorrect) → Active`, applying the configured retry policy.
    pub fn retry(&mut self) -> bool {
        if self.phase != Phase::Checked(Verdict::Incorrect) {
            return false;
        }
        if let Some(round) = self.round.as_mut() {
            if self.config.retry == RetryPolicy::ClearSelection {
                round.tracker.clear();
            }
            round.attempt = None;
        }
        self.phase = Phase::Active;
        true
    }

    /// `Checked(Correct) → Finished` with no callback.
    pub fn complete(&mut self) -> bool {
        if self.phase != Phase::Checked(Verdict::Correct) {
            return false;
        }
        self.phase = Phase::Finished;
        true
    }

    /// `Checked(Correct) → Finished`, calling `on_finished` once the
    /// completion delay has passed. The callback is dropped uncalled if the
    /// activity is reset or dropped first.
    ///
    /// Outside a tokio runtime nothing changes and `false` is returned.
    pub fn complete_with<F>(&mut self, on_finished: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No tokio runtime to schedule the completion callback on");
            return false;
        };
        if !self.complete() {
            return false;
        }
        let delay = self.config.completion_delay;
        self.pending_finish = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            on_finished();
        }));
        true
    }

    /// Back to `Idle`, discarding the round and any pending finished
    /// callback. With `next_round`, immediately starts a new round.
    pub fn reset(&mut self, next_round: bool) {
        self.cancel_pending_finish();
        self.round = None;
        self.phase = Phase::Idle;
        debug!(next_round, "Activity reset");
        if next_round {
            self.start();
        }
    }

    fn with_tracker(&mut self, action: impl FnOnce(&mut SelectionTracker) -> bool) -> bool {
        match (&self.phase, self.round.as_mut()) {
            (Phase::Active, Some(round)) => action(&mut round.tracker),
            _ => {
                debug!(phase = ?self.phase, "Ignoring selection change outside the active phase");
                false
            }
        }
    }

    fn cancel_pending_finish(&mut self) {
        if let Some(handle) = self.pending_finish.take() {
            handle.abort();
        }
    }
}

impl Drop for Activity {
    fn drop(&mut self) {
        self.cancel_pending_finish();
    }
}
