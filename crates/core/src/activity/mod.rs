//! Interactive Activity Engine
//!
//! Every lesson screen follows the same pattern: generate a set of items and
//! a ground truth, let the learner pick, place, or count, then check the
//! result. This module holds that pattern once:
//!
//! - `item`: items, attributes, bucket keys, grouping definitions.
//! - `content`: seedable round generation for each activity kind.
//! - `selection`: the learner's selection state.
//! - `validator`: pure answer checking.
//! - `machine`: the per-activity lifecycle.
//! - `circle`: counting around a ring of items.

pub mod circle;
pub mod content;
pub mod item;
pub mod machine;
pub mod selection;
pub mod validator;

pub use circle::{CircleCounter, CircleState};
pub use content::{
    ActivityKind, CheckMode, ContentProvider, DifficultyParams, GroundTruth, RoundContent,
};
pub use item::{
    AgeGroup, Attributes, BucketKey, Criterion, Gender, GroupDefinition, ItemId, ItemSpec,
    ManipulableItem, Movement, Posture, Predicate, Size,
};
pub use machine::{Activity, ActivityConfig, ActivityRound, Phase, RetryPolicy, Verdict};
pub use selection::{Selection, SelectionTracker};
pub use validator::{Answer, AttemptResult};
