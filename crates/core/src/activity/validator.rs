//! Answer checking. Pure functions, no side effects, no partial credit.

use super::content::{CheckMode, GroundTruth};
use super::item::{BucketKey, ItemId};
use super::selection::Selection;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Members(BTreeMap<BucketKey, BTreeSet<ItemId>>),
    Counts(BTreeMap<BucketKey, usize>),
}

/// Outcome of one "check" action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptResult {
    pub is_correct: bool,
    pub expected: Answer,
    pub actual: Answer,
}

/// Whether `selection` is complete enough to be checked at all: something
/// selected, every item placed, or every part guessed, depending on the mode.
/// A sorting round where nothing belongs can be checked with nothing
/// selected.
pub fn is_ready(selection: &Selection, truth: &GroundTruth) -> bool {
    match truth.mode {
        CheckMode::SetEquality => {
            !selection.included().is_empty()
                || truth
                    .groups
                    .get(&BucketKey::included())
                    .is_none_or(BTreeSet::is_empty)
        }
        CheckMode::PartitionEquality => selection.placed_count() == truth.item_count(),
        CheckMode::CountPerPart => truth
            .groups
            .keys()
            .all(|key| selection.count(key).is_some()),
    }
}

pub fn check(selection: &Selection, truth: &GroundTruth) -> AttemptResult {
    match truth.mode {
        CheckMode::SetEquality => {
            let included = BucketKey::included();
            let expected: BTreeSet<ItemId> =
                truth.groups.get(&included).cloned().unwrap_or_default();
            let actual: BTreeSet<ItemId> = selection.included().iter().copied().collect();
            AttemptResult {
                is_correct: expected == actual,
                expected: Answer::Members(BTreeMap::from([(included.clone(), expected)])),
                actual: Answer::Members(BTreeMap::from([(included, actual)])),
            }
        }
        CheckMode::PartitionEquality => {
            let expected: BTreeMap<BucketKey, BTreeSet<ItemId>> = truth
                .groups
                .iter()
                .filter(|(_, ids)| !ids.is_empty())
                .map(|(key, ids)| (key.clone(), ids.clone()))
                .collect();
            let actual = selection.partition();
            AttemptResult {
                is_correct: expected == actual,
                expected: Answer::Members(expected),
                actual: Answer::Members(actual),
            }
        }
        CheckMode::CountPerPart => {
            let expected = truth.expected_counts();
            let actual = selection.counts().clone();
            AttemptResult {
                is_correct: expected == actual,
                expected: Answer::Counts(expected),
                actual: Answer::Counts(actual),
            }
        }
    }
}
