//! Round Content Generation
//!
//! Produces the item set and ground truth for one activity round. All
//! randomness flows through an explicit `Rng`, so a seeded provider yields
//! the same sequence of rounds every time.

use super::item::{
    Attributes, BucketKey, GroupDefinition, ItemId, ItemSpec, ManipulableItem, Predicate,
};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

pub const PART_ONE: &str = "part1";
pub const PART_TWO: &str = "part2";
pub const TOTAL: &str = "total";

/// How a learner's answer is compared against the ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CheckMode {
    /// The selected set must equal the "belongs" set exactly.
    SetEquality,
    /// Every item placed, and each bucket's contents equal the expected set.
    PartitionEquality,
    /// The guessed count for every bucket equals the expected bucket size.
    /// Bucket keys are positional here ("part1" is the left piece).
    CountPerPart,
}

/// The correct partition a round is checked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroundTruth {
    pub mode: CheckMode,
    pub groups: BTreeMap<BucketKey, BTreeSet<ItemId>>,
}

impl GroundTruth {
    pub fn item_count(&self) -> usize {
        self.groups.values().map(BTreeSet::len).sum()
    }

    pub fn expected_counts(&self) -> BTreeMap<BucketKey, usize> {
        self.groups
            .iter()
            .map(|(key, ids)| (key.clone(), ids.len()))
            .collect()
    }
}

/// What kind of activity to generate a round for, with its authored items.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityKind {
    /// Pick every item matching the predicate (binary include/exclude).
    Sorting {
        items: Vec<ItemSpec>,
        predicate: Predicate,
    },
    /// Place every item into the bucket named by its attribute.
    Grouping {
        items: Vec<ItemSpec>,
        definition: GroupDefinition,
    },
    /// Say how many items fall on each side of a split ("big vs small").
    Partners {
        items: Vec<ItemSpec>,
        definition: GroupDefinition,
    },
    /// Break a cube tower in two and guess the size of each part.
    TowerBreak,
    /// Count a random number of cubes.
    Counting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyParams {
    pub tower_height: usize,
    pub max_count: usize,
    pub shuffle: bool,
}

impl Default for DifficultyParams {
    fn default() -> Self {
        Self {
            tower_height: 4,
            max_count: 3,
            shuffle: true,
        }
    }
}

/// Everything one round needs: items in display order, the buckets a learner
/// may use (in display order), and the ground truth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundContent {
    pub items: Vec<ManipulableItem>,
    pub buckets: Vec<BucketKey>,
    pub ground_truth: GroundTruth,
}

/// Seedable source of round content.
pub struct ContentProvider {
    rng: StdRng,
}

impl ContentProvider {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_os_rng() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn generate(&mut self, kind: &ActivityKind, params: &DifficultyParams) -> RoundContent {
        generate(kind, params, &mut self.rng)
    }
}

/// Builds a round for `kind`. Deterministic for a given `rng` state.
pub fn generate<R: Rng>(
    kind: &ActivityKind,
    params: &DifficultyParams,
    rng: &mut R,
) -> RoundContent {
    let content = match kind {
        ActivityKind::Sorting { items, predicate } => {
            let mut items = assign_ids(items);
            let belongs: BTreeSet<ItemId> = items
                .iter()
                .filter(|item| predicate.matches(item))
                .map(|item| item.id)
                .collect();
            if belongs.is_empty() {
                warn!(
                    value = %predicate.value,
                    "No item matches the sorting predicate; an empty selection is the answer"
                );
            }
            if params.shuffle {
                items.shuffle(rng);
            }
            RoundContent {
                items,
                buckets: vec![BucketKey::included()],
                ground_truth: GroundTruth {
                    mode: CheckMode::SetEquality,
                    groups: BTreeMap::from([(BucketKey::included(), belongs)]),
                },
            }
        }
        ActivityKind::Grouping { items, definition } => {
            let mut content =
                classify(assign_ids(items), definition, CheckMode::PartitionEquality);
            if params.shuffle {
                content.items.shuffle(rng);
            }
            content
        }
        // Partner counts refer to the authored layout, so order is kept.
        ActivityKind::Partners { items, definition } => {
            classify(assign_ids(items), definition, CheckMode::CountPerPart)
        }
        ActivityKind::TowerBreak => break_tower(params.tower_height, rng),
        ActivityKind::Counting => {
            let count = rng.random_range(1..=params.max_count.max(1));
            let items = cubes(count);
            let ids = items.iter().map(|item| item.id).collect();
            RoundContent {
                items,
                buckets: vec![BucketKey::new(TOTAL)],
                ground_truth: GroundTruth {
                    mode: CheckMode::CountPerPart,
                    groups: BTreeMap::from([(BucketKey::new(TOTAL), ids)]),
                },
            }
        }
    };
    debug!(
        items = content.items.len(),
        buckets = content.buckets.len(),
        mode = ?content.ground_truth.mode,
        "Generated round content"
    );
    content
}

fn assign_ids(specs: &[ItemSpec]) -> Vec<ManipulableItem> {
    specs
        .iter()
        .zip(1..)
        .map(|(spec, id)| ManipulableItem {
            id: ItemId(id),
            tag: spec.tag.clone(),
            attributes: spec.attributes.clone(),
        })
        .collect()
}

/// Buckets are listed in order of first appearance. Items the definition
/// cannot classify are left out of the round.
fn classify(
    items: Vec<ManipulableItem>,
    definition: &GroupDefinition,
    mode: CheckMode,
) -> RoundContent {
    let mut buckets: Vec<BucketKey> = Vec::new();
    let mut groups: BTreeMap<BucketKey, BTreeSet<ItemId>> = BTreeMap::new();
    let mut kept = Vec::with_capacity(items.len());

    for item in items {
        let Some(bucket) = definition.classify(&item) else {
            warn!(
                item = %item.id,
                group = %definition.name,
                "Item has no value for the grouping criterion; dropping it"
            );
            continue;
        };
        if !buckets.contains(&bucket) {
            buckets.push(bucket.clone());
        }
        groups.entry(bucket).or_default().insert(item.id);
        kept.push(item);
    }

    RoundContent {
        items: kept,
        buckets,
        ground_truth: GroundTruth { mode, groups },
    }
}

fn cubes(count: usize) -> Vec<ManipulableItem> {
    (0..count)
        .zip(1..)
        .map(|(position, id)| ManipulableItem {
            id: ItemId(id),
            tag: format!("cube-{}", position + 1),
            attributes: Attributes::Cube { position },
        })
        .collect()
}

/// The split point is drawn from the open interval (0, height), so both
/// parts are always non-empty. Heights below two are raised to two.
fn break_tower<R: Rng>(height: usize, rng: &mut R) -> RoundContent {
    let height = height.max(2);
    let items = cubes(height);
    let split = rng.random_range(1..height);

    let (left, right) = items.split_at(split);
    let part_one = left.iter().map(|item| item.id).collect();
    let part_two = right.iter().map(|item| item.id).collect();

    RoundContent {
        buckets: vec![BucketKey::new(PART_ONE), BucketKey::new(PART_TWO)],
        ground_truth: GroundTruth {
            mode: CheckMode::CountPerPart,
            groups: BTreeMap::from([
                (BucketKey::new(PART_ONE), part_one),
                (BucketKey::new(PART_TWO), part_two),
            ]),
        },
        items,
    }
}
