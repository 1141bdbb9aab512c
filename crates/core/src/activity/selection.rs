//! Learner selection state for one round.

use super::content::RoundContent;
use super::item::{BucketKey, ItemId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// What the learner has done so far: items picked (include/exclude sorting),
/// items placed into buckets (grouping), and numeric guesses per bucket.
///
/// An item id is in at most one bucket at any time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    included: Vec<ItemId>,
    buckets: BTreeMap<BucketKey, Vec<ItemId>>,
    counts: BTreeMap<BucketKey, usize>,
}

impl Selection {
    /// Picked items, in the order they were picked.
    pub fn included(&self) -> &[ItemId] {
        &self.included
    }

    pub fn bucket(&self, key: &BucketKey) -> &[ItemId] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn bucket_of(&self, id: ItemId) -> Option<&BucketKey> {
        self.buckets
            .iter()
            .find(|(_, ids)| ids.contains(&id))
            .map(|(key, _)| key)
    }

    pub fn placed_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn count(&self, key: &BucketKey) -> Option<usize> {
        self.counts.get(key).copied()
    }

    pub fn counts(&self) -> &BTreeMap<BucketKey, usize> {
        &self.counts
    }

    /// Non-empty buckets as sets, for order-independent comparison.
    pub fn partition(&self) -> BTreeMap<BucketKey, BTreeSet<ItemId>> {
        self.buckets
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(key, ids)| (key.clone(), ids.iter().copied().collect()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.included.is_empty() && self.placed_count() == 0 && self.counts.is_empty()
    }
}

/// Applies learner actions to a [`Selection`], rejecting ids and bucket keys
/// that are not part of the round. Rejections are no-ops reported as `false`.
#[derive(Debug, Clone)]
pub struct SelectionTracker {
    known_items: BTreeSet<ItemId>,
    known_buckets: BTreeSet<BucketKey>,
    selection: Selection,
}

impl SelectionTracker {
    pub fn new(
        items: impl IntoIterator<Item = ItemId>,
        buckets: impl IntoIterator<Item = BucketKey>,
    ) -> Self {
        Self {
            known_items: items.into_iter().collect(),
            known_buckets: buckets.into_iter().collect(),
            selection: Selection::default(),
        }
    }

    pub fn for_round(content: &RoundContent) -> Self {
        Self::new(
            content.items.iter().map(|item| item.id),
            content.buckets.iter().cloned(),
        )
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn select(&mut self, id: ItemId) -> bool {
        if !self.knows_item(id) || self.selection.included.contains(&id) {
            return false;
        }
        self.selection.included.push(id);
        true
    }

    pub fn deselect(&mut self, id: ItemId) -> bool {
        let before = self.selection.included.len();
        self.selection.included.retain(|selected| *selected != id);
        before != self.selection.included.len()
    }

    /// Click behavior of the sorting screens: select if unselected, else
    /// deselect.
    pub fn toggle(&mut self, id: ItemId) -> bool {
        if self.selection.included.contains(&id) {
            self.deselect(id)
        } else {
            self.select(id)
        }
    }

    /// Moves `id` into `key`, removing any earlier placement first.
    pub fn place_in_bucket(&mut self, id: ItemId, key: &BucketKey) -> bool {
        if !self.knows_item(id) || !self.knows_bucket(key) {
            return false;
        }
        if self.selection.bucket_of(id) == Some(key) {
            return true;
        }
        self.remove_placement(id);
        self.selection
            .buckets
            .entry(key.clone())
            .or_default()
            .push(id);
        true
    }

    pub fn remove_from_bucket(&mut self, id: ItemId) -> bool {
        self.remove_placement(id)
    }

    pub fn set_count(&mut self, key: &BucketKey, count: usize) -> bool {
        if !self.knows_bucket(key) {
            return false;
        }
        self.selection.counts.insert(key.clone(), count);
        true
    }

    pub fn clear(&mut self) {
        self.selection = Selection::default();
    }

    fn remove_placement(&mut self, id: ItemId) -> bool {
        let mut removed = false;
        for ids in self.selection.buckets.values_mut() {
            let before = ids.len();
            ids.retain(|placed| *placed != id);
            removed |= before != ids.len();
        }
        removed
    }

    fn knows_item(&self, id: ItemId) -> bool {
        let known = self.known_items.contains(&id);
        if !known {
            debug!(item = %id, "Ignoring action on unknown item");
        }
        known
    }

    fn knows_bucket(&self, key: &BucketKey) -> bool {
        let known = self.known_buckets.contains(key);
        if !known {
            debug!(bucket = %key, "Ignoring action on unknown bucket");
        }
        known
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> SelectionTracker {
        SelectionTracker::new(
            (1..=5).map(ItemId),
            [BucketKey::new("fly"), BucketKey::new("swim")],
        )
    }

    #[test]
    fn test_move_leaves_item_in_one_bucket() {
        let mut tracker = tracker();
        let fly = BucketKey::new("fly");
        let swim = BucketKey::new("swim");

        let moves = [&fly, &swim, &swim, &fly, &swim];
        for key in moves {
            assert!(tracker.place_in_bucket(ItemId(3), key));
            let holding: Vec<_> = [&fly, &swim]
                .into_iter()
                .filter(|bucket| tracker.selection().bucket(bucket).contains(&ItemId(3)))
                .collect();
            assert_eq!(holding, vec![key]);
        }
        assert_eq!(tracker.selection().placed_count(), 1);
    }

    #[test]
    fn test_unknown_ids_and_buckets_are_ignored() {
        let mut tracker = tracker();

        assert!(!tracker.select(ItemId(99)));
        assert!(!tracker.place_in_bucket(ItemId(99), &BucketKey::new("fly")));
        assert!(!tracker.place_in_bucket(ItemId(1), &BucketKey::new("crawl")));
        assert!(!tracker.set_count(&BucketKey::new("crawl"), 2));
        assert!(tracker.selection().is_empty());
    }

    #[test]
    fn test_select_is_idempotent_and_ordered() {
        let mut tracker = tracker();
        assert!(tracker.select(ItemId(4)));
        assert!(tracker.select(ItemId(2)));
        assert!(!tracker.select(ItemId(4)));

        assert_eq!(tracker.selection().included(), &[ItemId(4), ItemId(2)]);
        assert!(tracker.toggle(ItemId(4)));
        assert_eq!(tracker.selection().included(), &[ItemId(2)]);
        assert!(!tracker.deselect(ItemId(5)));
    }

    #[test]
    fn test_clear_discards_everything() {
        let mut tracker = tracker();
        tracker.select(ItemId(1));
        tracker.place_in_bucket(ItemId(2), &BucketKey::new("swim"));
        tracker.set_count(&BucketKey::new("fly"), 3);

        tracker.clear();
        assert!(tracker.selection().is_empty());
    }

    #[test]
    fn test_partition_skips_emptied_buckets() {
        let mut tracker = tracker();
        tracker.place_in_bucket(ItemId(1), &BucketKey::new("fly"));
        tracker.place_in_bucket(ItemId(1), &BucketKey::new("swim"));

        let partition = tracker.selection().partition();
        assert_eq!(partition.len(), 1);
        assert_eq!(
            partition[&BucketKey::new("swim")],
            BTreeSet::from([ItemId(1)])
        );
    }
}
