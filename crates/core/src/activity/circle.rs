//! Counting around a circle (duck-duck-goose, merry-go-round, table setting).
//!
//! The learner marks where they start, then counts one item at a time until
//! they are back where they started. Counting without a marked start is
//! allowed but lands in [`CircleState::LostCount`] once it runs past the ring.

use super::item::ManipulableItem;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircleState {
    /// No start marked. `counted` counts taps made anyway.
    Unmarked { counted: usize },
    Marked { start: usize },
    Counting { start: usize, count: usize },
    Complete { start: usize },
    /// Counted past the ring size without marking a start.
    LostCount { counted: usize },
}

#[derive(Debug, Clone)]
pub struct CircleCounter {
    items: Vec<ManipulableItem>,
    state: CircleState,
}

impl CircleCounter {
    /// Returns `None` for an empty ring.
    pub fn new(items: Vec<ManipulableItem>) -> Option<Self> {
        if items.is_empty() {
            return None;
        }
        Some(Self {
            items,
            state: CircleState::Unmarked { counted: 0 },
        })
    }

    pub fn state(&self) -> CircleState {
        self.state
    }

    pub fn ring_size(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[ManipulableItem] {
        &self.items
    }

    /// Marks `index` as the starting point and restarts the count. Ignored
    /// for out-of-range indexes and once the circle is complete.
    pub fn mark(&mut self, index: usize) -> bool {
        if index >= self.ring_size() || matches!(self.state, CircleState::Complete { .. }) {
            debug!(index, state = ?self.state, "Ignoring circle mark");
            return false;
        }
        self.state = CircleState::Marked { start: index };
        true
    }

    /// Counts the next item around the ring.
    pub fn count_next(&mut self) -> CircleState {
        let ring = self.ring_size();
        self.state = match self.state {
            CircleState::Unmarked { counted } if counted + 1 > ring => {
                CircleState::LostCount { counted: counted + 1 }
            }
            CircleState::Unmarked { counted } => CircleState::Unmarked { counted: counted + 1 },
            CircleState::LostCount { counted } => CircleState::LostCount { counted: counted + 1 },
            CircleState::Marked { start } if ring == 1 => CircleState::Complete { start },
            CircleState::Marked { start } => CircleState::Counting { start, count: 1 },
            CircleState::Counting { start, count } if count + 1 >= ring => {
                CircleState::Complete { start }
            }
            CircleState::Counting { start, count } => CircleState::Counting {
                start,
                count: count + 1,
            },
            complete @ CircleState::Complete { .. } => complete,
        };
        self.state
    }

    /// Ring index of the item the learner is currently on, once a start
    /// has been marked.
    pub fn current_index(&self) -> Option<usize> {
        let ring = self.ring_size();
        match self.state {
            CircleState::Marked { start } | CircleState::Complete { start } => Some(start),
            CircleState::Counting { start, count } => Some((start + count) % ring),
            CircleState::Unmarked { .. } | CircleState::LostCount { .. } => None,
        }
    }

    /// How many items have been counted since the start was marked. A
    /// complete circle counts every item once.
    pub fn count(&self) -> usize {
        match self.state {
            CircleState::Marked { .. } => 0,
            CircleState::Counting { count, .. } => count,
            CircleState::Complete { .. } => self.ring_size(),
            CircleState::Unmarked { counted } | CircleState::LostCount { counted } => counted,
        }
    }

    pub fn reset(&mut self) {
        self.state = CircleState::Unmarked { counted: 0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::item::{Attributes, ItemId};

    fn ring(size: u32) -> CircleCounter {
        let items = (1..=size)
            .map(|id| ManipulableItem {
                id: ItemId(id),
                tag: "🍽️".to_string(),
                attributes: Attributes::Object {
                    category: "plate".to_string(),
                },
            })
            .collect();
        CircleCounter::new(items).unwrap()
    }

    #[test]
    fn test_empty_ring_is_rejected() {
        assert!(CircleCounter::new(Vec::new()).is_none());
    }

    #[test]
    fn test_marked_count_completes_at_ring_size() {
        let mut circle = ring(5);
        assert!(circle.mark(2));
        for expected in 1..5 {
            assert_eq!(
                circle.count_next(),
                CircleState::Counting {
                    start: 2,
                    count: expected
                }
            );
        }
        assert_eq!(circle.current_index(), Some(1));
        assert_eq!(circle.count_next(), CircleState::Complete { start: 2 });
        assert_eq!(circle.count(), 5);

        assert_eq!(circle.count_next(), CircleState::Complete { start: 2 });
        assert!(!circle.mark(0));
    }

    #[test]
    fn test_counting_without_start_gets_lost() {
        let mut circle = ring(5);
        for _ in 0..5 {
            assert!(matches!(circle.count_next(), CircleState::Unmarked { .. }));
        }
        assert_eq!(circle.count_next(), CircleState::LostCount { counted: 6 });
        assert_eq!(circle.current_index(), None);

        assert!(circle.mark(0));
        assert_eq!(circle.state(), CircleState::Marked { start: 0 });
    }

    #[test]
    fn test_remark_restarts_count() {
        let mut circle = ring(5);
        circle.mark(1);
        circle.count_next();
        circle.count_next();
        assert!(circle.mark(4));
        assert_eq!(circle.count(), 0);
        assert!(!circle.mark(5));

        circle.reset();
        assert_eq!(circle.state(), CircleState::Unmarked { counted: 0 });
    }
}
