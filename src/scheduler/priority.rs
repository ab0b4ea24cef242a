use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Priority {
    High = 0,
    #[default]
    Normal = 1,
    Background = 2,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Normal, Priority::Background];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Background => "background",
        };
        f.pad(name)
    }
}

/// Order in which the per-level queues are inspected on every pop.
///
/// The default drains `High`, then `Normal`, then `Background`.
/// [`DrainOrder::LEGACY`] reproduces the older `High`, `Background`, `Normal`
/// grouping for hosts that depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainOrder([Priority; 3]);

impl DrainOrder {
    pub const STANDARD: DrainOrder =
        DrainOrder([Priority::High, Priority::Normal, Priority::Background]);

    pub const LEGACY: DrainOrder =
        DrainOrder([Priority::High, Priority::Background, Priority::Normal]);

    /// Every level must appear exactly once.
    pub fn new(order: [Priority; 3]) -> Result<Self> {
        for level in Priority::ALL {
            if !order.contains(&level) {
                return Err(Error::config(format!(
                    "drain order must list every priority, missing {}",
                    level
                )));
            }
        }
        Ok(DrainOrder(order))
    }

    pub fn levels(&self) -> [Priority; 3] {
        self.0
    }
}

impl Default for DrainOrder {
    fn default() -> Self {
        DrainOrder::STANDARD
    }
}

/// One FIFO queue per priority level behind a single lock.
pub struct PriorityQueue<T> {
    levels: Mutex<[VecDeque<T>; 3]>,
    order: DrainOrder,
}

impl<T> PriorityQueue<T> {
    pub fn new(order: DrainOrder) -> Self {
        Self {
            levels: Mutex::new([VecDeque::new(), VecDeque::new(), VecDeque::new()]),
            order,
        }
    }

    pub fn push(&self, item: T, priority: Priority) {
        self.levels.lock()[priority.index()].push_back(item);
    }

    /// Front of the first non-empty level in drain order.
    pub fn pop(&self) -> Option<T> {
        let mut levels = self.levels.lock();
        self.order
            .levels()
            .iter()
            .find_map(|level| levels[level.index()].pop_front())
    }

    pub fn peek(&self) -> Option<Priority> {
        let levels = self.levels.lock();
        self.order
            .levels()
            .into_iter()
            .find(|level| !levels[level.index()].is_empty())
    }

    pub fn len(&self) -> usize {
        self.levels.lock().iter().map(VecDeque::len).sum()
    }

    pub fn len_of(&self, priority: Priority) -> usize {
        self.levels.lock()[priority.index()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn order(&self) -> DrainOrder {
        self.order
    }
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new(DrainOrder::default())
    }
}

impl<T> fmt::Debug for PriorityQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let levels = self.levels.lock();
        f.debug_struct("PriorityQueue")
            .field("order", &self.order)
            .field("high", &levels[Priority::High.index()].len())
            .field("normal", &levels[Priority::Normal.index()].len())
            .field("background", &levels[Priority::Background.index()].len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::High < Priority::Normal);
        assert!(Priority::Normal < Priority::Background);
        assert_eq!(Priority::default(), Priority::Normal);
    }

    #[test]
    fn test_priority_queue() {
        let queue = PriorityQueue::default();

        queue.push("b", Priority::Normal);
        queue.push("a", Priority::High);
        queue.push("c", Priority::High);

        assert_eq!(queue.peek(), Some(Priority::High));
        assert_eq!(queue.pop(), Some("a"));
        assert_eq!(queue.pop(), Some("c"));
        assert_eq!(queue.peek(), Some(Priority::Normal));
        assert_eq!(queue.pop(), Some("b"));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_fifo_within_level() {
        let queue = PriorityQueue::default();
        for i in 0..5 {
            queue.push(i, Priority::Background);
        }
        let drained: Vec<_> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(drained, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_late_high_priority_preempts() {
        let queue = PriorityQueue::default();
        queue.push(1, Priority::Normal);
        queue.push(2, Priority::Normal);

        assert_eq!(queue.pop(), Some(1));
        queue.push(99, Priority::High);
        assert_eq!(queue.pop(), Some(99));
        assert_eq!(queue.pop(), Some(2));
    }

    #[test]
    fn test_legacy_drain_order() {
        let queue = PriorityQueue::new(DrainOrder::LEGACY);
        queue.push("normal", Priority::Normal);
        queue.push("background", Priority::Background);
        queue.push("high", Priority::High);

        assert_eq!(queue.pop(), Some("high"));
        assert_eq!(queue.pop(), Some("background"));
        assert_eq!(queue.pop(), Some("normal"));
    }

    #[test]
    fn test_drain_order_validation() {
        assert!(DrainOrder::new([Priority::Background, Priority::Normal, Priority::High]).is_ok());
        assert!(DrainOrder::new([Priority::High, Priority::High, Priority::Normal]).is_err());
    }

    #[test]
    fn test_lengths() {
        let queue = PriorityQueue::default();
        assert!(queue.is_empty());
        queue.push((), Priority::High);
        queue.push((), Priority::Background);
        queue.push((), Priority::Background);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.len_of(Priority::Background), 2);
    }
}
