//! Stable priority deque.
//!
//! Items are kept sorted by descending priority. Items with equal priority
//! keep their insertion order, which a binary heap cannot guarantee. The
//! front can also be re-occupied explicitly with [`PriorityDeque::push_front`]
//! so a caller can hand an item back without it losing its turn.
//!
//! # Complexity
//! - `insert`: `O(n)`
//! - `push_front` / `pop_front`: `O(1)`
//! - `remove_first`: `O(n)`
//!
//! # Examples
//! ```
//! use adsync_common::collections::PriorityDeque;
//!
//! let mut deque = PriorityDeque::new();
//! deque.insert(0, "low");
//! deque.insert(10, "urgent");
//! deque.insert(0, "low-2");
//!
//! assert_eq!(deque.pop_front(), Some((10, "urgent")));
//! assert_eq!(deque.pop_front(), Some((0, "low")));
//! assert_eq!(deque.pop_front(), Some((0, "low-2")));
//! ```

use std::collections::VecDeque;
use std::fmt;

/// Priority-ordered double-ended queue, FIFO among equal priorities.
pub struct PriorityDeque<T> {
    items: VecDeque<(i32, T)>,
}

impl<T> PriorityDeque<T> {
    /// Creates an empty deque.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: VecDeque::new() }
    }

    /// Inserts `item` before the first entry with a strictly lower priority.
    ///
    /// Returns the index the item landed at.
    pub fn insert(&mut self, priority: i32, item: T) -> usize {
        let index = self
            .items
            .iter()
            .position(|(existing, _)| *existing < priority)
            .unwrap_or(self.items.len());
        self.items.insert(index, (priority, item));
        index
    }

    /// Places `item` at the head regardless of its priority.
    pub fn push_front(&mut self, priority: i32, item: T) {
        self.items.push_front((priority, item));
    }

    /// Removes the head entry.
    pub fn pop_front(&mut self) -> Option<(i32, T)> {
        self.items.pop_front()
    }

    /// Borrows the head entry.
    #[must_use]
    pub fn front(&self) -> Option<(i32, &T)> {
        self.items.front().map(|(priority, item)| (*priority, item))
    }

    /// Removes the first entry matching `predicate`, preserving the order of
    /// the rest.
    pub fn remove_first<F>(&mut self, mut predicate: F) -> Option<(i32, T)>
    where
        F: FnMut(&T) -> bool,
    {
        let index = self.items.iter().position(|(_, item)| predicate(item))?;
        self.items.remove(index)
    }

    /// Drains every entry in queue order.
    pub fn drain(&mut self) -> impl Iterator<Item = (i32, T)> + '_ {
        self.items.drain(..)
    }

    /// Iterates entries in queue order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &T)> {
        self.items.iter().map(|(priority, item)| (*priority, item))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for PriorityDeque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for PriorityDeque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityDeque").field("len", &self.len()).field("items", &self.items).finish()
    }
}
