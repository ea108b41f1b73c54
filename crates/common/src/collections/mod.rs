//! Specialized data structures
//!
//! - **[`priority_deque`]**: priority-ordered deque that stays FIFO among
//!   equal priorities

pub mod priority_deque;

pub use priority_deque::PriorityDeque;
