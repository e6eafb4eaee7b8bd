use std::collections::VecDeque;

/// Unbounded FIFO queue between exactly one producer and one consumer.
#[derive(Debug, Default, Clone)]
pub struct Channel {
    queue: VecDeque<i64>,
    pushed: u64,
    popped: u64,
}

impl Channel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: i64) {
        self.queue.push_back(value);
        self.pushed += 1;
    }

    pub fn pop(&mut self) -> Option<i64> {
        let value = self.queue.pop_front()?;
        self.popped += 1;

        Some(value)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Total number of values ever pushed.
    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    /// Total number of values ever popped.
    pub fn popped(&self) -> u64 {
        self.popped
    }

    pub fn iter(&self) -> impl Iterator<Item = &i64> {
        self.queue.iter()
    }
}
