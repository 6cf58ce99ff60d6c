use std::collections::VecDeque;
use std::sync::Arc;

use crate::foundation::core::FrameIndex;
use crate::render::frame::Frame;

/// Default number of recent frames a generator keeps.
pub const DEFAULT_RING_CAPACITY: usize = 8;

/// Bounded FIFO of recently produced frames.
#[derive(Clone, Debug)]
pub struct FrameRing {
    capacity: usize,
    frames: VecDeque<(FrameIndex, Arc<Frame>)>,
}

impl Default for FrameRing {
    fn default() -> Self {
        Self::new(DEFAULT_RING_CAPACITY)
    }
}

impl FrameRing {
    /// Ring holding at most `capacity` frames (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            frames: VecDeque::with_capacity(capacity),
        }
    }

    /// Maximum number of retained frames.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of retained frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// `true` when nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Retain `frame`, evicting the oldest entry when full.
    pub fn push(&mut self, idx: FrameIndex, frame: Arc<Frame>) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back((idx, frame));
    }

    /// Retained frame for `idx`.
    pub fn get(&self, idx: FrameIndex) -> Option<Arc<Frame>> {
        self.frames
            .iter()
            .rev()
            .find(|(i, _)| *i == idx)
            .map(|(_, f)| f.clone())
    }

    /// Oldest retained index.
    pub fn oldest(&self) -> Option<FrameIndex> {
        self.frames.front().map(|(i, _)| *i)
    }

    /// Newest retained index.
    pub fn newest(&self) -> Option<FrameIndex> {
        self.frames.back().map(|(i, _)| *i)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/ring.rs"]
mod tests;
