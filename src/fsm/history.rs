//! Fixed-capacity FIFO of filament humidity samples used by DryFan.

use heapless::Deque;

use crate::config::MAX_DRYFAN_SAMPLES;

/// FIFO ring with a runtime capacity of at most [`MAX_DRYFAN_SAMPLES`].
#[derive(Debug, Clone)]
pub struct History {
    samples: Deque<f32, MAX_DRYFAN_SAMPLES>,
    capacity: usize,
}

impl History {
    /// `capacity` is clamped to `1..=MAX_DRYFAN_SAMPLES`.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Deque::new(),
            capacity: capacity.clamp(1, MAX_DRYFAN_SAMPLES),
        }
    }

    /// Append `sample`.  When the ring was already full, the oldest sample
    /// is evicted and returned.
    pub fn push(&mut self, sample: f32) -> Option<f32> {
        let evicted = if self.samples.len() >= self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        // Cannot fail: len < capacity <= MAX_DRYFAN_SAMPLES here.
        let _ = self.samples.push_back(sample);
        evicted
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
