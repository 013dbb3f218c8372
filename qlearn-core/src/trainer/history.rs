use std::collections::VecDeque;

/// Returns of the latest episodes, oldest first.
///
/// Holds at most `capacity` returns; pushing into a full history drops the
/// oldest one.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardHistory {
    capacity: usize,
    returns: VecDeque<f32>,
}

impl RewardHistory {
    /// Constructs an empty history.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            returns: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends the return of a finished episode.
    pub fn push(&mut self, episode_return: f32) {
        if self.capacity == 0 {
            return;
        }
        if self.returns.len() == self.capacity {
            self.returns.pop_front();
        }
        self.returns.push_back(episode_return);
    }

    /// Mean of the held returns, `0.0` if there is none.
    pub fn mean(&self) -> f32 {
        if self.returns.is_empty() {
            return 0.0;
        }
        self.returns.iter().sum::<f32>() / self.returns.len() as f32
    }

    /// The number of held returns.
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    /// Returns `true` if no episode has finished yet.
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    /// Iterates over the held returns from the oldest.
    pub fn iter(&self) -> impl Iterator<Item = &f32> {
        self.returns.iter()
    }
}
