//! A generic implementation of [`TransitionBatch`](crate::TransitionBatch).
use crate::TransitionBatch;

/// A batch of transitions stored column-wise.
pub struct StdBatch<O, A> {
    /// Observations.
    pub obs: Vec<O>,

    /// Actions.
    pub act: Vec<A>,

    /// Next observations.
    pub next_obs: Vec<O>,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Done flags, `1` for terminal next observations.
    pub is_done: Vec<i8>,

    /// Indices of the sampled transitions in the buffer.
    pub ix_sample: Option<Vec<usize>>,
}

impl<O, A> StdBatch<O, A> {
    /// Creates an empty batch with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            obs: Vec::with_capacity(capacity),
            act: Vec::with_capacity(capacity),
            next_obs: Vec::with_capacity(capacity),
            reward: Vec::with_capacity(capacity),
            is_done: Vec::with_capacity(capacity),
            ix_sample: None,
        }
    }
}

impl<O, A> TransitionBatch for StdBatch<O, A> {
    type ObsBatch = Vec<O>;
    type ActBatch = Vec<A>;

    fn unpack(self) -> (Self::ObsBatch, Self::ActBatch, Self::ObsBatch, Vec<f32>, Vec<i8>) {
        (self.obs, self.act, self.next_obs, self.reward, self.is_done)
    }

    fn len(&self) -> usize {
        self.reward.len()
    }

    fn obs(&self) -> &Self::ObsBatch {
        &self.obs
    }

    fn act(&self) -> &Self::ActBatch {
        &self.act
    }
}
