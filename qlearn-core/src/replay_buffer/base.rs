//! Simple generic replay buffer.
use super::{SimpleReplayBufferConfig, StdBatch};
use crate::{error::QlearnError, ExperienceBufferBase, ReplayBufferBase};
use anyhow::Result;
use rand::{rngs::StdRng, seq::index, SeedableRng};

/// A transition `(o_t, a_t, r_t, done_t, o_t+1)`.
///
/// `next_obs` is the successor of `obs` under `act`. `done` is `true` iff
/// `next_obs` is a terminal state.
#[derive(Clone, Debug)]
pub struct Transition<O, A> {
    /// Observation.
    pub obs: O,

    /// Action taken at `obs`.
    pub act: A,

    /// Reward, possibly clipped.
    pub reward: f32,

    /// Terminal flag of `next_obs`.
    pub done: bool,

    /// Next observation.
    pub next_obs: O,
}

/// A fixed-capacity ring buffer of transitions.
///
/// When full, pushing a transition evicts the oldest one. Batches are sampled
/// uniformly without replacement.
pub struct SimpleReplayBuffer<O, A> {
    capacity: usize,
    i: usize,
    buf: Vec<Transition<O, A>>,
    rng: StdRng,
}

impl<O, A> SimpleReplayBuffer<O, A> {
    /// The maximum number of transitions held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates over the stored transitions from the oldest to the newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition<O, A>> {
        let (newer, older) = if self.buf.len() < self.capacity {
            (&self.buf[..], &self.buf[..0])
        } else {
            self.buf.split_at(self.i)
        };
        older.iter().chain(newer.iter())
    }
}

impl<O, A> ExperienceBufferBase for SimpleReplayBuffer<O, A> {
    type Item = Transition<O, A>;

    fn len(&self) -> usize {
        self.buf.len()
    }

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        if self.buf.len() < self.capacity {
            self.buf.push(tr);
        } else {
            self.buf[self.i] = tr;
        }
        self.i = (self.i + 1) % self.capacity;
        Ok(())
    }
}

impl<O, A> ReplayBufferBase for SimpleReplayBuffer<O, A>
where
    O: Clone,
    A: Clone,
{
    type Config = SimpleReplayBufferConfig;
    type Batch = StdBatch<O, A>;

    fn build(config: &Self::Config) -> Result<Self> {
        if config.capacity == 0 {
            return Err(QlearnError::InvalidConfig(
                "replay buffer capacity must be positive".to_string(),
            )
            .into());
        }

        Ok(Self {
            capacity: config.capacity,
            i: 0,
            buf: Vec::with_capacity(config.capacity),
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        let available = self.buf.len();
        if size > available {
            return Err(QlearnError::InsufficientSamples {
                requested: size,
                available,
            }
            .into());
        }

        let ixs = index::sample(&mut self.rng, available, size).into_vec();
        let mut batch = StdBatch::with_capacity(size);
        for &ix in ixs.iter() {
            let tr = &self.buf[ix];
            batch.obs.push(tr.obs.clone());
            batch.act.push(tr.act.clone());
            batch.next_obs.push(tr.next_obs.clone());
            batch.reward.push(tr.reward);
            batch.is_done.push(tr.done as i8);
        }
        batch.ix_sample = Some(ixs);

        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransitionBatch;
    use std::collections::HashSet;

    // Transitions are tagged with their insertion number in `act`.
    fn tagged(seq: usize) -> Transition<f32, usize> {
        Transition {
            obs: seq as f32,
            act: seq,
            reward: 0.0,
            done: false,
            next_obs: seq as f32 + 1.0,
        }
    }

    fn buffer(capacity: usize) -> SimpleReplayBuffer<f32, usize> {
        let config = SimpleReplayBufferConfig::default().capacity(capacity);
        SimpleReplayBuffer::build(&config).unwrap()
    }

    #[test]
    fn test_len_never_exceeds_capacity() -> Result<()> {
        let mut buf = buffer(5);
        assert!(buf.is_empty());

        for seq in 0..23 {
            buf.push(tagged(seq))?;
            assert_eq!(buf.len(), (seq + 1).min(5));
        }
        Ok(())
    }

    #[test]
    fn test_fifo_eviction() -> Result<()> {
        let mut buf = buffer(4);
        for seq in 0..3 {
            buf.push(tagged(seq))?;
        }
        assert_eq!(buf.iter().map(|t| t.act).collect::<Vec<_>>(), vec![0, 1, 2]);

        for seq in 3..10 {
            buf.push(tagged(seq))?;
        }
        assert_eq!(
            buf.iter().map(|t| t.act).collect::<Vec<_>>(),
            vec![6, 7, 8, 9]
        );
        Ok(())
    }

    #[test]
    fn test_sample_distinct_members() -> Result<()> {
        let mut buf = buffer(50);
        for seq in 0..80 {
            buf.push(tagged(seq))?;
        }
        let members = buf.iter().map(|t| t.act).collect::<HashSet<_>>();

        for _ in 0..20 {
            let batch = buf.batch(32)?;
            assert_eq!(batch.len(), 32);
            let acts = batch.act.iter().copied().collect::<HashSet<_>>();
            assert_eq!(acts.len(), 32);
            assert!(acts.is_subset(&members));
        }
        Ok(())
    }

    #[test]
    fn test_sample_whole_buffer() -> Result<()> {
        let mut buf = buffer(10);
        for seq in 0..10 {
            buf.push(tagged(seq))?;
        }
        let batch = buf.batch(10)?;
        let mut acts = batch.act.clone();
        acts.sort();
        assert_eq!(acts, (0..10).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn test_batch_keeps_columns_aligned() -> Result<()> {
        let mut buf = buffer(16);
        for seq in 0..16 {
            let mut tr = tagged(seq);
            tr.reward = seq as f32 * 0.5;
            tr.done = seq % 3 == 0;
            buf.push(tr)?;
        }
        let (obs, act, next_obs, reward, is_done) = buf.batch(8)?.unpack();
        for j in 0..8 {
            let seq = act[j];
            assert_eq!(obs[j], seq as f32);
            assert_eq!(next_obs[j], seq as f32 + 1.0);
            assert_eq!(reward[j], seq as f32 * 0.5);
            assert_eq!(is_done[j], (seq % 3 == 0) as i8);
        }
        Ok(())
    }

    #[test]
    fn test_sample_too_many() {
        let mut buf = buffer(10);
        buf.push(tagged(0)).unwrap();
        let err = buf.batch(5).err().unwrap();
        assert_eq!(
            err.downcast_ref::<QlearnError>(),
            Some(&QlearnError::InsufficientSamples {
                requested: 5,
                available: 1
            })
        );
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let config = SimpleReplayBufferConfig::default().capacity(0);
        assert!(SimpleReplayBuffer::<f32, usize>::build(&config).is_err());
    }
}
