//! Configuration of [`Trainer`](super::Trainer).
use crate::EpsilonGreedy;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of random-action steps filling the replay buffer before training.
    pub min_replay_size: usize,

    /// Interval of hard target network updates in training steps.
    pub target_update_interval: usize,

    /// Interval of progress logging in training steps.
    pub log_interval: usize,

    /// The number of latest episode returns averaged for progress logging.
    pub reward_history_len: usize,

    /// Exploration schedule.
    pub explorer: EpsilonGreedy,

    /// Bound of reward clipping, if any.
    pub clip_reward: Option<f32>,

    /// Average reward at which training stops.
    pub target_reward: Option<f32>,

    /// The maximum number of training steps.
    pub max_steps: Option<usize>,

    /// Where to save the trained agent.
    pub model_dir: Option<String>,

    /// Seed of the exploration coin flips.
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            min_replay_size: 1000,
            target_update_interval: 1000,
            log_interval: 1000,
            reward_history_len: 100,
            explorer: EpsilonGreedy::default(),
            clip_reward: None,
            target_reward: None,
            max_steps: None,
            model_dir: None,
            seed: 42,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of warmup steps.
    pub fn min_replay_size(mut self, v: usize) -> Self {
        self.min_replay_size = v;
        self
    }

    /// Sets the interval of target network updates in training steps.
    pub fn target_update_interval(mut self, v: usize) -> Self {
        self.target_update_interval = v;
        self
    }

    /// Sets the interval of progress logging in training steps.
    pub fn log_interval(mut self, v: usize) -> Self {
        self.log_interval = v;
        self
    }

    /// Sets the length of the reward history.
    pub fn reward_history_len(mut self, v: usize) -> Self {
        self.reward_history_len = v;
        self
    }

    /// Sets the exploration schedule.
    pub fn explorer(mut self, v: EpsilonGreedy) -> Self {
        self.explorer = v;
        self
    }

    /// Sets the bound of reward clipping.
    pub fn clip_reward(mut self, v: f32) -> Self {
        self.clip_reward = Some(v);
        self
    }

    /// Sets the average reward at which training stops.
    pub fn target_reward(mut self, v: f32) -> Self {
        self.target_reward = Some(v);
        self
    }

    /// Sets the maximum number of training steps.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = Some(v);
        self
    }

    /// Sets the directory the trained agent is saved in.
    pub fn model_dir(mut self, model_dir: impl Into<String>) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
