//! Configuration of a training run.
use anyhow::Result;
use qlearn_candle_agent::{
    dqn::{DqnConfig, DqnModelConfig},
    mlp::MlpConfig,
    opt::OptimizerConfig,
    util::CriticLoss,
    Device,
};
use qlearn_cartpole_env::CartPoleConfig;
use qlearn_core::{replay_buffer::SimpleReplayBufferConfig, EpsilonGreedy, TrainerConfig};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

pub const DIM_OBS: usize = 4;
pub const DIM_ACT: usize = 2;
pub const HIDDEN_UNITS: [usize; 2] = [64, 64];
pub const GAMMA: f64 = 0.99;
pub const BATCH_SIZE: usize = 32;
pub const BUFFER_SIZE: usize = 50_000;
pub const MIN_REPLAY_SIZE: usize = 1000;
pub const EPSILON_START: f64 = 1.0;
pub const EPSILON_END: f64 = 0.02;
pub const EPSILON_DECAY: usize = 10_000;
pub const TARGET_UPDATE_FREQ: usize = 1000;
pub const LOG_INTERVAL: usize = 1000;
pub const REWARD_HISTORY_LEN: usize = 100;
pub const LEARNING_RATE: f64 = 5e-4;
pub const TARGET_REWARD: f32 = 195.0;
pub const REWARD_CLIP: f32 = 1.0;
pub const MAX_EPISODE_STEPS: usize = 500;

/// Everything needed to reproduce a run.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct RunConfig {
    pub env_config: CartPoleConfig,
    pub agent_config: DqnConfig<MlpConfig>,
    pub trainer_config: TrainerConfig,
    pub replay_buffer_config: SimpleReplayBufferConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            env_config: create_env_config(),
            agent_config: create_agent_config(DIM_OBS, DIM_ACT),
            trainer_config: create_trainer_config(),
            replay_buffer_config: SimpleReplayBufferConfig::default().capacity(BUFFER_SIZE),
        }
    }
}

impl RunConfig {
    /// Sets the seed of every random source in the run.
    pub fn seed(mut self, seed: u64) -> Self {
        self.trainer_config = self.trainer_config.seed(seed);
        self.replay_buffer_config = self.replay_buffer_config.seed(seed);
        self
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

pub fn create_env_config() -> CartPoleConfig {
    CartPoleConfig::default().max_steps(MAX_EPISODE_STEPS)
}

pub fn create_agent_config(in_dim: usize, out_dim: usize) -> DqnConfig<MlpConfig> {
    let opt_config = OptimizerConfig::Adam { lr: LEARNING_RATE };
    let mlp_config = MlpConfig::new(in_dim, HIDDEN_UNITS.to_vec(), out_dim);
    let model_config = DqnModelConfig::default()
        .q_config(mlp_config)
        .opt_config(opt_config);
    DqnConfig::default()
        .model_config(model_config)
        .batch_size(BATCH_SIZE)
        .discount_factor(GAMMA)
        .critic_loss(CriticLoss::SmoothL1)
        .device(Device::Cpu)
}

pub fn create_trainer_config() -> TrainerConfig {
    let explorer = EpsilonGreedy::with_final_step(EPSILON_DECAY)
        .eps_start(EPSILON_START)
        .eps_final(EPSILON_END);
    TrainerConfig::default()
        .min_replay_size(MIN_REPLAY_SIZE)
        .target_update_interval(TARGET_UPDATE_FREQ)
        .log_interval(LOG_INTERVAL)
        .reward_history_len(REWARD_HISTORY_LEN)
        .explorer(explorer)
        .clip_reward(REWARD_CLIP)
        .target_reward(TARGET_REWARD)
}
