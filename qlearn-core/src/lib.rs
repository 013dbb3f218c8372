#![warn(missing_docs)]
//! Core components for training Deep Q-Network agents.
//!
//! The crate defines the interfaces between an environment ([`Env`]), a policy
//! ([`Policy`]) and a trainable agent ([`Agent`]), together with the generic
//! machinery of a DQN training run: a replay buffer, an epsilon-greedy schedule,
//! a [`Trainer`] driving the warmup and training phases, and an evaluator
//! running greedy episodes after training.
//!
//! Neural networks are not part of this crate; see `qlearn-candle-agent`.
pub mod dummy;
pub mod error;
pub mod record;
pub mod replay_buffer;

mod base;
pub use base::{
    Act, Agent, Configurable, Env, ExperienceBufferBase, Info, Obs, Policy, ReplayBufferBase,
    Step, TransitionBatch,
};

mod explorer;
pub use explorer::{clip_reward, EpsilonGreedy};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod trainer;
pub use trainer::{Phase, RewardHistory, Sampler, Trainer, TrainerConfig, TrainerState};
