//! Exploration schedule and reward shaping.
use serde::{Deserialize, Serialize};

/// Linearly decaying exploration rate of epsilon-greedy action selection.
///
/// The rate starts at `eps_start`, reaches `eps_final` at step `final_step`
/// and stays there afterwards.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Exploration rate at step 0.
    pub eps_start: f64,

    /// Exploration rate from `final_step` on.
    pub eps_final: f64,

    /// The number of steps over which the rate decays.
    pub final_step: usize,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            eps_start: 1.0,
            eps_final: 0.02,
            final_step: 10_000,
        }
    }
}

impl EpsilonGreedy {
    /// Constructs the schedule decaying over `final_step` steps.
    pub fn with_final_step(final_step: usize) -> Self {
        Self {
            final_step,
            ..Self::default()
        }
    }

    /// Set the epsilon value at the final step.
    pub fn eps_final(mut self, v: f64) -> Self {
        self.eps_final = v;
        self
    }

    /// Set the epsilon value at the start.
    pub fn eps_start(mut self, v: f64) -> Self {
        self.eps_start = v;
        self
    }

    /// Returns the exploration rate at the given training step.
    pub fn epsilon(&self, step: usize) -> f64 {
        if step >= self.final_step {
            return self.eps_final;
        }
        let frac = step as f64 / self.final_step as f64;
        self.eps_start + frac * (self.eps_final - self.eps_start)
    }
}

/// Clips `reward` into `[-bound, bound]` when a bound is given.
pub fn clip_reward(reward: f32, bound: Option<f32>) -> f32 {
    match bound {
        Some(b) => reward.clamp(-b, b),
        None => reward,
    }
}
