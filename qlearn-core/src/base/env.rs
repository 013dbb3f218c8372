//! Environment.
use super::{Act, Info, Obs, Step};
use anyhow::Result;

/// Represents an environment, typically an MDP.
///
/// Only non-vectorized environments with a discrete action space are
/// supported.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Information in the [`Step`] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Starts a new episode and returns its initial observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Performs an environment step.
    ///
    /// The returned [`Step`] holds the successor observation of the state in
    /// which `a` was taken. Errors are fatal for the caller.
    fn step(&mut self, a: &Self::Act) -> Result<Step<Self>>
    where
        Self: Sized;

    /// Samples an action uniformly from the action space.
    fn sample_action(&mut self) -> Self::Act;

    /// Dimension of observations.
    fn obs_dim(&self) -> usize;

    /// The number of discrete actions.
    fn n_actions(&self) -> usize;

    /// Renders the current state.
    fn render(&mut self) -> Result<()> {
        Ok(())
    }
}
