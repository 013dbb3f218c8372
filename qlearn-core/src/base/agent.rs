//! Agent.
use super::{Env, Policy, ReplayBufferBase};
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy on an environment.
///
/// The agent owns an online action-value function, used by
/// [`Policy::sample`], and a target copy of it, used for bootstrapping.
pub trait Agent<E: Env, R: ReplayBufferBase>: Policy<E> {
    /// Performs an optimization step.
    ///
    /// `buffer` is a replay buffer from which transitions will be taken
    /// for updating model parameters. Returns `None` without touching the
    /// parameters when the buffer does not yet hold a full batch.
    fn opt(&mut self, buffer: &mut R) -> Result<Option<Record>>;

    /// Overwrites the parameters of the target network with those of the
    /// online network.
    fn sync_target(&mut self) -> Result<()>;

    /// Save the parameters of the agent in the given directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
