//! Core functionalities.
mod agent;
mod batch;
mod env;
mod policy;
mod replay_buffer;
mod step;
pub use agent::Agent;
pub use batch::TransitionBatch;
pub use env::Env;
pub use policy::{Configurable, Policy};
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
use std::fmt::Debug;
pub use step::{Info, Step};

/// An observation of an environment.
///
/// Observations are fixed-length feature vectors. The length is the
/// observation dimension reported by [`Env::obs_dim`].
pub trait Obs: Clone + Debug {
    /// Returns the features of the observation.
    fn as_slice(&self) -> &[f32];

    /// Returns the number of features.
    fn len(&self) -> usize {
        self.as_slice().len()
    }
}

/// A discrete action of an environment.
///
/// Actions are identified by an index in `0..n_actions`.
pub trait Act: Clone + Debug {
    /// Constructs the action with the given index.
    fn from_index(ix: usize) -> Self;

    /// Returns the index of the action.
    fn index(&self) -> usize;
}
