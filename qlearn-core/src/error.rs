//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum QlearnError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// The replay buffer holds fewer transitions than requested.
    #[error("Cannot sample {requested} transitions from a buffer of {available}")]
    InsufficientSamples {
        /// Requested batch size.
        requested: usize,
        /// Number of transitions in the buffer.
        available: usize,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The loss became NaN or infinite.
    #[error("Non-finite loss {loss} at optimization step {n_opts}")]
    NonFiniteLoss {
        /// The offending loss value.
        loss: f32,
        /// Number of optimization steps done before this one.
        n_opts: usize,
    },

    /// Observation length differs from the expected dimension.
    #[error("Observation has {actual} elements, expected {expected}")]
    ObsDimMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Action index out of the action space.
    #[error("Action {action} is out of range for {n_actions} actions")]
    InvalidAction {
        /// Given action index.
        action: usize,
        /// Size of the action space.
        n_actions: usize,
    },

    /// Environment was stepped after its episode ended without a reset.
    #[error("Environment stepped after the episode ended; call reset() first")]
    EpisodeFinished,
}
