//! Environment step.
use super::Env;

/// Additional information to `Obs` and `Act`.
pub trait Info {}

impl Info for () {}

/// Represents an action, observation and reward tuple `(a_t, o_t+1, r_t)`
/// with some additional information.
///
/// An environment emits [`Step`] object at every interaction steps.
/// This object is used to create transitions `(o_t, a_t, r_t, done_t, o_t+1)`.
pub struct Step<E: Env> {
    /// Action.
    pub act: E::Act,

    /// Observation after the action.
    pub obs: E::Obs,

    /// Reward.
    pub reward: f32,

    /// Flag denoting if `obs` is a terminal state.
    pub is_terminated: bool,

    /// Flag denoting if the episode was cut off, e.g. by a time limit.
    pub is_truncated: bool,

    /// Information defined by user.
    pub info: E::Info,
}

impl<E: Env> Step<E> {
    /// Constructs a [`Step`] object.
    pub fn new(
        obs: E::Obs,
        act: E::Act,
        reward: f32,
        is_terminated: bool,
        is_truncated: bool,
        info: E::Info,
    ) -> Self {
        Step {
            act,
            obs,
            reward,
            is_terminated,
            is_truncated,
            info,
        }
    }

    #[inline]
    /// Terminated or truncated.
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}
