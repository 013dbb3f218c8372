//! The classic cart-pole control problem.
//!
//! A pole is attached by an unactuated joint to a cart moving along a
//! frictionless track. The agent pushes the cart to the left or to the right
//! and receives a reward of `1.0` for every step the pole stays upright. An
//! episode terminates when the pole leans more than 12 degrees or the cart
//! leaves the track, and is truncated after `max_steps` steps.
//!
//! ```rust
//! use qlearn_cartpole_env::{CartPoleAct, CartPoleConfig, CartPoleEnv};
//! use qlearn_core::Env;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut env = CartPoleEnv::build(&CartPoleConfig::default(), 42)?;
//! let _obs = env.reset()?;
//! let step = env.step(&CartPoleAct::RIGHT)?;
//! assert_eq!(step.reward, 1.0);
//! # Ok(())
//! # }
//! ```
mod config;
mod env;
pub use config::CartPoleConfig;
pub use env::{CartPoleAct, CartPoleEnv, CartPoleObs};
