//! Physics of the cart-pole system.
use crate::CartPoleConfig;
use anyhow::Result;
use log::trace;
use qlearn_core::{error::QlearnError, Act, Env, Obs, Step};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{thread, time::Duration};

const GRAVITY: f32 = 9.8;
const MASS_CART: f32 = 1.0;
const MASS_POLE: f32 = 0.1;
const TOTAL_MASS: f32 = MASS_CART + MASS_POLE;
// Half of the pole length
const LENGTH: f32 = 0.5;
const POLE_MASS_LENGTH: f32 = MASS_POLE * LENGTH;
const FORCE_MAG: f32 = 10.0;
const TAU: f32 = 0.02;
const THETA_THRESHOLD: f32 = 12.0 * 2.0 * std::f32::consts::PI / 360.0;
const X_THRESHOLD: f32 = 2.4;
const INIT_RANGE: f32 = 0.05;
const N_ACTIONS: usize = 2;

/// Observation `[x, x_dot, theta, theta_dot]`.
///
/// `x` is the cart position in meters, `theta` the pole angle from vertical in
/// radians, positive clockwise.
#[derive(Clone, Debug, PartialEq)]
pub struct CartPoleObs(pub [f32; 4]);

impl Obs for CartPoleObs {
    fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

/// Action of [`CartPoleEnv`], `0` pushes the cart to the left and `1` to the right.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CartPoleAct(pub usize);

impl CartPoleAct {
    /// Push to the left.
    pub const LEFT: Self = Self(0);

    /// Push to the right.
    pub const RIGHT: Self = Self(1);
}

impl Act for CartPoleAct {
    fn from_index(ix: usize) -> Self {
        Self(ix)
    }

    fn index(&self) -> usize {
        self.0
    }
}

/// Cart-pole environment.
///
/// The state is integrated with the explicit Euler method at 50 Hz. Stepping
/// before [`Env::reset`] or after the end of an episode is an error.
pub struct CartPoleEnv {
    config: CartPoleConfig,
    state: [f32; 4],
    t: usize,
    is_done: bool,
    rng: StdRng,
}

impl CartPoleEnv {
    /// Starts an episode from the given state instead of a random one.
    pub fn reset_with_state(&mut self, state: [f32; 4]) -> CartPoleObs {
        self.state = state;
        self.t = 0;
        self.is_done = false;
        CartPoleObs(state)
    }

    fn is_terminal(state: &[f32; 4]) -> bool {
        let [x, _, theta, _] = *state;
        !(-X_THRESHOLD..=X_THRESHOLD).contains(&x)
            || !(-THETA_THRESHOLD..=THETA_THRESHOLD).contains(&theta)
    }

    /// One-line drawing of the track, the cart and the direction of the pole.
    pub fn frame(&self) -> String {
        const WIDTH: usize = 41;
        let [x, _, theta, _] = self.state;
        let pos = ((x + X_THRESHOLD) / (2.0 * X_THRESHOLD) * (WIDTH - 1) as f32).round();
        let pos = pos.clamp(0.0, (WIDTH - 1) as f32) as usize;
        let pole = match theta {
            t if t < -THETA_THRESHOLD / 3.0 => '\\',
            t if t > THETA_THRESHOLD / 3.0 => '/',
            _ => '|',
        };
        let track = (0..WIDTH)
            .map(|i| if i == pos { pole } else { '-' })
            .collect::<String>();
        format!("[{}] x={:+.3} theta={:+.3} t={}", track, x, theta, self.t)
    }
}

impl Env for CartPoleEnv {
    type Config = CartPoleConfig;
    type Obs = CartPoleObs;
    type Act = CartPoleAct;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        if config.max_steps == 0 {
            return Err(
                QlearnError::InvalidConfig("max_steps must be positive".to_string()).into(),
            );
        }
        Ok(Self {
            config: config.clone(),
            state: [0.0; 4],
            t: 0,
            is_done: true,
            rng: StdRng::seed_from_u64(seed as u64),
        })
    }

    fn reset(&mut self) -> Result<CartPoleObs> {
        let mut state = [0f32; 4];
        for v in state.iter_mut() {
            *v = self.rng.gen_range(-INIT_RANGE..=INIT_RANGE);
        }
        Ok(self.reset_with_state(state))
    }

    fn step(&mut self, a: &CartPoleAct) -> Result<Step<Self>> {
        if a.0 >= N_ACTIONS {
            return Err(QlearnError::InvalidAction {
                action: a.0,
                n_actions: N_ACTIONS,
            }
            .into());
        }
        if self.is_done {
            return Err(QlearnError::EpisodeFinished.into());
        }

        let [x, x_dot, theta, theta_dot] = self.state;
        let force = if *a == CartPoleAct::RIGHT {
            FORCE_MAG
        } else {
            -FORCE_MAG
        };
        let (sin_theta, cos_theta) = theta.sin_cos();

        let temp = (force + POLE_MASS_LENGTH * theta_dot * theta_dot * sin_theta) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (LENGTH * (4.0 / 3.0 - MASS_POLE * cos_theta * cos_theta / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc * cos_theta / TOTAL_MASS;

        // Positions are advanced with the velocities before the update
        self.state = [
            x + TAU * x_dot,
            x_dot + TAU * x_acc,
            theta + TAU * theta_dot,
            theta_dot + TAU * theta_acc,
        ];
        self.t += 1;

        let is_terminated = Self::is_terminal(&self.state);
        let is_truncated = !is_terminated && self.t >= self.config.max_steps;
        self.is_done = is_terminated || is_truncated;
        trace!("t = {}, state = {:?}", self.t, self.state);

        Ok(Step::new(
            CartPoleObs(self.state),
            *a,
            1.0,
            is_terminated,
            is_truncated,
            (),
        ))
    }

    fn sample_action(&mut self) -> CartPoleAct {
        CartPoleAct(self.rng.gen_range(0..N_ACTIONS))
    }

    fn obs_dim(&self) -> usize {
        4
    }

    fn n_actions(&self) -> usize {
        N_ACTIONS
    }

    fn render(&mut self) -> Result<()> {
        println!("{}", self.frame());
        if self.config.render_wait_millis > 0 {
            thread::sleep(Duration::from_millis(self.config.render_wait_millis));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> CartPoleEnv {
        CartPoleEnv::build(&CartPoleConfig::default(), 0).unwrap()
    }

    #[test]
    fn test_reset_is_seeded_and_small() -> Result<()> {
        let mut env1 = CartPoleEnv::build(&CartPoleConfig::default(), 7)?;
        let mut env2 = CartPoleEnv::build(&CartPoleConfig::default(), 7)?;
        for _ in 0..10 {
            let o1 = env1.reset()?;
            let o2 = env2.reset()?;
            assert_eq!(o1, o2);
            assert!(o1.0.iter().all(|v| v.abs() <= INIT_RANGE));
        }
        Ok(())
    }

    #[test]
    fn test_euler_step() -> Result<()> {
        let mut env = env();
        env.reset_with_state([0.0; 4]);
        let step = env.step(&CartPoleAct::RIGHT)?;

        // From rest only the velocities change
        let temp = FORCE_MAG / TOTAL_MASS;
        let theta_acc = -temp / (LENGTH * (4.0 / 3.0 - MASS_POLE / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc / TOTAL_MASS;
        let [x, x_dot, theta, theta_dot] = step.obs.0;
        assert_eq!(x, 0.0);
        assert_eq!(theta, 0.0);
        assert!((x_dot - TAU * x_acc).abs() < 1e-6);
        assert!((theta_dot - TAU * theta_acc).abs() < 1e-6);
        assert!(x_dot > 0.0 && theta_dot < 0.0);
        assert_eq!(step.reward, 1.0);
        assert!(!step.is_done());
        Ok(())
    }

    #[test]
    fn test_terminates_when_pole_falls() -> Result<()> {
        let mut env = env();
        env.reset_with_state([0.0, 0.0, THETA_THRESHOLD - 1e-4, 1.0]);
        let step = env.step(&CartPoleAct::LEFT)?;
        assert!(step.is_terminated);
        assert!(!step.is_truncated);
        assert_eq!(step.reward, 1.0);

        let err = env.step(&CartPoleAct::LEFT).err().unwrap();
        assert_eq!(
            err.downcast_ref::<QlearnError>(),
            Some(&QlearnError::EpisodeFinished)
        );
        Ok(())
    }

    #[test]
    fn test_terminates_when_cart_leaves_track() -> Result<()> {
        let mut env = env();
        env.reset_with_state([X_THRESHOLD - 1e-3, 1.0, 0.0, 0.0]);
        assert!(env.step(&CartPoleAct::RIGHT)?.is_terminated);
        Ok(())
    }

    #[test]
    fn test_invalid_action() {
        let mut env = env();
        env.reset_with_state([0.0; 4]);
        let err = env.step(&CartPoleAct(2)).err().unwrap();
        assert_eq!(
            err.downcast_ref::<QlearnError>(),
            Some(&QlearnError::InvalidAction {
                action: 2,
                n_actions: 2
            })
        );
    }

    #[test]
    fn test_step_before_reset() {
        let mut env = env();
        assert!(env.step(&CartPoleAct::LEFT).is_err());
    }

    #[test]
    fn test_frame() {
        let mut env = env();
        env.reset_with_state([0.0, 0.0, 0.1, 0.0]);
        let frame = env.frame();
        assert!(frame.starts_with("[--------------------/--------------------]"));
    }
}
