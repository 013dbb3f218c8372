//! Default implementation of the [`Evaluator`] trait.
use super::Evaluator;
use crate::{
    record::{Record, RecordValue},
    Env, Policy,
};
use anyhow::Result;
use log::info;

/// Runs a fixed number of episodes with a policy.
///
/// The returned record holds the return of each episode as `"episode_rewards"`
/// and their mean as `"mean_episode_reward"`. Episodes end at termination or
/// truncation. With rendering enabled, [`Env::render`] is called after every
/// step.
///
/// ```ignore
/// let mut evaluator = DefaultEvaluator::new(&env_config, 42, 5)?.render(true);
/// let record = evaluator.evaluate(&mut agent)?;
/// println!("{:?}", record.get_array1("episode_rewards")?);
/// ```
pub struct DefaultEvaluator<E: Env> {
    n_episodes: usize,
    render: bool,
    env: E,
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<P>(&mut self, policy: &mut P) -> Result<Record>
    where
        P: Policy<E>,
    {
        let mut episode_rewards = Vec::with_capacity(self.n_episodes);

        for ix in 0..self.n_episodes {
            let mut prev_obs = self.env.reset()?;
            let mut episode_reward = 0f32;

            loop {
                let act = policy.sample(&prev_obs)?;
                let step = self.env.step(&act)?;
                episode_reward += step.reward;
                if self.render {
                    self.env.render()?;
                }
                if step.is_done() {
                    break;
                }
                prev_obs = step.obs;
            }

            info!("Evaluation episode {}: return {}", ix, episode_reward);
            episode_rewards.push(episode_reward);
        }

        let mean = match episode_rewards.len() {
            0 => 0.0,
            n => episode_rewards.iter().sum::<f32>() / n as f32,
        };
        Ok(Record::from_slice(&[
            ("episode_rewards", RecordValue::Array1(episode_rewards)),
            ("mean_episode_reward", RecordValue::Scalar(mean)),
        ]))
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs an evaluator with a new environment.
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize) -> Result<Self> {
        Ok(Self::from_env(E::build(config, seed)?, n_episodes))
    }

    /// Constructs an evaluator running episodes in `env`.
    pub fn from_env(env: E, n_episodes: usize) -> Self {
        Self {
            n_episodes,
            render: false,
            env,
        }
    }

    /// Sets if the environment is rendered at every step.
    pub fn render(mut self, render: bool) -> Self {
        self.render = render;
        self
    }
}
