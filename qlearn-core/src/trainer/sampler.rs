//! Interaction with the environment during training.
use crate::{clip_reward, replay_buffer::Transition, Env, ExperienceBufferBase};
use anyhow::Result;
use log::trace;

/// Steps the environment and pushes transitions into a replay buffer.
///
/// The sampler owns the environment and the current observation, and tracks
/// the return of the running episode. An episode ends when the environment
/// reports termination or truncation; the environment is then reset and the
/// return of the finished episode is handed to the caller. Only termination
/// is stored as `done` in the transition, so bootstrapping continues past a
/// truncated episode.
pub struct Sampler<E: Env> {
    env: E,
    prev_obs: Option<E::Obs>,
    clip_reward: Option<f32>,
    episode_reward: f32,
}

impl<E: Env> Sampler<E> {
    /// Creates a sampler; rewards are clipped into `[-b, b]` if `clip_reward` is `Some(b)`.
    pub fn new(env: E, clip_reward: Option<f32>) -> Self {
        Self {
            env,
            prev_obs: None,
            clip_reward,
            episode_reward: 0.0,
        }
    }

    /// Resets the environment and discards the running episode return.
    pub fn reset(&mut self) -> Result<()> {
        self.prev_obs = Some(self.env.reset()?);
        self.episode_reward = 0.0;
        Ok(())
    }

    /// The current observation, resetting the environment if there is none yet.
    pub fn obs(&mut self) -> Result<&E::Obs> {
        if self.prev_obs.is_none() {
            self.reset()?;
        }
        let obs = self.prev_obs.as_ref().ok_or_else(|| {
            anyhow::anyhow!("environment returned no observation after reset")
        })?;
        Ok(obs)
    }

    /// A uniformly random action of the environment.
    pub fn sample_action(&mut self) -> E::Act {
        self.env.sample_action()
    }

    /// Applies `act` to the environment and pushes the resulting transition.
    ///
    /// Returns the episode return when the step ended the episode.
    pub fn step_and_push<R>(&mut self, act: &E::Act, buffer: &mut R) -> Result<Option<f32>>
    where
        R: ExperienceBufferBase<Item = Transition<E::Obs, E::Act>>,
    {
        let obs = self.obs()?.clone();
        let step = self.env.step(act)?;
        let reward = clip_reward(step.reward, self.clip_reward);
        let is_done = step.is_done();

        buffer.push(Transition {
            obs,
            act: step.act,
            reward,
            done: step.is_terminated,
            next_obs: step.obs.clone(),
        })?;
        self.episode_reward += reward;

        if is_done {
            let episode_reward = self.episode_reward;
            trace!("Episode finished with return {}", episode_reward);
            self.reset()?;
            Ok(Some(episode_reward))
        } else {
            self.prev_obs = Some(step.obs);
            Ok(None)
        }
    }

    /// Gives the environment back.
    pub fn into_env(self) -> E {
        self.env
    }
}
