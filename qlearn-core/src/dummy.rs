//! Deterministic environment and agent used in tests.
use crate::{
    error::QlearnError,
    record::Record,
    Act, Agent, Env, ExperienceBufferBase, Obs, Policy, ReplayBufferBase, Step,
};
use anyhow::Result;
use std::path::Path;

/// Observation of [`DummyEnv`], always zero.
#[derive(Clone, Debug, PartialEq)]
pub struct DummyObs(pub [f32; 4]);

impl Obs for DummyObs {
    fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

/// Action of [`DummyEnv`].
#[derive(Clone, Debug, PartialEq)]
pub struct DummyAct(pub usize);

impl Act for DummyAct {
    fn from_index(ix: usize) -> Self {
        Self(ix)
    }

    fn index(&self) -> usize {
        self.0
    }
}

/// Configuration of [`DummyEnv`].
#[derive(Clone, Debug)]
pub struct DummyEnvConfig {
    /// Episodes terminate after this number of steps.
    pub episode_len: usize,

    /// Reward of every step.
    pub reward: f32,
}

impl Default for DummyEnvConfig {
    fn default() -> Self {
        Self {
            episode_len: 10,
            reward: 1.0,
        }
    }
}

/// Environment with two actions and fixed observation `[0, 0, 0, 0]`.
///
/// Every step yields the configured reward; the episode terminates at step
/// `episode_len`.
pub struct DummyEnv {
    config: DummyEnvConfig,
    t: usize,
    next_action: usize,

    /// The number of resets so far.
    pub n_resets: usize,
}

impl Env for DummyEnv {
    type Config = DummyEnvConfig;
    type Obs = DummyObs;
    type Act = DummyAct;
    type Info = ();

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            t: 0,
            next_action: 0,
            n_resets: 0,
        })
    }

    fn reset(&mut self) -> Result<DummyObs> {
        self.t = 0;
        self.n_resets += 1;
        Ok(DummyObs([0.0; 4]))
    }

    fn step(&mut self, a: &DummyAct) -> Result<Step<Self>> {
        if a.0 >= 2 {
            return Err(QlearnError::InvalidAction {
                action: a.0,
                n_actions: 2,
            }
            .into());
        }
        if self.t >= self.config.episode_len {
            return Err(QlearnError::EpisodeFinished.into());
        }
        self.t += 1;
        let is_terminated = self.t == self.config.episode_len;
        Ok(Step::new(
            DummyObs([0.0; 4]),
            a.clone(),
            self.config.reward,
            is_terminated,
            false,
            (),
        ))
    }

    /// Alternates between the two actions.
    fn sample_action(&mut self) -> DummyAct {
        let a = DummyAct(self.next_action);
        self.next_action = 1 - self.next_action;
        a
    }

    fn obs_dim(&self) -> usize {
        4
    }

    fn n_actions(&self) -> usize {
        2
    }
}

/// Agent always taking action `0` and recording calls from the trainer.
#[derive(Debug, Default)]
pub struct DummyAgent {
    /// Optimization steps are skipped while the buffer is smaller.
    pub batch_size: usize,

    /// The number of optimization steps done.
    pub n_opts: usize,

    /// The number of target network syncs.
    pub n_syncs: usize,

    /// The number of greedy actions taken.
    pub n_samples: usize,
}

impl DummyAgent {
    /// Constructs an agent optimizing with batches of `batch_size`.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            ..Self::default()
        }
    }
}

impl Policy<DummyEnv> for DummyAgent {
    fn sample(&mut self, _obs: &DummyObs) -> Result<DummyAct> {
        self.n_samples += 1;
        Ok(DummyAct(0))
    }
}

impl<R> Agent<DummyEnv, R> for DummyAgent
where
    R: ReplayBufferBase + ExperienceBufferBase,
{
    fn opt(&mut self, buffer: &mut R) -> Result<Option<Record>> {
        if buffer.len() < self.batch_size {
            return Ok(None);
        }
        let _ = buffer.batch(self.batch_size)?;
        self.n_opts += 1;
        Ok(Some(Record::from_scalar("loss", 0.5)))
    }

    fn sync_target(&mut self) -> Result<()> {
        self.n_syncs += 1;
        Ok(())
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)?;
        std::fs::write(path.join("dummy_agent.txt"), self.n_opts.to_string())?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.n_opts = std::fs::read_to_string(path.join("dummy_agent.txt"))?
            .trim()
            .parse()?;
        Ok(())
    }
}
