//! Train [`Agent`].
mod config;
mod history;
mod sampler;
use crate::{
    error::QlearnError,
    record::{
        Record,
        RecordValue::{Integer, Scalar},
        Recorder,
    },
    replay_buffer::Transition,
    Agent, EpsilonGreedy, Env, ExperienceBufferBase, Policy, ReplayBufferBase,
};
use anyhow::Result;
pub use config::TrainerConfig;
pub use history::RewardHistory;
use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};
pub use sampler::Sampler;
use std::path::Path;

/// Phase of the training loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Filling the replay buffer with random actions.
    Warmup,

    /// Epsilon-greedy interaction with learning.
    Training,

    /// The exit predicate holds; no further step is taken.
    Terminated,
}

/// Mutable state of a training run.
#[derive(Debug, Clone)]
pub struct TrainerState {
    /// Current phase.
    pub phase: Phase,

    /// The number of training steps taken, i.e. the index of the next one.
    pub step: usize,

    /// Returns of the latest finished episodes.
    pub reward_history: RewardHistory,

    /// Loss of the latest optimization step.
    pub last_loss: Option<f32>,

    /// Step and average reward at which the target reward was reached.
    pub solved: Option<(usize, f32)>,
}

impl TrainerState {
    /// Constructs the state at the start of a run.
    pub fn new(reward_history_len: usize) -> Self {
        Self {
            phase: Phase::Warmup,
            step: 0,
            reward_history: RewardHistory::new(reward_history_len),
            last_loss: None,
            solved: None,
        }
    }
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the training loop.
///
/// # Training loop
///
/// The loop is a state machine over [`Phase`]:
///
/// ```mermaid
/// stateDiagram-v2
///     [*] --> Warmup
///     Warmup --> Training: min_replay_size steps
///     Training --> Training: exit predicate false
///     Training --> Terminated: exit predicate true
///     Terminated --> [*]
/// ```
///
/// 1. Warmup: `min_replay_size` steps with uniformly random actions. Each
///    transition is pushed into the replay buffer; episode returns are not
///    tracked. The environment is reset when the phase ends.
/// 2. Training: for each step `t = 0, 1, ...`
///     1. With probability `epsilon(t)` take a random action, otherwise the
///        agent's greedy action.
///     2. Apply the action, push the transition into the replay buffer. At
///        the end of an episode, its return enters the [`RewardHistory`].
///     3. Do an optimization step of the agent with a batch sampled from the
///        buffer. The agent skips it while the buffer holds fewer
///        transitions than its batch size.
///     4. If `t % target_update_interval == 0`, copy the online network into
///        the target network.
///     5. If `t % log_interval == 0`, write a progress record (`step`,
///        `avg_reward`, `epsilon` and `loss`) to the recorder and evaluate the
///        target reward.
///     6. Stop when the exit predicate holds (see [`Trainer::is_finished`]).
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|Env::Act|B[Sampler]
///     B -->|Env::Obs|A
///     B -->|Transition|D[ReplayBufferBase]
///     D -->|Batch|A
/// ```
pub struct Trainer {
    min_replay_size: usize,
    target_update_interval: usize,
    log_interval: usize,
    reward_history_len: usize,
    explorer: EpsilonGreedy,
    clip_reward: Option<f32>,
    target_reward: Option<f32>,
    max_steps: Option<usize>,
    model_dir: Option<String>,
    rng: StdRng,
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Result<Self> {
        if config.target_update_interval == 0 || config.log_interval == 0 {
            return Err(QlearnError::InvalidConfig(
                "target_update_interval and log_interval must be positive".to_string(),
            )
            .into());
        }
        if let Some(bound) = config.clip_reward {
            if !bound.is_finite() || bound < 0.0 {
                return Err(QlearnError::InvalidConfig(format!(
                    "clip_reward must be a finite non-negative bound, got {}",
                    bound
                ))
                .into());
            }
        }

        Ok(Self {
            min_replay_size: config.min_replay_size,
            target_update_interval: config.target_update_interval,
            log_interval: config.log_interval,
            reward_history_len: config.reward_history_len,
            explorer: config.explorer,
            clip_reward: config.clip_reward,
            target_reward: config.target_reward,
            max_steps: config.max_steps,
            model_dir: config.model_dir,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Creates the sampler used by this trainer for the given environment.
    pub fn sampler<E: Env>(&self, env: E) -> Sampler<E> {
        Sampler::new(env, self.clip_reward)
    }

    /// Fills the replay buffer with `min_replay_size` random-action transitions.
    ///
    /// The environment is reset at the end, so training starts from a fresh
    /// episode.
    pub fn warmup<E, R>(
        &mut self,
        sampler: &mut Sampler<E>,
        buffer: &mut R,
        state: &mut TrainerState,
    ) -> Result<()>
    where
        E: Env,
        R: ExperienceBufferBase<Item = Transition<E::Obs, E::Act>>,
    {
        info!("Warmup: {} random steps", self.min_replay_size);
        state.phase = Phase::Warmup;
        sampler.reset()?;
        for _ in 0..self.min_replay_size {
            let act = sampler.sample_action();
            let _ = sampler.step_and_push(&act, buffer)?;
        }
        sampler.reset()?;
        state.phase = Phase::Training;
        info!("Warmup done, {} transitions in the buffer", buffer.len());
        Ok(())
    }

    /// Chooses an action epsilon-greedily.
    fn explore<E, P>(
        &mut self,
        policy: &mut P,
        sampler: &mut Sampler<E>,
        epsilon: f64,
    ) -> Result<E::Act>
    where
        E: Env,
        P: Policy<E>,
    {
        if self.rng.gen::<f64>() < epsilon {
            Ok(sampler.sample_action())
        } else {
            policy.sample(sampler.obs()?)
        }
    }

    /// Performs a training step.
    ///
    /// Does nothing if the state has already reached [`Phase::Terminated`].
    pub fn train_step<E, A, R>(
        &mut self,
        agent: &mut A,
        buffer: &mut R,
        sampler: &mut Sampler<E>,
        state: &mut TrainerState,
        recorder: &mut dyn Recorder,
    ) -> Result<()>
    where
        E: Env,
        A: Agent<E, R>,
        R: ExperienceBufferBase<Item = Transition<E::Obs, E::Act>> + ReplayBufferBase,
    {
        if state.phase == Phase::Terminated {
            return Ok(());
        }
        state.phase = Phase::Training;
        let step = state.step;

        // Environment step
        let epsilon = self.explorer.epsilon(step);
        let act = self.explore(agent, sampler, epsilon)?;
        if let Some(episode_reward) = sampler.step_and_push(&act, buffer)? {
            state.reward_history.push(episode_reward);
        }

        // Optimization step
        if let Some(record) = agent.opt(buffer)? {
            if let Ok(loss) = record.get_scalar("loss") {
                state.last_loss = Some(loss);
            }
        }

        // Hard update of the target network
        if step % self.target_update_interval == 0 {
            debug!("Sync target network at step {}", step);
            agent.sync_target()?;
        }

        // Progress and target reward
        if step % self.log_interval == 0 {
            let avg_reward = state.reward_history.mean();
            let mut record = Record::from_slice(&[
                ("step", Integer(step)),
                ("avg_reward", Scalar(avg_reward)),
                ("epsilon", Scalar(epsilon as f32)),
            ]);
            if let Some(loss) = state.last_loss {
                record.insert("loss", Scalar(loss));
            }
            recorder.write(record);

            if self.target_reward.is_some_and(|target| avg_reward >= target) {
                info!("Solved at step {} with average reward {}", step, avg_reward);
                state.solved = Some((step, avg_reward));
            }
        }

        state.step += 1;
        if self.is_finished(state) {
            state.phase = Phase::Terminated;
        }
        Ok(())
    }

    /// The exit predicate of the training loop.
    ///
    /// Holds when the average reward at a log step has reached the target
    /// reward, or when `max_steps` training steps have been taken.
    pub fn is_finished(&self, state: &TrainerState) -> bool {
        state.solved.is_some() || self.max_steps.is_some_and(|max| state.step >= max)
    }

    /// Train the agent.
    ///
    /// Runs warmup, then training steps until the exit predicate holds. The
    /// agent is saved in `model_dir` if it is set. Returns the final state and
    /// the environment.
    pub fn train<E, A, R>(
        &mut self,
        env: E,
        agent: &mut A,
        buffer: &mut R,
        recorder: &mut dyn Recorder,
    ) -> Result<(TrainerState, E)>
    where
        E: Env,
        A: Agent<E, R>,
        R: ExperienceBufferBase<Item = Transition<E::Obs, E::Act>> + ReplayBufferBase,
    {
        let mut state = TrainerState::new(self.reward_history_len);
        let mut sampler = self.sampler(env);

        self.warmup(&mut sampler, buffer, &mut state)?;
        while state.phase != Phase::Terminated {
            self.train_step(agent, buffer, &mut sampler, &mut state, recorder)?;
        }
        info!("Training finished after {} steps", state.step);

        if let Some(model_dir) = &self.model_dir {
            agent.save_params(Path::new(model_dir))?;
            info!("Saved the model in {:?}", model_dir);
        }

        Ok((state, sampler.into_env()))
    }
}
