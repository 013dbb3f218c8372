//! DQN agent implemented with candle.
use super::{config::DqnConfig, model::DqnModel};
use crate::{
    act_to_tensor,
    model::SubModel1,
    obs_to_tensor,
    util::{argmax, dqn_target, smooth_l1_loss, CriticLoss, InDim},
};
use anyhow::Result;
use candle_core::{Device, Tensor, D};
use candle_nn::loss::mse;
use log::{debug, trace};
use qlearn_core::{
    error::QlearnError,
    record::{Record, RecordValue},
    Act, Agent, Configurable, Env, ExperienceBufferBase, Policy, ReplayBufferBase,
    TransitionBatch,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, marker::PhantomData, path::Path};

#[allow(clippy::upper_case_acronyms)]
/// DQN agent implemented with candle.
///
/// The agent holds an online network, trained by gradient descent, and a
/// target network, used to compute the targets of the Q-learning update and
/// changed only by [`Agent::sync_target`]. Its policy is greedy with respect
/// to the online network; exploration is left to the trainer.
pub struct Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InDim + Clone,
{
    pub(in crate::dqn) qnet: DqnModel<Q>,
    pub(in crate::dqn) qnet_tgt: DqnModel<Q>,
    pub(in crate::dqn) batch_size: usize,
    pub(in crate::dqn) discount_factor: f64,
    pub(in crate::dqn) critic_loss: CriticLoss,
    pub(in crate::dqn) obs_dim: usize,
    pub(in crate::dqn) device: Device,
    pub(in crate::dqn) n_opts: usize,
    phantom: PhantomData<(E, R)>,
}

impl<E, Q, R> Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InDim + Clone,
{
    /// Action values of the online network for a single observation.
    pub fn q_values(&self, obs: &E::Obs) -> Result<Vec<f32>> {
        let obs = obs_to_tensor(std::slice::from_ref(obs), self.obs_dim, &self.device)?;
        let q = self.qnet.forward(&obs)?.squeeze(0)?;
        Ok(q.to_vec1::<f32>()?)
    }

    /// Action values of the target network for a single observation.
    pub fn target_q_values(&self, obs: &E::Obs) -> Result<Vec<f32>> {
        let obs = obs_to_tensor(std::slice::from_ref(obs), self.obs_dim, &self.device)?;
        let q = self.qnet_tgt.forward(&obs)?.squeeze(0)?;
        Ok(q.to_vec1::<f32>()?)
    }

    /// The online network.
    pub fn qnet(&self) -> &DqnModel<Q> {
        &self.qnet
    }

    /// The target network.
    pub fn qnet_tgt(&self) -> &DqnModel<Q> {
        &self.qnet_tgt
    }

    /// The number of optimization steps done.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }
}

impl<E, Q, R> Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InDim + Clone,
    R: ReplayBufferBase,
    R::Batch: TransitionBatch<ObsBatch = Vec<E::Obs>, ActBatch = Vec<E::Act>>,
{
    fn update_critic(&mut self, buffer: &mut R) -> Result<f32> {
        let batch = buffer.batch(self.batch_size)?;
        let (obs, act, next_obs, reward, is_done) = batch.unpack();
        let obs = obs_to_tensor(&obs, self.obs_dim, &self.device)?;
        let act = act_to_tensor(&act, &self.device)?;
        let next_obs = obs_to_tensor(&next_obs, self.obs_dim, &self.device)?;
        let reward = Tensor::from_slice(&reward[..], (reward.len(),), &self.device)?;
        let is_not_done = {
            let is_not_done = is_done
                .into_iter()
                .map(|v| (1 - v) as f32)
                .collect::<Vec<_>>();
            Tensor::from_slice(&is_not_done[..], (is_not_done.len(),), &self.device)?
        };

        let pred = self
            .qnet
            .forward(&obs)?
            .gather(&act, D::Minus1)?
            .squeeze(D::Minus1)?;

        let tgt = {
            let q = self.qnet_tgt.forward(&next_obs)?;
            dqn_target(&reward, &is_not_done, self.discount_factor, &q)?
        }
        .detach();

        let loss = match self.critic_loss {
            CriticLoss::Mse => mse(&pred, &tgt)?,
            CriticLoss::SmoothL1 => smooth_l1_loss(&pred, &tgt)?,
        };
        let loss_value = loss.to_scalar::<f32>()?;
        if !loss_value.is_finite() {
            return Err(QlearnError::NonFiniteLoss {
                loss: loss_value,
                n_opts: self.n_opts,
            }
            .into());
        }

        // Backprop
        self.qnet.backward_step(&loss)?;
        trace!("loss = {}", loss_value);

        Ok(loss_value)
    }
}

impl<E, Q, R> Configurable for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InDim + Clone,
{
    type Config = DqnConfig<Q::Config>;

    /// Constructs DQN agent.
    ///
    /// The target network starts as a copy of the online network.
    fn build(config: Self::Config) -> Result<Self> {
        let device: Device = config.device.try_into()?;
        let obs_dim = config
            .model_config
            .q_config
            .as_ref()
            .map(|q_config| q_config.get_in_dim())
            .unwrap_or_default();
        let qnet = DqnModel::build(config.model_config.clone(), &device)?;
        let mut qnet_tgt = DqnModel::build_target(config.model_config, &device)?;
        qnet_tgt.copy_from(&qnet)?;

        Ok(Dqn {
            qnet,
            qnet_tgt,
            batch_size: config.batch_size,
            discount_factor: config.discount_factor,
            critic_loss: config.critic_loss,
            obs_dim,
            device,
            n_opts: 0,
            phantom: PhantomData,
        })
    }
}

impl<E, Q, R> Policy<E> for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InDim + Clone,
{
    /// Takes the action with the largest value, the first one on ties.
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        let q = self.q_values(obs)?;
        Ok(E::Act::from_index(argmax(&q)))
    }
}

impl<E, Q, R> Agent<E, R> for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InDim + Clone,
    R: ReplayBufferBase + ExperienceBufferBase,
    R::Batch: TransitionBatch<ObsBatch = Vec<E::Obs>, ActBatch = Vec<E::Act>>,
{
    /// Skipped while the buffer holds fewer transitions than the batch size.
    fn opt(&mut self, buffer: &mut R) -> Result<Option<Record>> {
        if buffer.len() < self.batch_size {
            return Ok(None);
        }

        let loss = self.update_critic(buffer)?;
        self.n_opts += 1;

        Ok(Some(Record::from_slice(&[
            ("loss", RecordValue::Scalar(loss)),
            ("n_opts", RecordValue::Scalar(self.n_opts as f32)),
        ])))
    }

    fn sync_target(&mut self) -> Result<()> {
        debug!("Copy online network to target network");
        self.qnet_tgt.copy_from(&self.qnet)
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.qnet.save(path.join("qnet.safetensors"))?;
        self.qnet_tgt.save(path.join("qnet_tgt.safetensors"))?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.qnet.load(path.join("qnet.safetensors"))?;
        self.qnet_tgt.load(path.join("qnet_tgt.safetensors"))?;
        Ok(())
    }
}
