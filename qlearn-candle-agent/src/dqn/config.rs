//! Configuration of DQN agent.
use super::DqnModelConfig;
use crate::{util::CriticLoss, Device};
use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Dqn`](super::Dqn) agent.
///
/// `Q` is the configuration of the action-value network.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig<Q> {
    /// Configuration of the action-value network and its optimizer.
    pub model_config: DqnModelConfig<Q>,

    /// The number of transitions in a batch.
    pub batch_size: usize,

    /// Discount factor.
    pub discount_factor: f64,

    /// Loss between predicted and target action values.
    pub critic_loss: CriticLoss,

    /// Device on which the networks live.
    pub device: Device,
}

impl<Q> Default for DqnConfig<Q> {
    fn default() -> Self {
        Self {
            model_config: DqnModelConfig::default(),
            batch_size: 32,
            discount_factor: 0.99,
            critic_loss: CriticLoss::SmoothL1,
            device: Device::Cpu,
        }
    }
}

impl<Q> DqnConfig<Q>
where
    Q: DeserializeOwned + Serialize,
{
    /// Sets the configuration of the model.
    pub fn model_config(mut self, model_config: DqnModelConfig<Q>) -> Self {
        self.model_config = model_config;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.discount_factor = v;
        self
    }

    /// Sets critic loss.
    pub fn critic_loss(mut self, v: CriticLoss) -> Self {
        self.critic_loss = v;
        self
    }

    /// Sets device.
    pub fn device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Loads [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DqnConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
