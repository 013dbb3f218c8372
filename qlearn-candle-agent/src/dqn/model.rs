use crate::{
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    util::hard_update,
};
use anyhow::{anyhow, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`DqnModel`].
pub struct DqnModelConfig<Q> {
    pub(super) q_config: Option<Q>,
    pub(super) opt_config: OptimizerConfig,
}

impl<Q> Default for DqnModelConfig<Q> {
    fn default() -> Self {
        Self {
            q_config: None,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl<Q> DqnModelConfig<Q>
where
    Q: DeserializeOwned + Serialize,
{
    /// Sets configurations for action-value function.
    pub fn q_config(mut self, v: Q) -> Self {
        self.q_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Constructs [`DqnModelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DqnModelConfig`] to as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Action-value network with its variables.
///
/// The online network of the agent owns an optimizer; the target network
/// does not and is only changed by [`DqnModel::copy_from`].
pub struct DqnModel<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
{
    varmap: VarMap,

    // Action-value function
    q: Q,

    opt: Option<Optimizer>,
}

impl<Q> DqnModel<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    /// Constructs [`DqnModel`] with an optimizer.
    pub fn build(config: DqnModelConfig<Q::Config>, device: &Device) -> Result<Self> {
        Self::_build(config, device, true)
    }

    /// Constructs [`DqnModel`] without optimizer.
    pub fn build_target(config: DqnModelConfig<Q::Config>, device: &Device) -> Result<Self> {
        Self::_build(config, device, false)
    }

    fn _build(config: DqnModelConfig<Q::Config>, device: &Device, with_opt: bool) -> Result<Self> {
        let q_config = config.q_config.context("q_config is not set.")?;
        let varmap = VarMap::new();
        let q = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
            Q::build(vb, q_config)?
        };
        let opt = match with_opt {
            true => Some(config.opt_config.build(varmap.all_vars())?),
            false => None,
        };

        Ok(Self {
            varmap,
            q,
            opt,
        })
    }

    /// Outputs the action-value given observation(s).
    pub fn forward(&self, obs: &Tensor) -> Result<Tensor> {
        self.q.forward(obs)
    }

    /// Updates the parameters with the gradient of `loss`.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        match &mut self.opt {
            Some(opt) => opt.backward_step(loss),
            None => Err(anyhow!("the model has no optimizer")),
        }
    }

    /// Overwrites the parameters with an exact copy of those of `src`.
    pub fn copy_from(&mut self, src: &DqnModel<Q>) -> Result<()> {
        hard_update(&self.varmap, &src.varmap)
    }

    /// Saves the parameters in safetensors format.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save dqnmodel to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads parameters saved with [`DqnModel::save`].
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load dqnmodel from {:?}", path.as_ref());
        Ok(())
    }
}
