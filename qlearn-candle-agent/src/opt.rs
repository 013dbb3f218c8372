//! Optimizers.
use anyhow::Result;
use candle_core::{Tensor, Var};
use candle_nn::Optimizer as _;
use candle_optimisers::adam::{Adam, ParamsAdam};
use serde::{Deserialize, Serialize};

/// Configuration of the optimizer of the online network.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// Adam with default moment decay rates.
    Adam {
        /// Learning rate.
        lr: f64,
    },
}

impl OptimizerConfig {
    /// Constructs the optimizer over the given variables.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        match &self {
            OptimizerConfig::Adam { lr } => {
                let params = ParamsAdam {
                    lr: *lr,
                    ..ParamsAdam::default()
                };
                let opt = Adam::new(vars, params)?;
                Ok(Optimizer::Adam(opt))
            }
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam { lr: 5e-4 }
    }
}

/// Optimizer built from an [`OptimizerConfig`].
pub enum Optimizer {
    /// Adam optimizer.
    Adam(Adam),
}

impl Optimizer {
    /// Computes gradients of `loss` and updates the variables.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        match self {
            Self::Adam(opt) => Ok(opt.backward_step(loss)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_adam_step_decreases_loss() -> Result<()> {
        let w = Var::from_slice(&[3.0f32, -2.0], (2,), &Device::Cpu)?;
        let mut opt = OptimizerConfig::Adam { lr: 0.1 }.build(vec![w.clone()])?;

        let loss = |w: &Var| -> Result<Tensor> { Ok(w.as_tensor().sqr()?.sum_all()?) };
        let before = loss(&w)?.to_scalar::<f32>()?;
        for _ in 0..10 {
            opt.backward_step(&loss(&w)?)?;
        }
        let after = loss(&w)?.to_scalar::<f32>()?;
        assert!(after < before);
        Ok(())
    }

    #[test]
    fn test_deserialize() -> Result<()> {
        let config: OptimizerConfig = serde_yaml::from_str("Adam:\n  lr: 0.01\n")?;
        assert_eq!(config, OptimizerConfig::Adam { lr: 0.01 });
        Ok(())
    }
}
