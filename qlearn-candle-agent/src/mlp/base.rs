use super::{mlp_forward, MlpConfig};
use crate::model::SubModel1;
use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::{linear, Linear, VarBuilder};

/// Returns vector of linear modules from [`MlpConfig`].
fn create_linear_layers(prefix: &str, vs: VarBuilder, config: &MlpConfig) -> Result<Vec<Linear>> {
    let dims = std::iter::once(config.in_dim)
        .chain(config.units.iter().copied())
        .chain(std::iter::once(config.out_dim))
        .collect::<Vec<_>>();
    let vs = vs.pp(prefix);

    dims.windows(2)
        .enumerate()
        .map(|(i, w)| {
            linear(w[0], w[1], vs.pp(format!("ln{}", i))).map_err(anyhow::Error::from)
        })
        .collect()
}

/// Multilayer perceptron with ReLU activation function.
///
/// The output layer has no activation, so the outputs can be used as action
/// values.
pub struct Mlp {
    device: Device,
    layers: Vec<Linear>,
}

impl SubModel1 for Mlp {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, xs: &Self::Input) -> Result<Tensor> {
        let xs = xs.to_device(&self.device)?;
        Ok(mlp_forward(xs, &self.layers)?)
    }

    fn build(vs: VarBuilder, config: Self::Config) -> Result<Self> {
        let device = vs.device().clone();
        let layers = create_linear_layers("mlp", vs, &config)?;

        Ok(Self { device, layers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;
    use candle_nn::VarMap;

    #[test]
    fn test_mlp_shapes() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let mlp = Mlp::build(vb, MlpConfig::new(4, vec![64, 64], 2))?;

        let xs = Tensor::zeros((5, 4), DType::F32, &Device::Cpu)?;
        assert_eq!(mlp.forward(&xs)?.dims(), &[5, 2]);

        // Three layers with weights and biases
        let names = varmap.data().lock().unwrap().keys().cloned().collect::<Vec<_>>();
        assert_eq!(names.len(), 6);
        assert!(names.contains(&"mlp.ln2.weight".to_string()));
        Ok(())
    }

    #[test]
    fn test_mlp_without_hidden_layer() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let mlp = Mlp::build(vb, MlpConfig::new(3, vec![], 5))?;

        let xs = Tensor::zeros((1, 3), DType::F32, &Device::Cpu)?;
        assert_eq!(mlp.forward(&xs)?.dims(), &[1, 5]);
        Ok(())
    }
}
