//! Utilities.
use anyhow::{anyhow, Result};
use candle_core::{DType, Tensor, D};
use candle_nn::VarMap;
use log::trace;
use serde::{Deserialize, Serialize};

/// Critic loss type.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
pub enum CriticLoss {
    /// Mean squared error.
    Mse,

    /// Smooth L1 loss.
    #[default]
    SmoothL1,
}

/// Copies variables of `src` into those of `dest`.
///
/// Variables are identified by their names. After the call, every variable of
/// `dest` holds the same bits as the corresponding one of `src`; the storages
/// stay separate.
pub fn hard_update(dest: &VarMap, src: &VarMap) -> Result<()> {
    trace!("hard update");
    let dest = dest
        .data()
        .lock()
        .map_err(|_| anyhow!("lock of the destination varmap is poisoned"))?;
    let src = src
        .data()
        .lock()
        .map_err(|_| anyhow!("lock of the source varmap is poisoned"))?;

    for (name, v_dest) in dest.iter() {
        let v_src = src
            .get(name)
            .ok_or_else(|| anyhow!("variable {} is missing in the source varmap", name))?;
        v_dest.set(v_src.as_tensor())?;
    }

    Ok(())
}

/// Interface for handling input dimensions.
pub trait InDim {
    /// Returns the input dimension.
    fn get_in_dim(&self) -> usize;
}

/// See <https://pytorch.org/docs/stable/generated/torch.nn.SmoothL1Loss.html>.
pub fn smooth_l1_loss(x: &Tensor, y: &Tensor) -> Result<Tensor, candle_core::Error> {
    let d = (x - y)?.abs()?;
    let m1 = d.lt(1.0)?.to_dtype(DType::F32)?;
    let m2 = m1.affine(-1.0, 1.0)?;
    let quadratic = ((&m1 * d.sqr()?)? * 0.5)?;
    let linear = (&m2 * (&d - 0.5)?)?;
    (quadratic + linear)?.mean_all()
}

/// Targets of the Q-learning update, `r + γ (1 - done) max_a' Q(s', a')`.
///
/// `next_q` holds target network outputs of shape `(batch, n_actions)`;
/// `reward` and `is_not_done` are of shape `(batch,)`.
pub fn dqn_target(
    reward: &Tensor,
    is_not_done: &Tensor,
    discount_factor: f64,
    next_q: &Tensor,
) -> Result<Tensor, candle_core::Error> {
    let max_next_q = next_q.max(D::Minus1)?;
    let bootstrap = (is_not_done * discount_factor)?.mul(&max_next_q)?;
    reward.add(&bootstrap)
}

/// Index of the first maximum.
///
/// Returns `0` for an empty slice. NaN never wins.
pub fn argmax(xs: &[f32]) -> usize {
    let mut best = 0;
    for (i, &x) in xs.iter().enumerate().skip(1) {
        if x > xs[best] || xs[best].is_nan() {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use candle_nn::Init;

    fn varmap(values: &[f32]) -> Result<VarMap> {
        let vm = VarMap::new();
        let init = Init::Randn {
            mean: 0.0,
            stdev: 1.0,
        };
        vm.get((values.len(),), "var1", init, DType::F32, &Device::Cpu)?;
        let t = Tensor::from_slice(values, (values.len(),), &Device::Cpu)?;
        vm.data().lock().unwrap().get("var1").unwrap().set(&t)?;
        Ok(vm)
    }

    fn values(vm: &VarMap) -> Result<Vec<f32>> {
        let data = vm.data().lock().unwrap();
        Ok(data.get("var1").unwrap().as_tensor().to_vec1::<f32>()?)
    }

    #[test]
    fn test_hard_update() -> Result<()> {
        let src = varmap(&[1.0, -2.5, 3.25e-7])?;
        let dest = varmap(&[4.0, 5.0, 6.0])?;
        hard_update(&dest, &src)?;
        assert_eq!(values(&dest)?, values(&src)?);

        // The storages stay separate
        let t = Tensor::from_slice(&[0f32, 0.0, 0.0], (3,), &Device::Cpu)?;
        src.data().lock().unwrap().get("var1").unwrap().set(&t)?;
        assert_eq!(values(&dest)?, vec![1.0, -2.5, 3.25e-7]);
        Ok(())
    }

    #[test]
    fn test_smooth_l1_loss() -> Result<()> {
        let x = Tensor::from_slice(&[0f32, 0.0, 0.0, 1.0], (4,), &Device::Cpu)?;
        let y = Tensor::from_slice(&[0.5f32, 2.0, -3.0, 1.0], (4,), &Device::Cpu)?;
        // (0.125 + 1.5 + 2.5 + 0) / 4
        let loss = smooth_l1_loss(&x, &y)?.to_scalar::<f32>()?;
        assert!((loss - 1.03125).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_terminal_transition_does_not_bootstrap() -> Result<()> {
        let device = Device::Cpu;
        let reward = Tensor::from_slice(&[1f32, 1.0, -0.5], (3,), &device)?;
        let is_not_done = Tensor::from_slice(&[0f32, 1.0, 0.0], (3,), &device)?;
        let next_q = Tensor::from_slice(
            &[1e6f32, -3.0, 2.0, 4.0, -7.0, 123.0],
            (3, 2),
            &device,
        )?;

        let tgt = dqn_target(&reward, &is_not_done, 0.99, &next_q)?.to_vec1::<f32>()?;

        assert_eq!(tgt[0], 1.0);
        assert!((tgt[1] - (1.0 + 0.99 * 4.0)).abs() < 1e-6);
        assert_eq!(tgt[2], -0.5);
        Ok(())
    }

    #[test]
    fn test_argmax_takes_first_maximum() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7, -1.0]), 1);
        assert_eq!(argmax(&[2.0, 2.0]), 0);
        assert_eq!(argmax(&[-3.0, -1.0, -2.0]), 1);
        assert_eq!(argmax(&[f32::NAN, 1.0]), 1);
        assert_eq!(argmax(&[]), 0);
    }
}
