use anyhow::Result;
use candle_core::{Device, Tensor};
use qlearn_core::{error::QlearnError, Act, Obs};

/// Stacks observations into a `(batch, obs_dim)` tensor.
///
/// Fails with [`QlearnError::ObsDimMismatch`] if a row does not have
/// `obs_dim` elements.
pub fn obs_to_tensor<O: Obs>(obs: &[O], obs_dim: usize, device: &Device) -> Result<Tensor> {
    let mut data = Vec::with_capacity(obs.len() * obs_dim);
    for o in obs.iter() {
        let row = o.as_slice();
        if row.len() != obs_dim {
            return Err(QlearnError::ObsDimMismatch {
                expected: obs_dim,
                actual: row.len(),
            }
            .into());
        }
        data.extend_from_slice(row);
    }
    Ok(Tensor::from_vec(data, (obs.len(), obs_dim), device)?)
}

/// Stacks action indices into a `(batch, 1)` tensor of `u32`, usable with `gather`.
pub fn act_to_tensor<A: Act>(act: &[A], device: &Device) -> Result<Tensor> {
    let ixs = act.iter().map(|a| a.index() as u32).collect::<Vec<_>>();
    Ok(Tensor::from_vec(ixs, (act.len(), 1), device)?)
}
