//! Sentence pooling over encoder token states.

use anyhow::{ensure, Result};
use candle_core::{DType, Tensor};

/// Mean of the token states the mask keeps. `[B,T,H]` with a `[B,T]` mask gives `[B,H]`.
pub fn masked_mean(hidden: &Tensor, mask: &Tensor) -> Result<Tensor> {
    let (batch, tokens, _) = hidden.dims3()?;
    ensure!(mask.dims() == [batch, tokens], "mask shape {:?} does not match hidden {:?}", mask.dims(), hidden.dims());
    let mask = mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let summed = hidden.broadcast_mul(&mask.unsqueeze(2)?)?.sum(1)?;
    let kept = mask.sum_keepdim(1)?;
    Ok(summed.broadcast_div(&kept)?)
}

/// Scales every row of a `[B,H]` tensor to unit length.
pub fn l2_normalize(rows: &Tensor) -> Result<Tensor> {
    let eps = if rows.dtype() == DType::F16 { 1e-6 } else { 1e-12 };
    let norm = (rows.sqr()?.sum_keepdim(1)?.sqrt()? + eps)?;
    Ok(rows.broadcast_div(&norm)?)
}

pub fn masked_mean_l2(hidden: &Tensor, mask: &Tensor) -> Result<Tensor> {
    l2_normalize(&masked_mean(hidden, mask)?)
}
