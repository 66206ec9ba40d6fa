//! Utilities.
use anyhow::Result;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::encoding::one_hot;

/// Stacks rows of equal length into a 2-dimensional `f32` tensor of shape `[rows.len(), width]`.
///
/// An empty slice gives a tensor of shape `[0, 0]`.
pub fn rows_to_tensor(rows: &[Vec<f32>], device: &Device) -> Result<Tensor> {
    let n = rows.len();
    let width = rows.first().map(|r| r.len()).unwrap_or(0);
    let v = rows.concat();
    Ok(Tensor::from_vec(v, (n, width), device)?)
}

/// Splits a tensor along its last dimension into consecutive branches of the given sizes.
pub fn break_into_branches(t: &Tensor, branch_sizes: &[usize]) -> Result<Vec<Tensor>> {
    let mut start = 0;
    let mut branches = Vec::with_capacity(branch_sizes.len());
    for &size in branch_sizes.iter() {
        branches.push(t.narrow(D::Minus1, start, size)?);
        start += size;
    }
    Ok(branches)
}

/// Converts discrete actions into one-hot encodings, one tensor per branch.
///
/// `actions` has shape `[batch_size, branch_sizes.len()]` and holds the index of the
/// chosen action of each branch. The `k`-th output has shape `[batch_size, branch_sizes[k]]`.
pub fn actions_to_onehot(actions: &Tensor, branch_sizes: &[usize]) -> Result<Vec<Tensor>> {
    let mut onehots = Vec::with_capacity(branch_sizes.len());
    for (k, &size) in branch_sizes.iter().enumerate() {
        let ixs = actions.narrow(1, k, 1)?.squeeze(1)?.to_dtype(DType::U32)?;
        onehots.push(one_hot(ixs, size, 1f32, 0f32)?);
    }
    Ok(onehots)
}

/// Returns the scalar value of a tensor with a single element as `f32`.
pub fn to_scalar_f32(t: &Tensor) -> Result<f32> {
    Ok(t.to_device(&Device::Cpu)?
        .to_dtype(DType::F32)?
        .mean_all()?
        .to_scalar::<f32>()?)
}
