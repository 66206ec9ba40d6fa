//! Behavioral cloning losses.
use crate::util::break_into_branches;
use anyhow::Result;
use candle_core::Tensor;
use candle_nn::{loss::mse, ops::log_softmax};

/// Expert actions of a mini-batch, converted for the loss of the action space.
#[derive(Clone, Debug)]
pub enum ExpertActions {
    /// Continuous actions, `[batch_size, action_size]`.
    Continuous(Tensor),

    /// One-hot encoded discrete actions, one `[batch_size, branch_size]` tensor per branch.
    Discrete(Vec<Tensor>),
}

/// BC loss of continuous actions: mean squared error between sampled and expert actions.
pub fn continuous_bc_loss(selected_actions: &Tensor, expert_actions: &Tensor) -> Result<Tensor> {
    Ok(mse(selected_actions, expert_actions)?)
}

/// BC loss of discrete actions.
///
/// `log_probs` are the log-probabilities of all actions, concatenated over branches.
/// For each branch the loss is `-log_softmax(log_probs_branch) * expert_onehot_branch`,
/// with the softmax taken over the batch dimension. The result is the mean over the
/// elements of each branch, averaged over branches.
pub fn discrete_bc_loss(
    log_probs: &Tensor,
    branch_sizes: &[usize],
    expert_actions: &[Tensor],
) -> Result<Tensor> {
    let branches = break_into_branches(log_probs, branch_sizes)?;
    let losses = branches
        .iter()
        .zip(expert_actions.iter())
        .map(|(lp, expert)| Ok((log_softmax(lp, 0)?.neg()? * expert)?.mean_all()?))
        .collect::<Result<Vec<Tensor>>>()?;

    Ok(Tensor::stack(&losses, 0)?.mean_all()?)
}

/// Computes the BC loss for the given expert actions.
pub fn behavioral_cloning_loss(
    selected_actions: &Tensor,
    log_probs: &Tensor,
    branch_sizes: &[usize],
    expert_actions: &ExpertActions,
) -> Result<Tensor> {
    match expert_actions {
        ExpertActions::Continuous(expert) => continuous_bc_loss(selected_actions, expert),
        ExpertActions::Discrete(expert) => discrete_bc_loss(log_probs, branch_sizes, expert),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_continuous_bc_loss() -> Result<()> {
        let selected = Tensor::new(&[[0.5f32, -1.0], [2.0, 0.0]], &Device::Cpu)?;
        let expert = Tensor::new(&[[1.0f32, -1.0], [0.0, 0.5]], &Device::Cpu)?;
        let loss = continuous_bc_loss(&selected, &expert)?.to_scalar::<f32>()?;

        // (0.25 + 0 + 4 + 0.25) / 4
        assert!((loss - 1.125).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_discrete_bc_loss_single_branch() -> Result<()> {
        let lp = [[-0.2f32, -1.7], [-1.2, -0.4]];
        let log_probs = Tensor::new(&lp, &Device::Cpu)?;
        let expert = Tensor::new(&[[1f32, 0.0], [0.0, 1.0]], &Device::Cpu)?;
        let loss = discrete_bc_loss(&log_probs, &[2], &[expert])?.to_scalar::<f32>()?;

        // log_softmax over the batch dimension, column by column
        let lse0 = (lp[0][0].exp() + lp[1][0].exp()).ln();
        let lse1 = (lp[0][1].exp() + lp[1][1].exp()).ln();
        let expected = (-(lp[0][0] - lse0) - (lp[1][1] - lse1)) / 4.0;
        assert!((loss - expected).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_discrete_bc_loss_averages_branches() -> Result<()> {
        let log_probs = Tensor::new(&[[-0.1f32, -2.3, -0.5, -1.0, -3.0]], &Device::Cpu)?;
        let expert = vec![
            Tensor::new(&[[0f32, 1.0]], &Device::Cpu)?,
            Tensor::new(&[[0f32, 0.0, 1.0]], &Device::Cpu)?,
        ];
        let loss = discrete_bc_loss(&log_probs, &[2, 3], &expert)?.to_scalar::<f32>()?;

        // With a batch of one, log_softmax over the batch is zero.
        assert!(loss.abs() < 1e-6);
        Ok(())
    }
}
