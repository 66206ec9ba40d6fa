//! Interface of policies trained with behavioral cloning.
mod mlp_policy;
use anyhow::Result;
use border_core::{ActionSpace, BehaviorSpec};
use candle_core::{Device, Tensor, Var};
pub use mlp_policy::{MlpPolicy, MlpPolicyConfig};

/// Inputs of [`BcPolicy::sample_actions`].
#[derive(Clone, Debug)]
pub struct PolicyInput {
    /// Vector observations, each of shape `[batch_size, obs_size]`.
    pub vector_obs: Vec<Tensor>,

    /// Visual observations, one `[batch_size, height, width, channels]` tensor per visual encoder.
    pub visual_obs: Vec<Tensor>,

    /// Action masks of shape `[batch_size, total_branch_size]`, discrete actions only.
    pub masks: Option<Tensor>,

    /// Recurrent memories of shape `[1, n_sequences, memory_size]`.
    pub memories: Option<Tensor>,

    /// Number of consecutive steps forming a sequence.
    pub seq_len: usize,
}

/// Outputs of [`BcPolicy::sample_actions`].
#[derive(Clone, Debug)]
pub struct PolicyOutput {
    /// Sampled actions.
    ///
    /// Shape `[batch_size, action_size]` for continuous actions. For discrete actions,
    /// `[batch_size, num_branches]` holding the index of the chosen action of each branch.
    pub actions: Tensor,

    /// Log-probabilities.
    ///
    /// For discrete actions sampled with `all_log_probs = true`, these are the
    /// log-probabilities of every action of every branch, concatenated along the last
    /// dimension (`[batch_size, total_branch_size]`).
    pub log_probs: Tensor,

    /// Entropies of the action distribution, `[batch_size]`.
    pub entropies: Tensor,

    /// Value estimates, if the policy has a value head.
    pub values: Option<Tensor>,

    /// Updated recurrent memories.
    pub memories: Option<Tensor>,
}

/// A policy whose parameters can be trained with behavioral cloning.
///
/// The policy is shared with the RL algorithm that owns it. [`BcModule`] binds its
/// optimizer to [`BcPolicy::trainable_vars`] and updates them in place.
///
/// [`BcModule`]: crate::bc::BcModule
pub trait BcPolicy {
    /// Observation and action spec of the policy.
    fn behavior_spec(&self) -> &BehaviorSpec;

    /// Action space of the policy.
    fn action_space(&self) -> &ActionSpace {
        &self.behavior_spec().action_space
    }

    /// Number of consecutive steps treated as one recurrent unit, 1 for feed-forward policies.
    fn sequence_length(&self) -> usize;

    /// Returns `true` if the policy carries recurrent memories.
    fn use_recurrent(&self) -> bool;

    /// Number of visual encoders; 0 if the policy does not consume visual observations.
    fn num_visual_encoders(&self) -> usize;

    /// Returns `true` if the policy consumes visual observations.
    fn use_visual_obs(&self) -> bool {
        self.num_visual_encoders() > 0
    }

    /// Device on which the policy runs.
    fn device(&self) -> &Device;

    /// Trainable variables of the policy.
    fn trainable_vars(&self) -> Vec<Var>;

    /// Samples actions.
    ///
    /// If `all_log_probs` is `true`, [`PolicyOutput::log_probs`] holds the
    /// log-probabilities of all actions instead of those of the sampled ones.
    fn sample_actions(&self, input: &PolicyInput, all_log_probs: bool) -> Result<PolicyOutput>;
}
