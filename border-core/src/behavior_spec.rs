//! Observation and action specification of a behavior.
use serde::{Deserialize, Serialize};

/// Action space of a behavior.
///
/// The variant is resolved once when a policy is built. Code consuming actions
/// matches on it instead of querying flags of the policy.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub enum ActionSpace {
    /// Continuous action with the given number of dimensions.
    Continuous(usize),

    /// Multi-discrete action. Each element is the number of choices of a branch.
    Discrete(Vec<usize>),
}

impl ActionSpace {
    /// Returns `true` for continuous action spaces.
    pub fn is_continuous(&self) -> bool {
        matches!(self, Self::Continuous(_))
    }

    /// Number of values stored per step in an action record.
    ///
    /// For discrete actions this is the number of branches, as each branch
    /// is stored as the index of the chosen action.
    pub fn action_dim(&self) -> usize {
        match self {
            Self::Continuous(n) => *n,
            Self::Discrete(branches) => branches.len(),
        }
    }

    /// Sizes of the discrete branches. Empty for continuous actions.
    pub fn branch_sizes(&self) -> &[usize] {
        match self {
            Self::Continuous(_) => &[],
            Self::Discrete(branches) => branches.as_slice(),
        }
    }

    /// Sum of the sizes of all discrete branches.
    ///
    /// This is the width of action masks and of the concatenated log-probabilities.
    pub fn total_branch_size(&self) -> usize {
        self.branch_sizes().iter().sum()
    }

    /// Width of the output of a policy for this action space.
    pub fn output_dim(&self) -> usize {
        match self {
            Self::Continuous(n) => *n,
            Self::Discrete(_) => self.total_branch_size(),
        }
    }
}

/// Specification of observations and actions of a behavior.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct BehaviorSpec {
    /// Size of the vector observation.
    pub vector_obs_size: usize,

    /// Shapes of visual observations as `[height, width, channels]`, one per visual encoder.
    #[serde(default)]
    pub visual_obs_shapes: Vec<[usize; 3]>,

    /// Action space.
    pub action_space: ActionSpace,
}

impl BehaviorSpec {
    /// Creates a spec with vector observations only.
    pub fn new(vector_obs_size: usize, action_space: ActionSpace) -> Self {
        Self {
            vector_obs_size,
            visual_obs_shapes: vec![],
            action_space,
        }
    }

    /// Adds a visual observation of shape `[height, width, channels]`.
    pub fn visual_obs(mut self, shape: [usize; 3]) -> Self {
        self.visual_obs_shapes.push(shape);
        self
    }

    /// Number of `f32` values of the `k`-th visual observation.
    pub fn visual_obs_len(&self, k: usize) -> Option<usize> {
        self.visual_obs_shapes.get(k).map(|s| s.iter().product())
    }
}
