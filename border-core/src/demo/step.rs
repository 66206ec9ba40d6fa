//! Recorded steps and episodes.
use crate::{error::BorderError, ActionSpace, BehaviorSpec};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A single recorded step of an expert.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DemoStep {
    /// Vector observation.
    pub vector_obs: Vec<f32>,

    /// Visual observations, one flattened `[height, width, channels]` array per encoder.
    #[serde(default)]
    pub visual_obs: Vec<Vec<f32>>,

    /// Action taken by the expert.
    ///
    /// Discrete actions are stored as the index of the chosen action of each branch.
    pub action: Vec<f32>,

    /// Recurrent memory of the expert at this step. Empty if not recorded.
    #[serde(default)]
    pub memory: Vec<f32>,
}

impl DemoStep {
    /// Creates a step with vector observation and action only.
    pub fn new(vector_obs: Vec<f32>, action: Vec<f32>) -> Self {
        Self {
            vector_obs,
            visual_obs: vec![],
            action,
            memory: vec![],
        }
    }

    /// Sets visual observations.
    pub fn visual_obs(mut self, visual_obs: Vec<Vec<f32>>) -> Self {
        self.visual_obs = visual_obs;
        self
    }

    /// Sets recurrent memory.
    pub fn memory(mut self, memory: Vec<f32>) -> Self {
        self.memory = memory;
        self
    }

    /// A step filled with zeros, used to pad episodes.
    pub(super) fn zeros(spec: &BehaviorSpec, memory_size: usize) -> Self {
        Self {
            vector_obs: vec![0.0; spec.vector_obs_size],
            visual_obs: spec
                .visual_obs_shapes
                .iter()
                .map(|s| vec![0.0; s.iter().product()])
                .collect(),
            action: vec![0.0; spec.action_space.action_dim()],
            memory: vec![0.0; memory_size],
        }
    }

    /// Checks that the step fits `spec` and carries `memory_size` memory values.
    pub(super) fn check(&self, spec: &BehaviorSpec, memory_size: usize) -> Result<()> {
        if self.vector_obs.len() != spec.vector_obs_size {
            return Err(BorderError::shape_mismatch(
                "vector_obs",
                spec.vector_obs_size,
                self.vector_obs.len(),
            )
            .into());
        }

        if self.visual_obs.len() != spec.visual_obs_shapes.len() {
            return Err(BorderError::shape_mismatch(
                "visual_obs",
                spec.visual_obs_shapes.len(),
                self.visual_obs.len(),
            )
            .into());
        }
        for (k, obs) in self.visual_obs.iter().enumerate() {
            let expected = spec.visual_obs_len(k).unwrap_or(0);
            if obs.len() != expected {
                return Err(BorderError::shape_mismatch(
                    format!("visual_obs{}", k),
                    expected,
                    obs.len(),
                )
                .into());
            }
        }

        let action_dim = spec.action_space.action_dim();
        if self.action.len() != action_dim {
            return Err(BorderError::shape_mismatch("actions", action_dim, self.action.len()).into());
        }
        if let ActionSpace::Discrete(branches) = &spec.action_space {
            for (a, &n) in self.action.iter().zip(branches.iter()) {
                if *a < 0.0 || a.fract() != 0.0 || *a as usize >= n {
                    return Err(BorderError::DemoLoad(format!(
                        "discrete action {} is not a valid index for a branch of size {}",
                        a, n
                    ))
                    .into());
                }
            }
        }

        if self.memory.len() != memory_size {
            return Err(BorderError::shape_mismatch("memory", memory_size, self.memory.len()).into());
        }

        Ok(())
    }
}

/// Steps of a single recorded episode, in time order.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct DemoEpisode {
    /// Steps of the episode.
    pub steps: Vec<DemoStep>,
}

impl DemoEpisode {
    /// Creates an episode.
    pub fn new(steps: Vec<DemoStep>) -> Self {
        Self { steps }
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the episode has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
