//! Mini-batch of expert transitions.

/// A contiguous slice of a [`DemoBuffer`](super::DemoBuffer).
///
/// Fields are stored row-wise, one row per step. `visual_obs` has one entry per
/// visual encoder and `memory` is empty when no memories were recorded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DemoBatch {
    /// Vector observations.
    pub vector_obs: Vec<Vec<f32>>,

    /// Visual observations, indexed by encoder and then by step.
    pub visual_obs: Vec<Vec<Vec<f32>>>,

    /// Expert actions.
    pub actions: Vec<Vec<f32>>,

    /// Recurrent memories.
    pub memory: Vec<Vec<f32>>,

    /// Index of the episode each step was recorded in.
    pub episode: Vec<usize>,
}

impl DemoBatch {
    /// Number of steps in the batch.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` if the batch has no steps.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Visual observations of the `k`-th encoder.
    pub fn visual_obs(&self, k: usize) -> Option<&[Vec<f32>]> {
        self.visual_obs.get(k).map(|v| v.as_slice())
    }
}
