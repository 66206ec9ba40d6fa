//! Buffer of expert transitions.
use super::{DemoBatch, DemoEpisode, DemoStep};
use crate::{error::BorderError, BehaviorSpec};
use anyhow::Result;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Sequence-aligned store of expert transitions.
///
/// Each episode occupies a whole number of sequences: episodes are padded at the front
/// with zero steps when they are pushed, so every block of `sequence_length` steps
/// starting at a multiple of `sequence_length` comes from a single episode. Shuffling
/// moves whole blocks, which keeps recurrent memories continuous within a sequence.
///
/// The number of experiences is fixed once the buffer is built.
#[derive(Clone, Debug)]
pub struct DemoBuffer {
    vector_obs: Vec<Vec<f32>>,

    /// Indexed by encoder and then by step.
    visual_obs: Vec<Vec<Vec<f32>>>,

    actions: Vec<Vec<f32>>,

    /// Empty when no memories were recorded.
    memory: Vec<Vec<f32>>,

    episode: Vec<usize>,

    rng: StdRng,
}

impl DemoBuffer {
    /// Builds a buffer from recorded episodes.
    ///
    /// Every step is checked against `spec`. Steps must either all carry memories of
    /// the same size or none at all. Empty episodes are skipped.
    pub fn from_episodes(
        episodes: &[DemoEpisode],
        sequence_length: usize,
        spec: &BehaviorSpec,
    ) -> Result<Self> {
        if sequence_length == 0 {
            return Err(BorderError::Configuration("sequence_length must be positive".into()).into());
        }

        let memory_size = episodes
            .iter()
            .find_map(|ep| ep.steps.first())
            .map(|step| step.memory.len())
            .unwrap_or(0);
        let mut buffer = Self {
            vector_obs: vec![],
            visual_obs: vec![vec![]; spec.visual_obs_shapes.len()],
            actions: vec![],
            memory: vec![],
            episode: vec![],
            rng: StdRng::seed_from_u64(42),
        };
        let padding = DemoStep::zeros(spec, memory_size);

        for (ix, ep) in episodes.iter().enumerate() {
            if ep.is_empty() {
                continue;
            }
            for step in ep.steps.iter() {
                step.check(spec, memory_size)?;
            }

            let n_pad = (sequence_length - ep.len() % sequence_length) % sequence_length;
            for _ in 0..n_pad {
                buffer.push_step(&padding, ix);
            }
            for step in ep.steps.iter() {
                buffer.push_step(step, ix);
            }
        }

        log::debug!(
            "Built demonstration buffer: {} experiences from {} episodes",
            buffer.num_experiences(),
            episodes.len()
        );

        Ok(buffer)
    }

    fn push_step(&mut self, step: &DemoStep, episode: usize) {
        self.vector_obs.push(step.vector_obs.clone());
        for (k, obs) in step.visual_obs.iter().enumerate() {
            self.visual_obs[k].push(obs.clone());
        }
        self.actions.push(step.action.clone());
        if !step.memory.is_empty() {
            self.memory.push(step.memory.clone());
        }
        self.episode.push(episode);
    }

    /// Reseeds the random number generator used in [`DemoBuffer::shuffle`].
    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Number of transitions in the buffer, including padding.
    pub fn num_experiences(&self) -> usize {
        self.actions.len()
    }

    /// Size of the recorded memories, 0 if there are none.
    pub fn memory_size(&self) -> usize {
        self.memory.first().map(|m| m.len()).unwrap_or(0)
    }

    /// Index of the recorded episode of each transition.
    pub fn episode_ids(&self) -> &[usize] {
        &self.episode
    }

    /// Shuffles the buffer in place, moving blocks of `sequence_length` transitions.
    ///
    /// The order of transitions inside a block is preserved. A trailing partial block,
    /// if any, stays at the end.
    pub fn shuffle(&mut self, sequence_length: usize) {
        if sequence_length == 0 {
            return;
        }
        let n_seqs = self.num_experiences() / sequence_length;
        let mut perm: Vec<usize> = (0..n_seqs).collect();
        perm.shuffle(&mut self.rng);

        permute_blocks(&mut self.vector_obs, &perm, sequence_length);
        for obs in self.visual_obs.iter_mut() {
            permute_blocks(obs, &perm, sequence_length);
        }
        permute_blocks(&mut self.actions, &perm, sequence_length);
        permute_blocks(&mut self.memory, &perm, sequence_length);
        permute_blocks(&mut self.episode, &perm, sequence_length);
    }

    /// Copies transitions in `[start, end)` into a mini-batch.
    ///
    /// Indices past the end of the buffer are clamped.
    pub fn make_mini_batch(&self, start: usize, end: usize) -> DemoBatch {
        let end = end.min(self.num_experiences());
        let start = start.min(end);

        DemoBatch {
            vector_obs: self.vector_obs[start..end].to_vec(),
            visual_obs: self
                .visual_obs
                .iter()
                .map(|obs| obs[start..end].to_vec())
                .collect(),
            actions: self.actions[start..end].to_vec(),
            memory: match self.memory.is_empty() {
                true => vec![],
                false => self.memory[start..end].to_vec(),
            },
            episode: self.episode[start..end].to_vec(),
        }
    }
}

fn permute_blocks<T: Clone>(v: &mut Vec<T>, perm: &[usize], block: usize) {
    if v.is_empty() {
        return;
    }
    let mut out = Vec::with_capacity(v.len());
    for &p in perm.iter() {
        out.extend_from_slice(&v[p * block..(p + 1) * block]);
    }
    out.extend_from_slice(&v[perm.len() * block..]);
    *v = out;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ActionSpace;

    fn episode(id: f32, len: usize) -> DemoEpisode {
        DemoEpisode::new(
            (0..len)
                .map(|t| DemoStep::new(vec![id, t as f32 + 1.0], vec![0.0]))
                .collect(),
        )
    }

    fn spec() -> BehaviorSpec {
        BehaviorSpec::new(2, ActionSpace::Discrete(vec![2]))
    }

    #[test]
    fn test_episodes_are_padded_to_sequence_length() -> Result<()> {
        let episodes = vec![episode(0.0, 3), episode(1.0, 4), episode(2.0, 1)];
        let buffer = DemoBuffer::from_episodes(&episodes, 4, &spec())?;
        assert_eq!(buffer.num_experiences(), 12);

        let batch = buffer.make_mini_batch(0, 4);
        assert_eq!(batch.vector_obs[0], vec![0.0, 0.0]);
        assert_eq!(batch.vector_obs[1], vec![0.0, 1.0]);
        assert_eq!(batch.episode, vec![0, 0, 0, 0]);

        let batch = buffer.make_mini_batch(8, 12);
        assert_eq!(batch.vector_obs[3], vec![2.0, 1.0]);
        assert_eq!(batch.episode, vec![2, 2, 2, 2]);
        Ok(())
    }

    #[test]
    fn test_shuffle_preserves_sequences() -> Result<()> {
        let seq_len = 3;
        let episodes: Vec<_> = (0..8).map(|i| episode(i as f32, 2 + i % 4)).collect();
        let mut buffer = DemoBuffer::from_episodes(&episodes, seq_len, &spec())?;
        let before = buffer.make_mini_batch(0, buffer.num_experiences());

        for _ in 0..5 {
            buffer.shuffle(seq_len);
            let after = buffer.make_mini_batch(0, buffer.num_experiences());
            assert_eq!(after.len(), before.len());

            let blocks = after.vector_obs.chunks(seq_len).zip(after.episode.chunks(seq_len));
            for (obs, ep) in blocks {
                assert!(ep.iter().all(|e| *e == ep[0]));

                // Padding rows have a zero time index; recorded rows stay in order.
                let recorded: Vec<_> = obs.iter().filter(|o| o[1] > 0.0).collect();
                assert!(recorded.iter().all(|o| o[0] == ep[0] as f32));
                assert!(recorded.windows(2).all(|w| w[1][1] == w[0][1] + 1.0));
            }
        }
        Ok(())
    }

    #[test]
    fn test_make_mini_batch_clamps() -> Result<()> {
        let buffer = DemoBuffer::from_episodes(&[episode(0.0, 4)], 2, &spec())?;
        assert_eq!(buffer.make_mini_batch(2, 100).len(), 2);
        assert!(buffer.make_mini_batch(10, 12).is_empty());
        Ok(())
    }

    #[test]
    fn test_memories_and_visual_obs() -> Result<()> {
        let spec = BehaviorSpec::new(1, ActionSpace::Continuous(2)).visual_obs([1, 2, 1]);
        let steps = (0..3)
            .map(|t| {
                DemoStep::new(vec![t as f32], vec![0.1, 0.2])
                    .visual_obs(vec![vec![t as f32, -(t as f32)]])
                    .memory(vec![t as f32; 4])
            })
            .collect();
        let buffer = DemoBuffer::from_episodes(&[DemoEpisode::new(steps)], 2, &spec)?;
        assert_eq!(buffer.num_experiences(), 4);
        assert_eq!(buffer.memory_size(), 4);

        let batch = buffer.make_mini_batch(0, 4);
        assert_eq!(batch.memory.len(), 4);
        assert_eq!(batch.visual_obs(0).unwrap()[3], vec![2.0, -2.0]);
        assert!(batch.visual_obs(1).is_none());
        Ok(())
    }

    #[test]
    fn test_rejects_mismatched_steps() {
        let bad_obs = DemoEpisode::new(vec![DemoStep::new(vec![0.0], vec![0.0])]);
        let err = DemoBuffer::from_episodes(&[bad_obs], 1, &spec()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BorderError>(),
            Some(BorderError::DemoShapeMismatch { .. })
        ));

        let bad_act = DemoEpisode::new(vec![DemoStep::new(vec![0.0, 0.0], vec![2.0])]);
        let err = DemoBuffer::from_episodes(&[bad_act], 1, &spec()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BorderError>(),
            Some(BorderError::DemoLoad(_))
        ));
    }
}
