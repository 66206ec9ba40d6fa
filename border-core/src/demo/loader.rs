//! Loading demonstrations from files.
use super::{DemoBuffer, DemoEpisode};
use crate::{error::BorderError, BehaviorSpec};
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Summary of a set of recorded demonstrations.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct DemoMetadata {
    /// Name of the behavior the demonstrations were recorded for.
    pub behavior_name: String,

    /// Number of recorded episodes.
    pub num_episodes: usize,

    /// Number of recorded steps, without padding.
    pub num_steps: usize,
}

/// Loads demonstrations into a [`DemoBuffer`].
pub trait DemoLoader {
    /// Loads the demonstrations at `path`.
    ///
    /// The returned buffer is aligned to `sequence_length`. Implementations must fail
    /// if the demonstrations do not match `spec`.
    fn load(
        &self,
        path: &Path,
        sequence_length: usize,
        spec: &BehaviorSpec,
    ) -> Result<(DemoMetadata, DemoBuffer)>;
}

/// Contents of a demonstration file.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DemoFile {
    /// Summary of the episodes.
    pub metadata: DemoMetadata,

    /// Spec the episodes were recorded with.
    pub behavior_spec: BehaviorSpec,

    /// Recorded episodes.
    pub episodes: Vec<DemoEpisode>,
}

impl DemoFile {
    /// Creates the contents of a demonstration file.
    pub fn new(
        behavior_name: impl Into<String>,
        behavior_spec: BehaviorSpec,
        episodes: Vec<DemoEpisode>,
    ) -> Self {
        let metadata = DemoMetadata {
            behavior_name: behavior_name.into(),
            num_episodes: episodes.len(),
            num_steps: episodes.iter().map(|ep| ep.len()).sum(),
        };
        Self {
            metadata,
            behavior_spec,
            episodes,
        }
    }

    /// Writes demonstrations in bincode format.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;
        info!(
            "Save {} demonstration episodes into {:?}",
            self.metadata.num_episodes,
            path.as_ref()
        );
        Ok(())
    }

    /// Reads demonstrations written by [`DemoFile::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| BorderError::DemoLoad(format!("{}: {}", path.display(), e)))?;
        let demo: Self = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| BorderError::DemoLoad(format!("{}: {}", path.display(), e)))?;

        let num_steps: usize = demo.episodes.iter().map(|ep| ep.len()).sum();
        if demo.metadata.num_episodes != demo.episodes.len() || demo.metadata.num_steps != num_steps
        {
            return Err(BorderError::DemoLoad(format!(
                "{}: metadata does not match the recorded episodes",
                path.display()
            ))
            .into());
        }

        Ok(demo)
    }
}

/// Loads demonstration files written by [`DemoFile::save`].
#[derive(Clone, Debug, Default)]
pub struct DemoFileLoader;

impl DemoLoader for DemoFileLoader {
    fn load(
        &self,
        path: &Path,
        sequence_length: usize,
        spec: &BehaviorSpec,
    ) -> Result<(DemoMetadata, DemoBuffer)> {
        let demo = DemoFile::load(path)?;
        if demo.behavior_spec != *spec {
            return Err(BorderError::shape_mismatch("behavior_spec", spec, &demo.behavior_spec).into());
        }
        let buffer = DemoBuffer::from_episodes(&demo.episodes, sequence_length, spec)?;
        info!(
            "Load {} demonstration steps of {} from {:?}",
            demo.metadata.num_steps, demo.metadata.behavior_name, path
        );

        Ok((demo.metadata, buffer))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{demo::DemoStep, ActionSpace};
    use tempdir::TempDir;

    fn demo_file(spec: &BehaviorSpec) -> DemoFile {
        let episodes = (0..3)
            .map(|i| {
                DemoEpisode::new(
                    (0..5)
                        .map(|t| DemoStep::new(vec![i as f32, t as f32], vec![0.5, -0.5]))
                        .collect(),
                )
            })
            .collect();
        DemoFile::new("expert", spec.clone(), episodes)
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let spec = BehaviorSpec::new(2, ActionSpace::Continuous(2));
        let dir = TempDir::new("demo_loader")?;
        let path = dir.path().join("expert.demo");
        demo_file(&spec).save(&path)?;

        let (metadata, buffer) = DemoFileLoader.load(&path, 2, &spec)?;
        assert_eq!(metadata.behavior_name, "expert");
        assert_eq!(metadata.num_episodes, 3);
        assert_eq!(metadata.num_steps, 15);
        assert_eq!(buffer.num_experiences(), 18);
        Ok(())
    }

    #[test]
    fn test_spec_mismatch() -> Result<()> {
        let spec = BehaviorSpec::new(2, ActionSpace::Continuous(2));
        let dir = TempDir::new("demo_loader")?;
        let path = dir.path().join("expert.demo");
        demo_file(&spec).save(&path)?;

        let other = BehaviorSpec::new(2, ActionSpace::Discrete(vec![2, 2]));
        let err = DemoFileLoader.load(&path, 1, &other).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BorderError>(),
            Some(BorderError::DemoShapeMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_missing_or_corrupt_file() -> Result<()> {
        let spec = BehaviorSpec::new(2, ActionSpace::Continuous(2));
        let dir = TempDir::new("demo_loader")?;

        let err = DemoFileLoader
            .load(&dir.path().join("missing.demo"), 1, &spec)
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<BorderError>(), Some(BorderError::DemoLoad(_))));

        let path = dir.path().join("corrupt.demo");
        File::create(&path)?.write_all(b"bad")?;
        let err = DemoFileLoader.load(&path, 1, &spec).unwrap_err();
        assert!(matches!(err.downcast_ref::<BorderError>(), Some(BorderError::DemoLoad(_))));
        Ok(())
    }
}
