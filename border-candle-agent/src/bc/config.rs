//! Configuration of behavioral cloning (BC).
use crate::opt::OptimizerConfig;
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

fn default_strength() -> f64 {
    1.0
}

fn default_seed() -> u64 {
    42
}

/// Settings of [`BcModule`](super::BcModule).
///
/// `batch_size` and `num_epoch` fall back to the values of the RL trainer when they are
/// `None` or zero.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct BcSettings {
    /// Ratio of the learning rate of the policy used for BC updates.
    #[serde(default = "default_strength")]
    pub strength: f64,

    /// Path of the demonstration file.
    pub demo_path: PathBuf,

    /// Number of steps to anneal the BC learning rate to zero. 0 disables annealing.
    #[serde(default)]
    pub steps: usize,

    /// Batch size of BC updates.
    #[serde(default)]
    pub batch_size: Option<usize>,

    /// Number of passes over the demonstrations in an update.
    #[serde(default)]
    pub num_epoch: Option<usize>,

    /// Maximum number of samples used in an epoch. 0 means all demonstrations.
    #[serde(default)]
    pub samples_per_update: usize,

    /// Optimizer. Its learning rate is overwritten by the BC learning rate.
    #[serde(default)]
    pub opt_config: Option<OptimizerConfig>,

    /// Seed for shuffling demonstrations.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for BcSettings {
    fn default() -> Self {
        Self {
            strength: default_strength(),
            demo_path: PathBuf::new(),
            steps: 0,
            batch_size: None,
            num_epoch: None,
            samples_per_update: 0,
            opt_config: None,
            seed: default_seed(),
        }
    }
}

impl BcSettings {
    /// Creates settings for the given demonstration file.
    pub fn new(demo_path: impl Into<PathBuf>) -> Self {
        Self {
            demo_path: demo_path.into(),
            ..Default::default()
        }
    }

    /// Sets the strength.
    pub fn strength(mut self, v: f64) -> Self {
        self.strength = v;
        self
    }

    /// Sets the number of annealing steps.
    pub fn steps(mut self, v: usize) -> Self {
        self.steps = v;
        self
    }

    /// Sets batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = Some(v);
        self
    }

    /// Sets the number of epochs.
    pub fn num_epoch(mut self, v: usize) -> Self {
        self.num_epoch = Some(v);
        self
    }

    /// Sets the maximum number of samples per epoch.
    pub fn samples_per_update(mut self, v: usize) -> Self {
        self.samples_per_update = v;
        self
    }

    /// Sets optimizer.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = Some(v);
        self
    }

    /// Sets the seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Loads [`BcSettings`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load BC settings from {:?}", path_);
        Ok(b)
    }

    /// Saves [`BcSettings`] to YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save BC settings into {:?}", path_);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_defaults_from_yaml() -> Result<()> {
        let settings: BcSettings = serde_yaml::from_str("demo_path: expert.demo\n")?;
        assert_eq!(settings, BcSettings::new("expert.demo"));
        assert_eq!(settings.strength, 1.0);
        assert_eq!(settings.batch_size, None);
        Ok(())
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let dir = TempDir::new("bc_settings")?;
        let path = dir.path().join("bc.yaml");
        let settings = BcSettings::new("expert.demo")
            .strength(0.5)
            .steps(1000)
            .batch_size(64)
            .num_epoch(3)
            .samples_per_update(256)
            .opt_config(OptimizerConfig::Adam { lr: 1e-3 });
        settings.save(&path)?;
        assert_eq!(BcSettings::load(&path)?, settings);
        Ok(())
    }
}
