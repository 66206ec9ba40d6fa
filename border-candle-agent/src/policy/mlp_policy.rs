//! Feed-forward policy built on [`Mlp`].
use super::{BcPolicy, PolicyInput, PolicyOutput};
use crate::{
    mlp::{Mlp, MlpConfig},
    model::SubModel1,
    util::break_into_branches,
};
use anyhow::{Context, Result};
use border_core::{error::BorderError, ActionSpace, BehaviorSpec};
use candle_core::{DType, Device, Tensor, Var, D};
use candle_nn::{init::Init, ops::log_softmax, VarBuilder, VarMap};
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// `0.5 * ln(2 * pi)`
const LOG_SQRT_2PI: f64 = 0.918_938_533_204_672_7;

fn default_units() -> Vec<usize> {
    vec![64, 64]
}

/// Configuration of [`MlpPolicy`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct MlpPolicyConfig {
    /// Spec of observations and actions.
    pub behavior_spec: BehaviorSpec,

    /// Units of the hidden layers.
    #[serde(default = "default_units")]
    pub units: Vec<usize>,

    /// Initial value of the log standard deviation of continuous actions.
    #[serde(default)]
    pub log_std_init: f64,
}

impl MlpPolicyConfig {
    /// Creates a configuration with two hidden layers of 64 units.
    pub fn new(behavior_spec: BehaviorSpec) -> Self {
        Self {
            behavior_spec,
            units: default_units(),
            log_std_init: 0.0,
        }
    }

    /// Sets units of the hidden layers.
    pub fn units(mut self, units: Vec<usize>) -> Self {
        self.units = units;
        self
    }

    /// Sets the initial log standard deviation.
    pub fn log_std_init(mut self, v: f64) -> Self {
        self.log_std_init = v;
        self
    }

    /// Loads [`MlpPolicyConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let c = serde_yaml::from_reader(rdr)?;
        Ok(c)
    }

    /// Saves [`MlpPolicyConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Feed-forward policy for vector observations.
///
/// Continuous actions are sampled from a Gaussian whose mean is the output of the MLP
/// and whose log standard deviation is a state-independent parameter. Discrete actions
/// are the argmax of the per-branch logits.
pub struct MlpPolicy {
    config: MlpPolicyConfig,
    device: Device,
    varmap: VarMap,
    mlp: Mlp,

    /// `[1, action_size]`, continuous actions only.
    log_std: Option<Tensor>,
}

impl MlpPolicy {
    /// Constructs [`MlpPolicy`].
    pub fn build(config: MlpPolicyConfig, device: Device) -> Result<Self> {
        let spec = &config.behavior_spec;
        if !spec.visual_obs_shapes.is_empty() {
            return Err(BorderError::Configuration(
                "MlpPolicy does not support visual observations".into(),
            )
            .into());
        }

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let mlp_config = MlpConfig::new(
            spec.vector_obs_size,
            config.units.clone(),
            spec.action_space.output_dim(),
            false,
        );
        let mlp = Mlp::build(vb.clone(), mlp_config)?;
        let log_std = match &spec.action_space {
            ActionSpace::Continuous(n) => Some(vb.get_with_hints(
                (1, *n),
                "log_std",
                Init::Const(config.log_std_init),
            )?),
            ActionSpace::Discrete(_) => None,
        };

        Ok(Self {
            config,
            device,
            varmap,
            mlp,
            log_std,
        })
    }

    /// Variables of the policy.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Saves the parameters.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save mlp policy to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads the parameters.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load mlp policy from {:?}", path.as_ref());
        Ok(())
    }

    fn sample_continuous(&self, mean: Tensor) -> Result<PolicyOutput> {
        let log_std = self
            .log_std
            .as_ref()
            .context("log_std is not built for continuous actions")?
            .broadcast_as(mean.shape())?;
        let eps = mean.randn_like(0.0, 1.0)?;
        let actions = (&mean + (log_std.exp()? * &eps)?)?;
        let log_probs = (((eps.sqr()? * -0.5)? - &log_std)? - LOG_SQRT_2PI)?;
        let entropies = (log_std + (0.5 + LOG_SQRT_2PI))?.sum(D::Minus1)?;

        Ok(PolicyOutput {
            actions,
            log_probs,
            entropies,
            values: None,
            memories: None,
        })
    }

    fn sample_discrete(
        &self,
        logits: Tensor,
        branch_sizes: &[usize],
        masks: Option<&Tensor>,
        all_log_probs: bool,
    ) -> Result<PolicyOutput> {
        let logits = match masks {
            Some(m) => {
                let m = m.to_device(&self.device)?;
                (logits + ((m - 1.0)? * 1e8)?)?
            }
            None => logits,
        };

        let mut actions = vec![];
        let mut log_probs = vec![];
        let mut selected = vec![];
        let mut entropies = vec![];
        for branch in break_into_branches(&logits, branch_sizes)?.iter() {
            let lp = log_softmax(branch, D::Minus1)?;
            let a = lp.argmax_keepdim(D::Minus1)?;
            selected.push(lp.gather(&a, D::Minus1)?);
            entropies.push((lp.exp()? * &lp)?.sum(D::Minus1)?.neg()?);
            actions.push(a.to_dtype(DType::F32)?);
            log_probs.push(lp);
        }

        let log_probs = match all_log_probs {
            true => Tensor::cat(&log_probs, 1)?,
            false => Tensor::cat(&selected, 1)?,
        };

        Ok(PolicyOutput {
            actions: Tensor::cat(&actions, 1)?,
            log_probs,
            entropies: Tensor::stack(&entropies, 0)?.sum(0)?,
            values: None,
            memories: None,
        })
    }
}

impl BcPolicy for MlpPolicy {
    fn behavior_spec(&self) -> &BehaviorSpec {
        &self.config.behavior_spec
    }

    fn sequence_length(&self) -> usize {
        1
    }

    fn use_recurrent(&self) -> bool {
        false
    }

    fn num_visual_encoders(&self) -> usize {
        0
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn trainable_vars(&self) -> Vec<Var> {
        self.varmap.all_vars()
    }

    fn sample_actions(&self, input: &PolicyInput, all_log_probs: bool) -> Result<PolicyOutput> {
        if input.vector_obs.is_empty() {
            return Err(BorderError::Configuration("no vector observation is given".into()).into());
        }
        let obs = Tensor::cat(&input.vector_obs, 1)?;
        let out = self.mlp.forward(&obs)?;

        match &self.config.behavior_spec.action_space {
            ActionSpace::Continuous(_) => self.sample_continuous(out),
            ActionSpace::Discrete(branch_sizes) => {
                self.sample_discrete(out, branch_sizes, input.masks.as_ref(), all_log_probs)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn input(batch_size: usize, obs_size: usize) -> Result<PolicyInput> {
        Ok(PolicyInput {
            vector_obs: vec![Tensor::ones((batch_size, obs_size), DType::F32, &Device::Cpu)?],
            visual_obs: vec![],
            masks: None,
            memories: None,
            seq_len: 1,
        })
    }

    #[test]
    fn test_continuous_sample() -> Result<()> {
        let spec = BehaviorSpec::new(3, ActionSpace::Continuous(2));
        let policy = MlpPolicy::build(MlpPolicyConfig::new(spec).units(vec![16]), Device::Cpu)?;
        let out = policy.sample_actions(&input(4, 3)?, true)?;
        assert_eq!(out.actions.dims(), &[4, 2]);
        assert_eq!(out.log_probs.dims(), &[4, 2]);
        assert_eq!(out.entropies.dims(), &[4]);
        // 2 linear layers and log_std
        assert_eq!(policy.trainable_vars().len(), 5);
        Ok(())
    }

    #[test]
    fn test_discrete_sample() -> Result<()> {
        let spec = BehaviorSpec::new(3, ActionSpace::Discrete(vec![2, 3]));
        let policy = MlpPolicy::build(MlpPolicyConfig::new(spec), Device::Cpu)?;

        let out = policy.sample_actions(&input(4, 3)?, true)?;
        assert_eq!(out.actions.dims(), &[4, 2]);
        assert_eq!(out.log_probs.dims(), &[4, 5]);
        assert_eq!(out.entropies.dims(), &[4]);

        // Probabilities of each branch sum up to one.
        let p = out.log_probs.exp()?;
        let s: Vec<Vec<f32>> = break_into_branches(&p, &[2, 3])?[1].sum_keepdim(1)?.to_vec2()?;
        assert!(s.iter().all(|v| (v[0] - 1.0).abs() < 1e-5));

        let out = policy.sample_actions(&input(4, 3)?, false)?;
        assert_eq!(out.log_probs.dims(), &[4, 2]);
        Ok(())
    }

    #[test]
    fn test_visual_obs_is_rejected() {
        let spec = BehaviorSpec::new(3, ActionSpace::Continuous(2)).visual_obs([8, 8, 3]);
        assert!(MlpPolicy::build(MlpPolicyConfig::new(spec), Device::Cpu).is_err());
    }
}
