//! Behavioral cloning (BC) updater implemented with candle.
use super::{
    loss::{behavioral_cloning_loss, ExpertActions},
    BcSettings, LinearSchedule, LrSchedule,
};
use crate::{
    opt::{Optimizer, OptimizerConfig},
    policy::{BcPolicy, PolicyInput},
    util::{actions_to_onehot, rows_to_tensor, to_scalar_f32},
};
use anyhow::Result;
use border_core::{
    demo::{DemoBatch, DemoBuffer, DemoFileLoader, DemoLoader, DemoMetadata},
    error::BorderError,
    record::{Record, RecordValue},
    ActionSpace, BehaviorSpec,
};
use candle_core::{DType, Tensor, TensorId};
use log::{debug, info, trace, warn};
use std::{collections::HashSet, marker::PhantomData};

/// Key of the mean BC loss in the record returned by [`BcModule::update`].
pub const PRETRAINING_LOSS: &str = "Losses/Pretraining Loss";

/// Key of the BC learning rate in the record returned by [`BcModule::update`].
pub const PRETRAINING_LEARNING_RATE: &str = "Policy/Pretraining Learning Rate";

/// Behavioral cloning (BC) updater that runs inline with RL.
///
/// The updater owns an optimizer bound to the trainable variables of a policy and a
/// buffer of expert demonstrations. Each call of [`BcModule::update`] trains the policy
/// toward the expert actions for a number of epochs over the demonstrations.
///
/// The policy is not owned. [`BcModule::update`] borrows it mutably, so nothing else
/// can write its parameters during an update. It must be the policy the updater was
/// built with, as the optimizer holds that policy's variables. The ids of those
/// variables are kept to reject any other policy.
pub struct BcModule<P: BcPolicy> {
    opt: Optimizer,
    current_lr: f64,
    lr_schedule: Option<Box<dyn LrSchedule>>,
    demonstration_buffer: DemoBuffer,
    demo_metadata: DemoMetadata,
    behavior_spec: BehaviorSpec,
    var_ids: HashSet<TensorId>,
    sequence_length: usize,
    use_recurrent: bool,
    num_visual_encoders: usize,
    batch_size: usize,
    num_epoch: usize,
    n_sequences: usize,
    samples_per_update: usize,
    has_updated: bool,
    phantom: PhantomData<P>,
}

impl<P: BcPolicy> BcModule<P> {
    /// Constructs [`BcModule`], loading demonstrations with [`DemoFileLoader`].
    ///
    /// * `policy_learning_rate` - Initial learning rate of the policy. The BC learning
    ///   rate is this value times `settings.strength`.
    /// * `default_batch_size` - Batch size used if `settings.batch_size` is not given.
    /// * `default_num_epoch` - Number of epochs used if `settings.num_epoch` is not given.
    pub fn new(
        policy: &P,
        settings: &BcSettings,
        policy_learning_rate: f64,
        default_batch_size: usize,
        default_num_epoch: usize,
    ) -> Result<Self> {
        Self::with_loader(
            policy,
            settings,
            policy_learning_rate,
            default_batch_size,
            default_num_epoch,
            &DemoFileLoader,
        )
    }

    /// Constructs [`BcModule`], loading demonstrations with the given loader.
    pub fn with_loader(
        policy: &P,
        settings: &BcSettings,
        policy_learning_rate: f64,
        default_batch_size: usize,
        default_num_epoch: usize,
        loader: &dyn DemoLoader,
    ) -> Result<Self> {
        if !settings.strength.is_finite() {
            return Err(BorderError::Configuration(format!(
                "strength must be finite, got {}",
                settings.strength
            ))
            .into());
        }
        let sequence_length = policy.sequence_length();
        if sequence_length == 0 {
            return Err(BorderError::Configuration("sequence_length must be positive".into()).into());
        }

        let current_lr = policy_learning_rate * settings.strength;
        let vars = policy.trainable_vars();
        let var_ids = var_ids(&vars);
        let opt = settings
            .opt_config
            .clone()
            .unwrap_or_else(OptimizerConfig::default)
            .learning_rate(current_lr)
            .build(vars)?;

        let behavior_spec = policy.behavior_spec().clone();
        let (demo_metadata, mut demonstration_buffer) =
            loader.load(&settings.demo_path, sequence_length, &behavior_spec)?;
        demonstration_buffer.seed(settings.seed);

        let batch_size = settings
            .batch_size
            .filter(|&n| n > 0)
            .unwrap_or(default_batch_size);
        let num_epoch = settings
            .num_epoch
            .filter(|&n| n > 0)
            .unwrap_or(default_num_epoch);
        if batch_size == 0 {
            return Err(BorderError::Configuration("batch_size must be positive".into()).into());
        }

        let num_experiences = demonstration_buffer.num_experiences();
        let n_sequences = (batch_size.min(num_experiences) / sequence_length).max(1);

        let lr_schedule: Option<Box<dyn LrSchedule>> = match settings.steps {
            0 => None,
            steps => Some(Box::new(LinearSchedule::new(current_lr, 0.0, steps))),
        };

        info!(
            "BC: {} demonstration steps ({} experiences), lr = {}, batch_size = {}, num_epoch = {}, n_sequences = {}",
            demo_metadata.num_steps, num_experiences, current_lr, batch_size, num_epoch, n_sequences
        );

        Ok(Self {
            opt,
            current_lr,
            lr_schedule,
            demonstration_buffer,
            demo_metadata,
            behavior_spec,
            var_ids,
            sequence_length,
            use_recurrent: policy.use_recurrent(),
            num_visual_encoders: match policy.use_visual_obs() {
                true => policy.num_visual_encoders(),
                false => 0,
            },
            batch_size,
            num_epoch,
            n_sequences,
            samples_per_update: settings.samples_per_update,
            has_updated: false,
            phantom: PhantomData,
        })
    }

    /// Returns `true` once an update has run with a positive learning rate.
    pub fn has_updated(&self) -> bool {
        self.has_updated
    }

    /// Current learning rate of BC updates.
    pub fn current_lr(&self) -> f64 {
        self.current_lr
    }

    /// Resolved batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Resolved number of epochs per update.
    pub fn num_epoch(&self) -> usize {
        self.num_epoch
    }

    /// Number of sequences in a mini-batch.
    pub fn n_sequences(&self) -> usize {
        self.n_sequences
    }

    /// Metadata of the loaded demonstrations.
    pub fn demo_metadata(&self) -> &DemoMetadata {
        &self.demo_metadata
    }

    /// Demonstrations.
    pub fn demonstration_buffer(&self) -> &DemoBuffer {
        &self.demonstration_buffer
    }

    /// Sets the learning rate of BC updates.
    ///
    /// A non-positive value disables updates.
    pub fn set_learning_rate(&mut self, lr: f64) {
        self.current_lr = lr;
        self.opt.set_learning_rate(lr.max(0.0));
    }

    /// Replaces the learning rate schedule used by [`BcModule::anneal`].
    pub fn set_lr_schedule(&mut self, schedule: Option<Box<dyn LrSchedule>>) {
        self.lr_schedule = schedule;
    }

    /// Sets the learning rate from the schedule at `step` of the RL trainer.
    ///
    /// Does nothing if no schedule is set. Returns the current learning rate.
    pub fn anneal(&mut self, step: usize) -> f64 {
        if let Some(lr) = self.lr_schedule.as_ref().map(|s| s.value(step)) {
            self.set_learning_rate(lr);
        }
        self.current_lr
    }

    /// Ranges `[start, end)` of the mini-batches processed in an epoch.
    ///
    /// Both ends are multiples of the sequence length.
    pub fn mini_batch_bounds(&self) -> Vec<(usize, usize)> {
        let possible_batches = self.demonstration_buffer.num_experiences() / self.n_sequences;
        let max_batches = self.samples_per_update / self.n_sequences;
        let num_batches = match max_batches {
            0 => possible_batches,
            _ => possible_batches.min(max_batches),
        };
        let step = self.n_sequences * self.sequence_length;

        (0..num_batches / self.sequence_length)
            .map(|i| (i * step, (i + 1) * step))
            .collect()
    }

    /// Updates the policy with the demonstrations.
    ///
    /// Returns the mean loss over the processed mini-batches under [`PRETRAINING_LOSS`].
    /// If the learning rate is not positive, nothing is trained and the loss is 0.
    ///
    /// Mini-batches processed before an error keep their parameter updates.
    ///
    /// # Errors
    ///
    /// Returns [`BorderError::Configuration`] if `policy` is not the policy this updater
    /// was built with: its spec differs, or its trainable variables are not the ones the
    /// optimizer steps. A policy with an equal spec but its own variables is rejected.
    pub fn update(&mut self, policy: &mut P) -> Result<Record> {
        if self.current_lr <= 0.0 {
            return Ok(Record::from_scalar(PRETRAINING_LOSS, 0.0));
        }
        if policy.behavior_spec() != &self.behavior_spec
            || var_ids(&policy.trainable_vars()) != self.var_ids
        {
            return Err(BorderError::Configuration(
                "the policy does not match the policy the BC module was built with".into(),
            )
            .into());
        }

        let mut batch_losses = vec![];
        for _ in 0..self.num_epoch {
            self.demonstration_buffer.shuffle(self.sequence_length);
            for (start, end) in self.mini_batch_bounds() {
                let mini_batch = self.demonstration_buffer.make_mini_batch(start, end);
                let loss = self.update_batch(policy, &mini_batch)?;
                trace!("BC mini-batch [{}, {}): loss = {}", start, end, loss);
                batch_losses.push(loss);
            }
        }
        self.has_updated = true;

        let loss = match batch_losses.is_empty() {
            true => {
                warn!(
                    "BC update processed no mini-batch ({} experiences, n_sequences = {})",
                    self.demonstration_buffer.num_experiences(),
                    self.n_sequences
                );
                0.0
            }
            false => batch_losses.iter().sum::<f32>() / batch_losses.len() as f32,
        };
        debug!("BC update: {} mini-batches, loss = {}", batch_losses.len(), loss);

        Ok(Record::from_slice(&[
            (PRETRAINING_LOSS, RecordValue::Scalar(loss)),
            (
                PRETRAINING_LEARNING_RATE,
                RecordValue::Scalar(self.current_lr as f32),
            ),
        ]))
    }

    fn update_batch(&mut self, policy: &P, mini_batch: &DemoBatch) -> Result<f32> {
        let device = policy.device();
        let vector_obs = vec![rows_to_tensor(&mini_batch.vector_obs, device)?];
        let actions = rows_to_tensor(&mini_batch.actions, device)?;
        let (expert_actions, masks) = match &self.behavior_spec.action_space {
            ActionSpace::Continuous(_) => (ExpertActions::Continuous(actions), None),
            ActionSpace::Discrete(branch_sizes) => {
                let expert_actions = actions_to_onehot(&actions, branch_sizes)?;
                let masks = Tensor::ones(
                    (
                        self.n_sequences * self.sequence_length,
                        self.behavior_spec.action_space.total_branch_size(),
                    ),
                    DType::F32,
                    device,
                )?;
                (ExpertActions::Discrete(expert_actions), Some(masks))
            }
        };

        // One memory per sequence, taken at its first step.
        let memories = match self.use_recurrent && !mini_batch.memory.is_empty() {
            true => {
                let rows: Vec<Vec<f32>> = mini_batch
                    .memory
                    .iter()
                    .step_by(self.sequence_length)
                    .cloned()
                    .collect();
                Some(rows_to_tensor(&rows, device)?.unsqueeze(0)?)
            }
            false => None,
        };

        let mut visual_obs = Vec::with_capacity(self.num_visual_encoders);
        for k in 0..self.num_visual_encoders {
            let rows = mini_batch.visual_obs(k).ok_or_else(|| {
                BorderError::DemoLoad(format!("no visual observation for encoder {}", k))
            })?;
            let [h, w, c] = *self.behavior_spec.visual_obs_shapes.get(k).ok_or_else(|| {
                BorderError::DemoLoad(format!("no visual observation shape for encoder {}", k))
            })?;
            visual_obs.push(rows_to_tensor(rows, device)?.reshape((rows.len(), h, w, c))?);
        }

        let input = PolicyInput {
            vector_obs,
            visual_obs,
            masks,
            memories,
            seq_len: self.sequence_length,
        };
        let out = policy.sample_actions(&input, true)?;
        let loss = behavioral_cloning_loss(
            &out.actions,
            &out.log_probs,
            self.behavior_spec.action_space.branch_sizes(),
            &expert_actions,
        )?;

        let value = to_scalar_f32(&loss)?;
        if !value.is_finite() {
            return Err(BorderError::Numeric(format!("BC loss is {}", value)).into());
        }
        self.opt.backward_step(&loss)?;

        Ok(value)
    }
}

fn var_ids(vars: &[candle_core::Var]) -> HashSet<TensorId> {
    vars.iter().map(|v| v.id()).collect()
}
