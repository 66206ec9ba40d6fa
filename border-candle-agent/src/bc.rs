//! Behavioral cloning (BC) inline with RL.
//!
//! [`BcModule`] pretrains or regularizes a [`BcPolicy`](crate::policy::BcPolicy) toward
//! expert demonstrations. It is built next to the RL algorithm training the same policy,
//! and the trainer calls [`BcModule::update`] between its own optimization steps.
//!
//! ```no_run
//! # use anyhow::Result;
//! use border_candle_agent::{
//!     bc::{BcModule, BcSettings},
//!     policy::{MlpPolicy, MlpPolicyConfig},
//! };
//! use border_core::{ActionSpace, BehaviorSpec};
//! use candle_core::Device;
//!
//! # fn main() -> Result<()> {
//! let spec = BehaviorSpec::new(8, ActionSpace::Discrete(vec![3, 2]));
//! let mut policy = MlpPolicy::build(MlpPolicyConfig::new(spec), Device::Cpu)?;
//! let settings = BcSettings::new("expert.demo").strength(0.5).steps(10_000);
//! let mut bc = BcModule::new(&policy, &settings, 3e-4, 1024, 3)?;
//!
//! for step in 0..100 {
//!     bc.anneal(step);
//!     let record = bc.update(&mut policy)?;
//! }
//! # Ok(())
//! # }
//! ```
mod base;
mod config;
mod loss;
mod schedule;

pub use base::{BcModule, PRETRAINING_LEARNING_RATE, PRETRAINING_LOSS};
pub use config::BcSettings;
pub use loss::{behavioral_cloning_loss, continuous_bc_loss, discrete_bc_loss, ExpertActions};
pub use schedule::{LinearSchedule, LrSchedule};
