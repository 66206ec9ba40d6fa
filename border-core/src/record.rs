//! Records of training metrics.
//!
//! Optimization steps report what they did as a [`Record`], a mapping from metric
//! names to [`RecordValue`]s.
//!
//! ```rust
//! use border_core::record::{Record, RecordValue};
//!
//! let mut record = Record::from_scalar("Losses/Pretraining Loss", 0.25);
//! record.insert("Policy/Pretraining Learning Rate", RecordValue::Scalar(3e-4));
//! assert_eq!(record.get_scalar("Losses/Pretraining Loss").unwrap(), 0.25);
//! ```
mod base;

pub use base::{Record, RecordValue};
