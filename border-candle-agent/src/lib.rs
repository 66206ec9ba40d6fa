//! Behavioral cloning for RL policies implemented with [candle](https://crates.io/crates/candle-core).
//!
//! [`bc::BcModule`] runs supervised updates of a [`policy::BcPolicy`] toward expert
//! demonstrations, alongside the main RL optimization of the same policy.
pub mod bc;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod policy;
pub mod util;
