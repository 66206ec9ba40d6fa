#![warn(missing_docs)]
//! Core types for behavioral cloning in border.
//!
//! This crate has no dependency on a deep learning backend. It provides the
//! observation/action spec of a behavior, expert demonstrations and their loader,
//! records of training metrics and errors.
pub mod demo;
pub mod error;
pub mod record;

mod behavior_spec;
pub use behavior_spec::{ActionSpace, BehaviorSpec};
