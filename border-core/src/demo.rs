//! Expert demonstrations.
//!
//! Demonstrations are recorded as episodes of [`DemoStep`]s. They are loaded through a
//! [`DemoLoader`] into a [`DemoBuffer`], a flat, sequence-aligned store of transitions
//! from which mini-batches ([`DemoBatch`]) are sliced.
//!
//! ```rust
//! use border_core::{
//!     demo::{DemoBuffer, DemoEpisode, DemoStep},
//!     ActionSpace, BehaviorSpec,
//! };
//!
//! let spec = BehaviorSpec::new(2, ActionSpace::Continuous(1));
//! let episode = DemoEpisode::new(vec![
//!     DemoStep::new(vec![0.0, 1.0], vec![0.5]),
//!     DemoStep::new(vec![1.0, 2.0], vec![0.2]),
//!     DemoStep::new(vec![2.0, 3.0], vec![-0.1]),
//! ]);
//!
//! // Episodes are padded to a multiple of the sequence length.
//! let buffer = DemoBuffer::from_episodes(&[episode], 2, &spec).unwrap();
//! assert_eq!(buffer.num_experiences(), 4);
//! ```
mod batch;
mod buffer;
mod loader;
mod step;

pub use batch::DemoBatch;
pub use buffer::DemoBuffer;
pub use loader::{DemoFile, DemoFileLoader, DemoLoader, DemoMetadata};
pub use step::{DemoEpisode, DemoStep};
