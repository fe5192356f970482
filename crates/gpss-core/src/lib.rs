//! GPSS Core -- the discrete-event simulation kernel.
//!
//! A model is a chain of blocks. Transactions are created by GENERATE
//! blocks, move from block to block, wait on resources and in time, and are
//! destroyed by TERMINATE. The kernel advances a logical clock from one
//! scheduled event to the next.
//!
//! # Two-chain scheduling
//!
//! - The **future events chain** (FEC) holds transactions waiting for a
//!   clock time, sorted by time and stable among equal times.
//! - The **current events chain** (CEC) holds transactions ready at the
//!   current clock. The highest-priority member moves first; equal
//!   priorities move in chain order.
//!
//! Resources keep their own delay chains of transactions they refused.
//!
//! # Building and running a model
//!
//! ```rust,ignore
//! let mut b = ModelBuilder::new();
//! b.block(None, generate(30, 5))
//!     .block(None, advance(75, 25))
//!     .block(None, terminate(1));
//! let mut sim = Simulation::new(b.build()?, SimConfig { termination_count: 30, ..Default::default() });
//! let summary = sim.simulate(None);
//! ```
//!
//! # Key Types
//!
//! - [`engine::Simulation`] -- owns a model and runs it.
//! - [`model::ModelBuilder`] -- checks and links statements into a [`model::Model`].
//! - [`block::BlockKind`] -- the closed set of block operations.
//! - [`operand::Operand`] -- literals, names, parameters and SNAs.
//! - [`registry::Registry`] -- facilities, storages, queues and functions.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for statistics.

pub mod block;
pub mod chain;
pub mod engine;
pub mod facility;
pub mod fixed;
pub mod function;
pub mod id;
pub mod model;
pub mod operand;
pub mod process;
pub mod query;
pub mod queue;
pub mod registry;
pub mod rng;
pub mod scheduler;
pub mod sim;
pub mod storage;
pub mod transaction;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
