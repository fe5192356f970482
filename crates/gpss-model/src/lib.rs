//! GPSS Model -- reads model text and run configuration.
//!
//! - [`parser`] turns a deck of statements into a checked
//!   [`gpss_core::model::Model`].
//! - [`syntax`] reads single operands; it is the inverse of the operand
//!   `Display` impls in `gpss-core`.
//! - [`config`] loads a [`gpss_core::sim::SimConfig`] from TOML, RON or JSON.

pub mod config;
pub mod parser;
pub mod syntax;

pub use config::{ConfigError, load_config};
pub use parser::{Deck, ParseError, ParseErrors, parse_deck, parse_model};
