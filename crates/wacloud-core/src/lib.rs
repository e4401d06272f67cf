//! wacloud Core - Host plugin contract
//!
//! This crate defines what a host agent runtime sees of an adapter:
//! - Action: named, described, example-carrying operations with a
//!   type-narrowing `validate` gate and an async `handle`
//! - Registry: ordered action registration and dispatch
//! - Plugin/Runtime: the two handles exchanged between host and adapter

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod action;
pub mod error;
pub mod plugin;

pub use action::{Action, ActionDefinition, ActionExample, ActionRegistry, Validation};
pub use error::{Error, Result};
pub use plugin::{Plugin, Runtime, StaticRuntime};
