//! # execkit
//!
//! Runs one external process according to an unordered bundle of typed options:
//! direct or shell invocation, environment inheritance and overrides, working
//! directory, quiet error stream, interactive passthrough and error suppression.
//!
//! The flow is `ExecOption`s → [`crate::core::options::resolve`] → [`crate::models::ExecConfig`]
//! → [`crate::core::invocation::Invocation`] → [`crate::system::executor::execute`].

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Cooperative cancellation flag shared between the caller and a running launch.
/// Storing `true` asks the launcher to kill the child and report a cancellation.
pub type CancellationToken = Arc<AtomicBool>;

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod system;

pub use crate::core::command::Exec;
pub use crate::models::{ExecConfig, ExecOption, Param};
pub use crate::system::executor::{ErrorKind, ExecutionError, Outcome, Streams};
