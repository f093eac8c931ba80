// src/core/mod.rs

//! Pure policy logic: option folding, invocation derivation, the command object
//! and the user defaults file.

pub mod command;
pub mod config_loader;
pub mod invocation;
pub mod options;
