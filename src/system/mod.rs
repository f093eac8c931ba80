//! # System Interaction Layer
//!
//! The boundary between the resolved execution policy and the operating system.
//!
//! - **`executor`**: spawns one child process, relays the caller's standard
//!   streams, polls for cancellation, and maps the exit into an [`executor::Outcome`]
//!   or an [`executor::ExecutionError`] according to the error-suppression policy.

pub mod executor;
