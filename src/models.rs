// src/models.rs

//! Plain data: the option vocabulary, the resolved policy, and the defaults file model.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// --- OPTION MODEL ---

/// A single typed configuration value. Each variant names the field of
/// [`ExecConfig`] it affects; folding is done by [`crate::core::options::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOption {
    /// Working directory for the child. An empty string means "inherit".
    WorkingDir(String),
    /// One `KEY=VALUE` environment entry. Accumulates, never overwrites.
    Env(String),
    /// Shell binary used when shell mode is on.
    ShellPath(String),
    /// Shell-interpreted (`true`) or direct (`false`) invocation.
    UseShell(bool),
    /// Report launch and exit failures as success.
    IgnoreErrors(bool),
    /// Discard the child's error stream.
    Quiet(bool),
    /// Explicitly reconnect all three standard streams to the caller's.
    Interactive(bool),
    /// Seed the child environment with the caller's environment.
    InheritEnv(bool),
}

impl ExecOption {
    /// `UseShell(true)`
    pub const USE_SHELL: Self = Self::UseShell(true);
    /// `UseShell(false)`
    pub const NO_SHELL: Self = Self::UseShell(false);
    /// `IgnoreErrors(true)`
    pub const IGNORE_ERRORS: Self = Self::IgnoreErrors(true);
    /// `IgnoreErrors(false)`
    pub const NO_IGNORE_ERRORS: Self = Self::IgnoreErrors(false);
    /// `Quiet(true)`
    pub const QUIET: Self = Self::Quiet(true);
    /// `Quiet(false)`
    pub const NO_QUIET: Self = Self::Quiet(false);
    /// `Interactive(true)`
    pub const INTERACTIVE: Self = Self::Interactive(true);
    /// `Interactive(false)`
    pub const NO_INTERACTIVE: Self = Self::Interactive(false);
    /// `InheritEnv(true)`
    pub const INHERIT_ENV: Self = Self::InheritEnv(true);
    /// `InheritEnv(false)`
    pub const NO_INHERIT_ENV: Self = Self::InheritEnv(false);

    /// Shorthand for [`ExecOption::WorkingDir`].
    pub fn working_dir(dir: impl Into<String>) -> Self {
        Self::WorkingDir(dir.into())
    }

    /// Shorthand for [`ExecOption::Env`].
    pub fn env(entry: impl Into<String>) -> Self {
        Self::Env(entry.into())
    }

    /// Shorthand for [`ExecOption::ShellPath`].
    pub fn shell_path(path: impl Into<String>) -> Self {
        Self::ShellPath(path.into())
    }
}

/// The fully resolved execution policy for one launch.
///
/// Built once by folding options; never mutated afterwards. When `use_shell`
/// is set, `shell_path` is guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecConfig {
    /// Directory the child starts in. `None` inherits the caller's.
    pub working_dir: Option<PathBuf>,
    /// `KEY=VALUE` entries applied after the inherited environment, in order.
    pub env_overrides: Vec<String>,
    /// Shell binary for shell mode. May be empty when shell mode is off.
    pub shell_path: String,
    /// Run `shell_path -c "<joined args>"` instead of the program directly.
    pub use_shell: bool,
    /// Turn launch and runtime failures into [`crate::Outcome::Suppressed`].
    pub ignore_errors: bool,
    /// Discard the child's standard error.
    pub quiet: bool,
    /// Relay all three standard streams, overriding `quiet`.
    pub interactive: bool,
    /// Start from the caller's environment rather than an empty one.
    pub inherit_env: bool,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            working_dir: None,
            env_overrides: Vec::new(),
            shell_path: String::new(),
            use_shell: false,
            ignore_errors: false,
            quiet: false,
            interactive: false,
            inherit_env: true,
        }
    }
}

// --- CONSTRUCTION INPUT ---

/// One heterogeneous construction parameter: either a positional string or an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// A positional argument.
    Arg(String),
    /// An option folded into the policy.
    Opt(ExecOption),
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Self::Arg(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Self::Arg(value)
    }
}

impl From<ExecOption> for Param {
    fn from(value: ExecOption) -> Self {
        Self::Opt(value)
    }
}

// --- USER DEFAULTS (FOR TOML) ---

/// Contents of the optional `config.toml` defaults file.
/// Every field is optional; absent fields contribute no option.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    /// Shell binary; `~` and `$VAR` are expanded.
    pub shell: Option<String>,
    /// Default for [`ExecOption::UseShell`].
    pub use_shell: Option<bool>,
    /// Working directory; `~` and `$VAR` are expanded.
    pub working_dir: Option<String>,
    /// `KEY=VALUE` entries, passed through verbatim.
    #[serde(default)]
    pub env: Vec<String>,
    /// Default for [`ExecOption::IgnoreErrors`].
    pub ignore_errors: Option<bool>,
    /// Default for [`ExecOption::Quiet`].
    pub quiet: Option<bool>,
    /// Default for [`ExecOption::Interactive`].
    pub interactive: Option<bool>,
    /// Default for [`ExecOption::InheritEnv`].
    pub inherit_env: Option<bool>,
}
