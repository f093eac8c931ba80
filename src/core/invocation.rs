// src/core/invocation.rs

//! Pure derivations from `(positional, ExecConfig)` to what actually gets spawned:
//! program and argument vector, child environment, and stream wiring.

use crate::{constants::SHELL_COMMAND_FLAG, models::ExecConfig, system::executor::ExecutionError};
use std::{ffi::OsString, fmt};

/// The concrete program and argument vector for one launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name or path, resolved through `PATH` by the OS.
    pub program: String,
    /// Arguments after the program name.
    pub args: Vec<String>,
}

impl Invocation {
    /// Derives the invocation for the given positional arguments.
    ///
    /// In direct mode the first element is the program and the rest are its
    /// arguments. In shell mode every element is joined with a single space
    /// and handed to `shell_path -c`. The join does no quoting: arguments
    /// containing spaces or shell metacharacters are interpreted by the shell.
    ///
    /// # Errors
    /// Returns [`ExecutionError::EmptyCommand`] when `positional` is empty.
    pub fn derive(positional: &[String], config: &ExecConfig) -> Result<Self, ExecutionError> {
        let (first, rest) = positional
            .split_first()
            .ok_or(ExecutionError::EmptyCommand)?;

        if config.use_shell {
            Ok(Self {
                program: config.shell_path.clone(),
                args: vec![SHELL_COMMAND_FLAG.to_string(), positional.join(" ")],
            })
        } else {
            Ok(Self {
                program: first.clone(),
                args: rest.to_vec(),
            })
        }
    }
}

impl fmt::Display for Invocation {
    /// Shell-quoted rendering, for logs and error messages only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words = std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str));
        match shlex::try_join(words) {
            Ok(line) => f.write_str(&line),
            // Only fails on interior NUL bytes; fall back to a plain join.
            Err(_) => write!(f, "{} {}", self.program, self.args.join(" ")),
        }
    }
}

/// Builds the complete child environment.
///
/// Starts empty, is seeded with `inherited` when `inherit_env` is set, then
/// gets every override appended in order. Later entries with the same key
/// shadow earlier ones once applied to the process. Entries are split at the
/// first `=`; an entry without `=` becomes a variable with an empty value.
pub fn derive_environment<I>(config: &ExecConfig, inherited: I) -> Vec<(OsString, OsString)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut env: Vec<(OsString, OsString)> = if config.inherit_env {
        inherited.into_iter().collect()
    } else {
        Vec::new()
    };

    env.extend(config.env_overrides.iter().map(|entry| {
        let (key, value) = entry.split_once('=').unwrap_or((entry.as_str(), ""));
        (OsString::from(key), OsString::from(value))
    }));
    env
}

/// Which caller-supplied streams are connected to the child.
/// A stream that is not relayed is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wiring {
    /// Feed the caller's input to the child.
    pub stdin: bool,
    /// Relay the child's output to the caller.
    pub stdout: bool,
    /// Relay the child's error stream to the caller.
    pub stderr: bool,
}

impl Wiring {
    /// Derives the wiring for a config.
    pub fn for_config(config: &ExecConfig) -> Self {
        let mut wiring = Self {
            stdin: true,
            stdout: true,
            stderr: !config.quiet,
        };

        // Interactive runs reconnect all three streams, overriding `quiet`.
        // This is the hook for attaching a terminal later on.
        if config.interactive {
            wiring = Self {
                stdin: true,
                stdout: true,
                stderr: true,
            };
        }
        wiring
    }
}
