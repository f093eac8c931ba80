// src/core/command.rs

//! The [`Exec`] command object.

use crate::{
    CancellationToken,
    constants::DIAGNOSTIC_PREFIX,
    core::{invocation::Invocation, options},
    models::{ExecConfig, ExecOption, Param},
    system::executor::{self, ExecutionError, Outcome, Streams},
};
use std::fmt;

/// An external command ready to run: positional arguments plus the resolved policy.
///
/// Both are captured at construction and never change, so one `Exec` can be
/// executed any number of times, from any number of threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exec {
    positional: Vec<String>,
    config: ExecConfig,
}

impl Exec {
    /// Builds a command from positional arguments and an option sequence.
    pub fn new<A, S, O>(positional: A, options: O) -> Self
    where
        A: IntoIterator<Item = S>,
        S: Into<String>,
        O: IntoIterator<Item = ExecOption>,
    {
        Self {
            positional: positional.into_iter().map(Into::into).collect(),
            config: options::resolve(options),
        }
    }

    /// Builds a command from mixed parameters. Strings become positional
    /// arguments in order; options are folded in the order they appear.
    pub fn from_params<I, P>(params: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        let mut positional = Vec::new();
        let mut opts = Vec::new();
        for param in params {
            match param.into() {
                Param::Arg(arg) => positional.push(arg),
                Param::Opt(opt) => opts.push(opt),
            }
        }
        Self::new(positional, opts)
    }

    /// Builds a reusable command pattern: `preset_args` come before any
    /// positional argument found in `params`.
    ///
    /// ```
    /// use execkit::{Exec, ExecOption, Param};
    ///
    /// let exec = Exec::wrapper(&["git", "-C", "/repo"], [Param::from("status"), ExecOption::QUIET.into()]);
    /// assert_eq!(exec.positional(), ["git", "-C", "/repo", "status"]);
    /// ```
    pub fn wrapper<I, P>(preset_args: &[&str], params: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        let preset = preset_args.iter().map(|arg| Param::from(*arg));
        Self::from_params(preset.chain(params.into_iter().map(Into::into)))
    }

    /// The positional arguments, in order.
    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// The resolved policy.
    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// The program and arguments this command would spawn.
    pub fn invocation(&self) -> Result<Invocation, ExecutionError> {
        Invocation::derive(&self.positional, &self.config)
    }

    /// Runs the command to completion, relaying the given streams.
    ///
    /// With no positional arguments nothing is spawned: a diagnostic is written
    /// to `streams.stderr` and [`ExecutionError::EmptyCommand`] is returned,
    /// whatever `IgnoreErrors` says.
    pub fn execute(
        &self,
        cancellation_token: &CancellationToken,
        streams: Streams<'_>,
    ) -> Result<Outcome, ExecutionError> {
        let invocation = match self.invocation() {
            Ok(invocation) => invocation,
            Err(e) => {
                let _ = writeln!(streams.stderr, "{DIAGNOSTIC_PREFIX}: no command specified");
                return Err(e);
            }
        };
        executor::execute(&invocation, &self.config, cancellation_token, streams)
    }
}

impl fmt::Display for Exec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exec [{}]", self.positional.join(" "))
    }
}
