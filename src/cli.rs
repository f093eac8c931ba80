// src/cli.rs

//! Command-line interface of the `execkit` binary.

use crate::models::ExecOption;
use clap::Parser;

/// execkit: run one external command under an explicit execution policy.
///
/// Options are applied on top of the user defaults file
/// (`<config dir>/execkit/config.toml`, or `$EXECKIT_CONFIG`).
///
/// Examples:
///   - `execkit echo hi`
///   - `execkit --shell 'ls | wc -l'`
///   - `execkit --no-inherit-env -e PATH=/usr/bin -- env`
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Working directory for the command. Must exist.
    #[arg(short = 'C', long = "cwd", value_name = "DIR")]
    pub working_dir: Option<String>,

    /// Add an environment entry (e.g., "KEY=VALUE"). May be repeated; later entries win.
    #[arg(short, long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Run the command line through a shell (`<shell> -c "<args joined by spaces>"`).
    #[arg(short, long)]
    pub shell: bool,

    /// Shell binary to use with `--shell`. Defaults to `/bin/sh`.
    #[arg(long, value_name = "PATH")]
    pub shell_path: Option<String>,

    /// Report success even if the command cannot start or exits non-zero.
    #[arg(short, long)]
    pub ignore_errors: bool,

    /// Discard the command's standard error.
    #[arg(short, long)]
    pub quiet: bool,

    /// Relay all three standard streams to and from the caller's, overriding `--quiet`.
    #[arg(long)]
    pub interactive: bool,

    /// Start the command with an empty environment (plus any `--env` entries).
    #[arg(long)]
    pub no_inherit_env: bool,

    /// Ignore the user defaults file.
    #[arg(long)]
    pub no_config: bool,

    /// The command and its arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl Cli {
    /// Options given on the command line. Flags that were not passed
    /// contribute nothing, so they do not mask the user defaults.
    pub fn to_options(&self) -> Vec<ExecOption> {
        let mut opts = Vec::new();
        if let Some(dir) = &self.working_dir {
            opts.push(ExecOption::working_dir(dir));
        }
        opts.extend(self.env.iter().cloned().map(ExecOption::Env));
        if let Some(path) = &self.shell_path {
            opts.push(ExecOption::shell_path(path));
        }

        let flags = [
            (self.shell, ExecOption::USE_SHELL),
            (self.ignore_errors, ExecOption::IGNORE_ERRORS),
            (self.quiet, ExecOption::QUIET),
            (self.interactive, ExecOption::INTERACTIVE),
            (self.no_inherit_env, ExecOption::NO_INHERIT_ENV),
        ];
        opts.extend(flags.into_iter().filter_map(|(set, opt)| set.then_some(opt)));
        opts
    }
}
