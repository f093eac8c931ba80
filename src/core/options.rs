// src/core/options.rs

//! The option fold.

use crate::models::{ExecConfig, ExecOption};
use std::path::PathBuf;

/// Returns the shell used when shell mode is on and no shell path was given.
pub const fn default_shell() -> &'static str {
    if cfg!(unix) { "/bin/sh" } else { "sh" }
}

/// Folds an option sequence into one [`ExecConfig`].
///
/// Options are applied left to right. Single-valued fields take the last
/// occurrence; `Env` entries accumulate in order, duplicates included.
/// After the fold:
/// - an unset `InheritEnv` resolves to `true`;
/// - shell mode without a shell path gets [`default_shell`].
pub fn resolve<I>(options: I) -> ExecConfig
where
    I: IntoIterator<Item = ExecOption>,
{
    let mut config = ExecConfig::default();
    let mut inherit_env: Option<bool> = None;

    for option in options {
        match option {
            ExecOption::WorkingDir(dir) => {
                config.working_dir = (!dir.is_empty()).then(|| PathBuf::from(dir));
            }
            ExecOption::Env(entry) => config.env_overrides.push(entry),
            ExecOption::ShellPath(path) => config.shell_path = path,
            ExecOption::UseShell(on) => config.use_shell = on,
            ExecOption::IgnoreErrors(on) => config.ignore_errors = on,
            ExecOption::Quiet(on) => config.quiet = on,
            ExecOption::Interactive(on) => config.interactive = on,
            ExecOption::InheritEnv(on) => inherit_env = Some(on),
        }
    }

    config.inherit_env = inherit_env.unwrap_or(true);
    if config.use_shell && config.shell_path.is_empty() {
        config.shell_path = default_shell().to_string();
    }

    log::trace!("Resolved execution config: {:?}", config);
    config
}
