//! # Config Loader
//!
//! Loads the optional user defaults file and turns it into leading
//! [`ExecOption`]s. Because options fold left to right, anything given
//! after these defaults (the command line, or a host's own options) wins.
//!
//! The file lives at `<config dir>/execkit/config.toml` unless
//! `EXECKIT_CONFIG` points somewhere else:
//!
//! ```toml
//! shell = "/bin/bash"
//! use_shell = true
//! working_dir = "~/src"
//! env = ["RUST_BACKTRACE=1"]
//! inherit_env = true
//! ```
use crate::{
    constants::{CONFIG_DIR_NAME, CONFIG_PATH_ENV, DEFAULTS_FILENAME},
    models::{Defaults, ExecOption},
};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Errors raised while locating, reading or interpreting the defaults file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The platform has no config directory and `EXECKIT_CONFIG` is unset.
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    /// The file exists but could not be read.
    #[error("Could not read defaults file '{path}': {source}")]
    Read {
        /// The file that failed.
        path: String,
        /// The I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML or has unknown fields.
    #[error("Failed to parse defaults file '{path}': {source}")]
    Parse {
        /// The file that failed.
        path: String,
        /// The TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// A `$VAR` in a path value is undefined.
    #[error("Could not expand '{value}': {source}")]
    Expand {
        /// The value as written.
        value: String,
        /// The lookup error.
        #[source]
        source: shellexpand::LookupError<env::VarError>,
    },
}

/// Returns the path of the defaults file, honoring `EXECKIT_CONFIG`.
pub fn defaults_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(DEFAULTS_FILENAME))
        .ok_or(ConfigError::ConfigDirNotFound)
}

/// Loads the defaults file. A missing file yields empty defaults.
pub fn load_defaults(path: &Path) -> Result<Defaults, ConfigError> {
    if !path.exists() {
        log::debug!("No defaults file at '{}'.", path.display());
        return Ok(Defaults::default());
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let defaults = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    log::debug!("Loaded defaults from '{}': {:?}", path.display(), defaults);
    Ok(defaults)
}

/// Converts defaults into options. `working_dir` and `shell` are expanded
/// (`~`, `$VAR`); environment entries are passed through verbatim.
pub fn defaults_to_options(defaults: &Defaults) -> Result<Vec<ExecOption>, ConfigError> {
    let mut opts = Vec::new();

    if let Some(dir) = &defaults.working_dir {
        opts.push(ExecOption::WorkingDir(expand(dir)?));
    }
    opts.extend(defaults.env.iter().cloned().map(ExecOption::Env));
    if let Some(shell) = &defaults.shell {
        opts.push(ExecOption::ShellPath(expand(shell)?));
    }

    let flags: [(Option<bool>, fn(bool) -> ExecOption); 5] = [
        (defaults.use_shell, ExecOption::UseShell),
        (defaults.ignore_errors, ExecOption::IgnoreErrors),
        (defaults.quiet, ExecOption::Quiet),
        (defaults.interactive, ExecOption::Interactive),
        (defaults.inherit_env, ExecOption::InheritEnv),
    ];
    opts.extend(
        flags
            .into_iter()
            .filter_map(|(value, make)| value.map(make)),
    );
    Ok(opts)
}

fn expand(value: &str) -> Result<String, ConfigError> {
    shellexpand::full(value)
        .map(|expanded| expanded.into_owned())
        .map_err(|source| ConfigError::Expand {
            value: value.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_gives_empty_defaults() {
        let defaults = load_defaults(Path::new("non_existent_execkit_config.toml")).unwrap();
        assert_eq!(defaults, Defaults::default());
        assert!(defaults_to_options(&defaults).unwrap().is_empty());
    }

    #[test]
    fn test_load_defaults_from_file() {
        // --- Setup ---
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"
                shell = "/bin/bash"
                use_shell = true
                env = ["A=1", "B=2"]
                inherit_env = false
            "#,
        )
        .unwrap();
        file.flush().unwrap();

        // --- Execute ---
        let defaults = load_defaults(file.path()).unwrap();
        let config = options::resolve(defaults_to_options(&defaults).unwrap());

        // --- Assert ---
        assert!(config.use_shell);
        assert_eq!(config.shell_path, "/bin/bash");
        assert_eq!(config.env_overrides, vec!["A=1", "B=2"]);
        assert!(!config.inherit_env);
        assert!(!config.quiet);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"shel = \"/bin/zsh\"\n").unwrap();
        file.flush().unwrap();

        let result = load_defaults(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
        let error_msg = result.unwrap_err().to_string();
        assert!(error_msg.contains("unknown field"), "Error message was: {}", error_msg);
    }

    #[test]
    fn test_later_options_override_defaults() {
        let defaults = Defaults {
            quiet: Some(true),
            working_dir: Some("/srv".to_string()),
            ..Default::default()
        };
        let mut opts = defaults_to_options(&defaults).unwrap();
        opts.push(ExecOption::NO_QUIET);
        opts.push(ExecOption::working_dir("/tmp"));

        let config = options::resolve(opts);
        assert!(!config.quiet);
        assert_eq!(config.working_dir.as_deref(), Some(Path::new("/tmp")));
    }

    #[test]
    fn test_working_dir_tilde_is_expanded() {
        if dirs::home_dir().is_none() {
            return;
        }
        let defaults = Defaults {
            working_dir: Some("~/projects".to_string()),
            ..Default::default()
        };
        let opts = defaults_to_options(&defaults).unwrap();
        let [ExecOption::WorkingDir(dir)] = opts.as_slice() else {
            panic!("Expected a single working dir option, got {:?}", opts);
        };
        assert!(!dir.starts_with('~'));
        assert!(dir.ends_with("projects"));
    }
}
