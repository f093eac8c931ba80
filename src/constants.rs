// src/constants.rs

//! Fixed values shared across the crate.

use std::time::Duration;

/// The flag passed to the shell before the joined command line.
pub const SHELL_COMMAND_FLAG: &str = "-c";

/// The prefix used for diagnostics written directly to the caller's error stream.
pub const DIAGNOSTIC_PREFIX: &str = "exec";

/// How long the supervisor sleeps between two exit-status polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The name of the directory holding execkit configuration (inside the system config dir).
pub const CONFIG_DIR_NAME: &str = "execkit";

/// The name of the user defaults file (inside the config directory).
pub const DEFAULTS_FILENAME: &str = "config.toml";

/// Environment variable that points to an alternative defaults file.
pub const CONFIG_PATH_ENV: &str = "EXECKIT_CONFIG";

/// Exit code used by the binary when a run is cancelled (same as a shell on Ctrl+C).
pub const CANCELLED_EXIT_CODE: i32 = 130;

/// How long output is still forwarded after a cancelled child has been killed.
pub const CANCEL_DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Size of one chunk read from a child's output pipe.
pub const RELAY_BUFFER_SIZE: usize = 8 * 1024;
