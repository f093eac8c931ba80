// src/bin/execkit.rs

//! The `execkit` command-line launcher.

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use execkit::{
    CancellationToken, Exec, ExecutionError, Outcome, Streams,
    cli::Cli,
    constants::CANCELLED_EXIT_CODE,
    core::config_loader,
};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// The main entry point of the `execkit` binary.
/// It sets up logging and Ctrl+C handling, runs the command, and maps the
/// result to an exit code.
fn main() {
    let cancellation_token: CancellationToken = Arc::new(AtomicBool::new(false));
    env_logger::init();
    install_interrupt_handler(&cancellation_token);

    if let Err(e) = run_cli(Cli::parse(), &cancellation_token) {
        // --- Centralized Error Handling ---
        if let Some(exec_err) = e.downcast_ref::<ExecutionError>() {
            match exec_err {
                // Exit silently with the standard interruption code.
                ExecutionError::Cancelled { .. } => std::process::exit(CANCELLED_EXIT_CODE),
                // The diagnostic has already been written by the launcher.
                ExecutionError::EmptyCommand => std::process::exit(2),
                ExecutionError::NonZeroExitStatus { status, .. } => {
                    log::debug!("{}", exec_err);
                    std::process::exit(status.code().unwrap_or(1));
                }
                _ => {}
            }
        }

        eprintln!("{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli, cancellation_token: &CancellationToken) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    let mut options = if cli.no_config {
        Vec::new()
    } else {
        let path = config_loader::defaults_path()?;
        let defaults = config_loader::load_defaults(&path)?;
        config_loader::defaults_to_options(&defaults)
            .with_context(|| format!("Invalid defaults in '{}'", path.display()))?
    };
    options.extend(cli.to_options());

    let exec = Exec::new(cli.command, options);
    log::debug!("Running {}", exec);

    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    let streams = Streams::new(Box::new(io::stdin()), &mut stdout, &mut stderr);

    match exec.execute(cancellation_token, streams)? {
        Outcome::Success => {}
        Outcome::Suppressed(e) => log::info!("Ignored failure: {}", e),
    }
    Ok(())
}

/// Bridges Ctrl+C to the cancellation token on a dedicated thread.
fn install_interrupt_handler(cancellation_token: &CancellationToken) {
    let token = Arc::clone(cancellation_token);
    let spawned = thread::Builder::new()
        .name("execkit-signal".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    log::warn!("Could not start signal runtime: {}", e);
                    return;
                }
            };
            runtime.block_on(async {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        log::debug!("Ctrl+C received, cancelling.");
                        token.store(true, Ordering::SeqCst);
                    }
                    Err(e) => log::warn!("Could not listen for Ctrl+C: {}", e),
                }
            });
        });
    if let Err(e) = spawned {
        log::warn!("Could not install Ctrl+C handler: {}", e);
    }
}
