mod input;
mod render;

use crate::input::{parse_line, InputAction, HELP_TEXT};
use crate::render::Board;
use chrono::Local;
use smartcount_core::{
    ClockEvent, ClockRunner, CommandSender, CoreError, CountdownController, Program,
    SmartcountConfig, SystemTimeSource,
};
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_TARGET: &str = "smartcount::app";

fn main() {
    // Check config for logging.enabled before full config load
    let file_logging_enabled = check_file_logging_enabled();
    init_tracing(file_logging_enabled);

    // Load config or create template on first run
    let config = match SmartcountConfig::load_or_create() {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            println!(
                "Created a config template at {}. Edit it to define your own program.",
                path.display()
            );
            SmartcountConfig::default()
        }
        Err(CoreError::ConfigParseError(parse_error)) => {
            eprintln!(
                "Config file {} has a syntax error and cannot be loaded:\n{parse_error}",
                SmartcountConfig::config_path().display()
            );
            std::process::exit(1);
        }
        Err(e) => {
            error!(target: LOG_TARGET, "{e}");
            std::process::exit(1);
        }
    };

    let program = match config.program.to_program() {
        Ok(program) => program,
        Err(e) => {
            error!(target: LOG_TARGET, "{e}");
            std::process::exit(1);
        }
    };

    // A single control loop is all the clock needs
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(target: LOG_TARGET, "Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    // Set up Ctrl+C handler to trigger graceful shutdown
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!(target: LOG_TARGET, "Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!(target: LOG_TARGET, "Failed to set Ctrl+C handler: {}", e);
    }

    runtime.block_on(run(&config, program, &cancel_token));

    // Stdin is read on a blocking thread that never notices cancellation
    runtime.shutdown_timeout(Duration::from_millis(250));
}

/// Spawn the clock runner and drive the terminal until quit or Ctrl+C
async fn run(config: &SmartcountConfig, program: Program, cancel_token: &CancellationToken) {
    info!(
        target: LOG_TARGET,
        "Loaded program \"{}\" with {} sections",
        program.title,
        program.len()
    );

    let controller = CountdownController::new(program.clone(), config.clock.adjust_step_seconds);
    let (runner, commands) = ClockRunner::new(
        controller,
        Arc::new(SystemTimeSource),
        config.clock.tick_interval_ms,
        Some(cancel_token.clone()),
    );
    let events = runner.subscribe();
    let runner_handle = runner.start();

    println!("{HELP_TEXT}\n");
    drive_terminal(Board::new(program), events, &commands, cancel_token).await;

    cancel_token.cancel();
    drop(commands);
    if let Err(e) = runner_handle.await {
        error!(target: LOG_TARGET, "Clock runner task failed: {e}");
    }
    info!(target: LOG_TARGET, "Goodbye");
}

/// Read commands from stdin and print the board as clock events arrive
async fn drive_terminal(
    mut board: Board,
    mut events: broadcast::Receiver<ClockEvent>,
    commands: &CommandSender,
    cancel_token: &CancellationToken,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => break,
            event = events.recv() => match event {
                Ok(event) => {
                    if let Some(text) = board.handle(event, &Local) {
                        println!("{text}");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(target: LOG_TARGET, "Missed {} clock events", n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!(target: LOG_TARGET, "Clock event channel closed");
                    break;
                }
            },
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!(target: LOG_TARGET, "Input closed");
                        break;
                    }
                    Err(e) => {
                        error!(target: LOG_TARGET, "Failed to read input: {e}");
                        break;
                    }
                };

                match parse_line(&line) {
                    Ok(InputAction::Clock(command)) => {
                        if commands.send(command).await.is_err() {
                            warn!(target: LOG_TARGET, "Clock runner is no longer accepting commands");
                            break;
                        }
                    }
                    Ok(InputAction::Status { json: true }) => match board.to_json() {
                        Ok(json) => println!("{json}"),
                        Err(e) => error!(target: LOG_TARGET, "Failed to serialize status: {e}"),
                    },
                    Ok(InputAction::Status { json: false }) => {
                        println!("{}", board.render(&Local).unwrap_or_default());
                    }
                    Ok(InputAction::Help) => println!("{HELP_TEXT}"),
                    Ok(InputAction::Quit) => break,
                    Ok(InputAction::Nothing) => {}
                    Err(e) => println!("{e}"),
                }
            }
        }
    }
}

/// Check if file logging is enabled by reading the config file.
/// This is done before full config loading to set up tracing first.
/// Returns `false` if config doesn't exist or can't be parsed.
fn check_file_logging_enabled() -> bool {
    // Minimal structs to parse just the logging.enabled field
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let config_path = SmartcountConfig::config_path();
    let Ok(content) = std::fs::read_to_string(&config_path) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

/// Initialize tracing with stderr output and optional file logging
fn init_tracing(file_logging_enabled: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Keep stdout for the board
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if file_logging_enabled {
        let log_path = smartcount_core::paths::log_file_path();

        // Create cache directory if needed
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: stderr only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
