//! The `microserve` command line.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use log::error;

use microserve_rs::{logging, HttpServer, ServerConfig, ServerError};

/// A minimal concurrent HTTP file server.
#[derive(Debug, Parser)]
#[command(name = "microserve", version, arg_required_else_help = true)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "microserve.json", env = "MICROSERVE_CONFIG")]
    config: PathBuf,

    /// Stay in the foreground. For debugging.
    #[arg(long = "no-daemon")]
    no_daemon: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Start the server in the background
    Start,
    /// Stop the background server
    Stop,
    /// Stop, then start the background server
    Restart,
}

/// Serve until a shutdown signal arrives.
///
/// A bind failure is returned; any other failure restarts the server.
fn run(config: &ServerConfig) -> Result<(), ServerError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.threads)
        .enable_all()
        .build()?;

    loop {
        let server = HttpServer::new(config.clone());
        match runtime.block_on(server.start()) {
            Ok(()) => return Ok(()),
            Err(e @ ServerError::Bind { .. }) => return Err(e),
            Err(e) => error!("Server stopped unexpectedly: {e}. Restarting..."),
        }
    }
}

#[cfg(unix)]
fn control_daemon(command: Command, config: &ServerConfig) -> Result<(), ServerError> {
    let daemon = microserve_rs::daemon::Daemon::new(&config.pid_file);
    match command {
        Command::Start => daemon.start(|| run(config)),
        Command::Stop => daemon.stop(),
        Command::Restart => daemon.restart(|| run(config)),
    }
}

#[cfg(not(unix))]
fn control_daemon(_command: Command, _config: &ServerConfig) -> Result<(), ServerError> {
    Err(ServerError::Daemon(
        "background mode is only supported on unix; use --no-daemon".to_string(),
    ))
}

impl Cli {
    /// The daemon command to run, or `None` to serve in the foreground.
    fn mode(&self) -> Result<Option<Command>, clap::Error> {
        match (self.no_daemon, self.command) {
            (true, None) => Ok(None),
            (false, Some(command)) => Ok(Some(command)),
            (true, Some(_)) => Err(Cli::command().error(
                ErrorKind::ArgumentConflict,
                "--no-daemon cannot be combined with start, stop or restart",
            )),
            (false, None) => Err(Cli::command().error(
                ErrorKind::MissingSubcommand,
                "expected one of start, stop, restart or --no-daemon",
            )),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.mode().unwrap_or_else(|e| e.exit());

    let config = match ServerConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let result = match command {
        None => run(&config),
        Some(command) => control_daemon(command, &config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ ServerError::Bind { .. }) => {
            error!("{e}. Exiting...");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
