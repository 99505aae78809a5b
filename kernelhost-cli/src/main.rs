//! KernelHost CLI - Command-line interface
//!
//! This binary provides a command-line interface to the KernelHost library:
//! launch a kernel from a kernel.json spec and stream its output, or
//! validate a spec without launching anything.

mod error;

use clap::{Args, Parser, Subcommand};
use error::CliError;
use kernelhost::config::ConfigFile;
use kernelhost::exec::OutputEvent;
use kernelhost::kernelspec::{Interpreter, KernelSpec};
use kernelhost::launcher::{KernelLauncher, LaunchArgs};
use kernelhost::logging::init_logging;
use kernelhost::pool::{KernelDaemonPool, PoolConfig};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::debug;

#[derive(Parser)]
#[command(name = "kernelhost")]
#[command(about = "Launch interactive computing kernels", long_about = None)]
#[command(version = kernelhost::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Launch a kernel and stream its output until it exits
    Launch(LaunchCommand),

    /// Validate a kernel spec file without launching anything
    Check(CheckCommand),
}

#[derive(Args)]
struct LaunchCommand {
    /// Path to the kernel.json spec file
    #[arg(long)]
    kernel_spec: PathBuf,

    /// Interpreter executable to launch the kernel with
    #[arg(long)]
    interpreter: PathBuf,

    /// Connection file substituted for {connection_file} tokens in argv
    #[arg(long)]
    connection_file: Option<PathBuf>,

    /// Bypass the daemon pool and spawn the kernel directly
    #[arg(long)]
    no_daemon: bool,
}

#[derive(Args)]
struct CheckCommand {
    /// Path to the kernel.json spec file
    #[arg(long)]
    kernel_spec: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Launch(command) => launch(command).await,
        Command::Check(command) => check(command),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(error) => error.exit(),
    }
}

async fn launch(command: LaunchCommand) -> Result<i32, CliError> {
    ConfigFile::ensure_exists()?;
    let config = ConfigFile::load()?;

    let _logging_guard = init_logging(
        &config.logging.directory,
        &config.logging.file_name,
        &config.logging.level,
    )
    .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    let mut spec = KernelSpec::from_file(&command.kernel_spec)?;
    if let Some(connection_file) = &command.connection_file {
        substitute_connection_file(&mut spec, &connection_file.display().to_string());
    }

    let mut pool_config = PoolConfig::from(&config.daemon);
    pool_config.daemon.output_channel_capacity = config.exec.output_channel_capacity;
    if command.no_daemon {
        pool_config.enabled = false;
    }
    let pool = Arc::new(KernelDaemonPool::new(pool_config));
    let launcher = KernelLauncher::new(Arc::clone(&pool));

    let interpreter = Interpreter::new(command.interpreter);
    let mut result = launcher.launch(None, &spec, &interpreter).await?;
    debug!(daemon = result.daemon.is_some(), "Kernel launched");

    // Stream kernel output until it exits; mirror its exit code.
    let mut exit_code = 0;
    while let Some(event) = result.observable_output.recv().await {
        match event {
            OutputEvent::Stdout(line) => println!("{}", line),
            OutputEvent::Stderr(line) => eprintln!("{}", line),
            OutputEvent::Exited(exit) => {
                exit_code = exit.code.unwrap_or(1);
            }
        }
    }

    pool.shutdown().await;
    Ok(exit_code)
}

fn check(command: CheckCommand) -> Result<i32, CliError> {
    let spec = KernelSpec::from_file(&command.kernel_spec)?;
    let args = LaunchArgs::from_argv(&spec.argv)?;

    println!("{} ({})", spec.display_name, spec.language);
    println!("  module:   {}", args.module);
    println!("  args:     {:?}", args.residual);
    if !spec.env.is_empty() {
        println!("  env keys: {}", spec.env.len());
    }
    Ok(0)
}

/// Replaces `{connection_file}` tokens in the spec's argv.
fn substitute_connection_file(spec: &mut KernelSpec, connection_file: &str) {
    for token in &mut spec.argv {
        if token.contains("{connection_file}") {
            *token = token.replace("{connection_file}", connection_file);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_connection_file() {
        let mut spec = KernelSpec::new(
            vec![
                "python".to_string(),
                "-m".to_string(),
                "ipykernel_launcher".to_string(),
                "-f".to_string(),
                "{connection_file}".to_string(),
            ],
            "Python 3",
            "python",
        );

        substitute_connection_file(&mut spec, "/tmp/conn.json");
        assert_eq!(spec.argv[4], "/tmp/conn.json");
        // Other tokens are untouched.
        assert_eq!(spec.argv[0], "python");
    }

    #[test]
    fn test_cli_parses_launch() {
        let cli = Cli::try_parse_from([
            "kernelhost",
            "launch",
            "--kernel-spec",
            "/tmp/kernel.json",
            "--interpreter",
            "/usr/bin/python3",
            "--no-daemon",
        ])
        .unwrap();

        match cli.command {
            Command::Launch(command) => {
                assert_eq!(command.kernel_spec, PathBuf::from("/tmp/kernel.json"));
                assert_eq!(command.interpreter, PathBuf::from("/usr/bin/python3"));
                assert!(command.no_daemon);
                assert!(command.connection_file.is_none());
            }
            _ => panic!("expected launch command"),
        }
    }

    #[test]
    fn test_cli_parses_check() {
        let cli = Cli::try_parse_from([
            "kernelhost",
            "check",
            "--kernel-spec",
            "/tmp/kernel.json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Check(_)));
    }
}
