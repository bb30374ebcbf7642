mod cmd;
mod exit;
mod logging;
mod output;

use std::time::Duration;

use clap::Parser;

use crate::cmd::Command;
use crate::exit::{CliError, CliResult, INTERNAL};
use crate::logging::{init_logging, LogFormat, LogLevel, LOG_FILTER_ENV};
use crate::output::OutputFormat;

/// How long to wait for outstanding blocking reads before exiting.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(
    name = "seriallink",
    version,
    about = "Request/response messaging over serial devices and sockets"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Extra filter directives, e.g. `seriallink_link=debug`.
    #[arg(long, value_name = "DIRECTIVES", env = LOG_FILTER_ENV, global = true)]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level, cli.log_filter.as_deref());

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(INTERNAL, format!("runtime setup failed: {err}")))?;
    let result = runtime.block_on(cmd::run(command, format));
    // Stdin and device reads run on the blocking pool and cannot be cancelled.
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
    result
}
