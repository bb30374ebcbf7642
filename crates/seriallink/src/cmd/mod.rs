use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use seriallink_frame::MessageKind;
use seriallink_link::Link;
use seriallink_transport::{Connection, Endpoint};
use tokio::task::JoinHandle;

use crate::exit::{transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod listen;
pub mod notify;
pub mod request;
pub mod respond;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one request and print its response.
    Request(RequestArgs),
    /// Send one notification.
    Notify(NotifyArgs),
    /// Print incoming messages.
    Listen(ListenArgs),
    /// Answer incoming requests.
    Respond(RespondArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub async fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Request(args) => request::run(args, format).await,
        Command::Notify(args) => notify::run(args).await,
        Command::Listen(args) => listen::run(args, format).await,
        Command::Respond(args) => respond::run(args, format).await,
        Command::Version(args) => version::run(args),
    }
}

async fn connect(endpoint: &Endpoint) -> CliResult<Connection> {
    tracing::debug!(%endpoint, "connecting");
    endpoint
        .connect()
        .await
        .map_err(|err| transport_error("connect failed", err))
}

/// Run `link` on `connection` in a background task.
fn serve(link: &Arc<Link>, connection: Connection) -> JoinHandle<seriallink_link::Result<()>> {
    let link = link.clone();
    tokio::spawn(async move { link.serve(connection).await })
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Endpoint: tcp://host:port, unix:///path, a device path, or - for stdio.
    pub endpoint: Endpoint,
    /// Command text to send.
    pub command: String,
    /// How long to wait for the response (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", env = "SERIALLINK_TIMEOUT", value_parser = parse_duration)]
    pub timeout: Duration,
}

#[derive(Args, Debug)]
pub struct NotifyArgs {
    /// Endpoint: tcp://host:port, unix:///path, a device path, or - for stdio.
    pub endpoint: Endpoint,
    /// Command text to send.
    pub command: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Endpoint: tcp://host:port, unix:///path, a device path, or - for stdio.
    pub endpoint: Endpoint,
    /// Only print messages of this kind.
    #[arg(long)]
    pub kind: Option<KindFilter>,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct RespondArgs {
    /// Endpoint: tcp://host:port, unix:///path, a device path, or - for stdio.
    pub endpoint: Endpoint,
    /// Reply REPLY to requests whose command is CMD. Repeatable.
    #[arg(long = "rule", value_name = "CMD=REPLY", value_parser = parse_rule)]
    pub rules: Vec<(String, String)>,
    /// Echo the command of requests no rule matches.
    #[arg(long)]
    pub echo: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindFilter {
    Request,
    Response,
    Notify,
}

impl KindFilter {
    pub fn matches(self, kind: MessageKind) -> bool {
        matches!(
            (self, kind),
            (KindFilter::Request, MessageKind::Request)
                | (KindFilter::Response, MessageKind::Response)
                | (KindFilter::Notify, MessageKind::Notification)
        )
    }
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

fn parse_rule(input: &str) -> CliResult<(String, String)> {
    match input.split_once('=') {
        Some((command, reply)) if !command.is_empty() => {
            Ok((command.to_string(), reply.to_string()))
        }
        _ => Err(CliError::new(
            USAGE,
            format!("invalid rule {input:?}, expected CMD=REPLY"),
        )),
    }
}
