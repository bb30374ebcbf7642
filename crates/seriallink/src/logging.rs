use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Environment variable holding extra filter directives, e.g. `seriallink_link=debug`.
pub const LOG_FILTER_ENV: &str = "SERIALLINK_LOG";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> tracing::level_filters::LevelFilter {
        match self {
            LogLevel::Error => tracing::level_filters::LevelFilter::ERROR,
            LogLevel::Warn => tracing::level_filters::LevelFilter::WARN,
            LogLevel::Info => tracing::level_filters::LevelFilter::INFO,
            LogLevel::Debug => tracing::level_filters::LevelFilter::DEBUG,
            LogLevel::Trace => tracing::level_filters::LevelFilter::TRACE,
        }
    }
}

/// Build the filter: `level` is the default, `directives` refine it.
///
/// Invalid directives are ignored in favour of the plain level.
pub fn build_filter(level: LogLevel, directives: Option<&str>) -> EnvFilter {
    let builder = EnvFilter::builder().with_default_directive(level.as_filter().into());
    match directives.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directives) => builder
            .parse(format!("{},{directives}", level.as_filter()))
            .unwrap_or_else(|_| builder.parse_lossy("")),
        None => builder.parse_lossy(""),
    }
}

pub fn init_logging(format: LogFormat, level: LogLevel, directives: Option<&str>) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(build_filter(level, directives))
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
