use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use nforate_acquire::ImdbClient;
use nforate_update::UpdateOptions;

#[derive(Parser)]
#[command(name = "nforate")]
#[command(about = "Fill in missing IMDb ratings in Kodi .nfo metadata files")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_HASH"), ")"))]
struct Cli {
    /// Library root; every immediate subdirectory is scanned for .nfo files
    #[arg(short, long, default_value = ".")]
    path: PathBuf,

    /// Seconds to pause after a directory that produced an update
    #[arg(short, long, default_value_t = 15)]
    delay: u64,

    /// Fetch ratings and report, but leave files untouched
    #[arg(long)]
    dry_run: bool,

    /// Write a JSON run report to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace
    #[arg(long, default_value = "info", value_enum)]
    log_level: LogLevel,

    /// Use UTC timestamps instead of local time
    #[arg(long)]
    utc: bool,
}

#[derive(Clone, clap::ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter directives; HTML parsing and HTTP internals stay at warn.
    fn directives(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn  => "warn",
            LogLevel::Info  => "info",
            LogLevel::Debug => "debug,selectors=warn,html5ever=warn,hyper=warn,reqwest=warn",
            LogLevel::Trace => "trace,selectors=warn,html5ever=warn,hyper=warn,reqwest=warn",
        }
    }
}

fn init_logging(level: &LogLevel, utc: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.directives()));

    // Timestamp format: 2026-02-14 19:44:09.123 -08:00
    let time_format = "%Y-%m-%d %H:%M:%S%.3f %:z";

    if utc {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_timer(tracing_subscriber::fmt::time::ChronoUtc::new(time_format.to_string()))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_timer(tracing_subscriber::fmt::time::ChronoLocal::new(time_format.to_string()))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.utc);

    let options = UpdateOptions {
        root: cli.path,
        delay: Duration::from_secs(cli.delay),
        dry_run: cli.dry_run,
    };

    let client = ImdbClient::new()?;
    let report = nforate_update::run(&options, &client).await?;

    if let Some(path) = &cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write run report to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote run report");
    }

    Ok(())
}
