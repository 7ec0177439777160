//! rusty-packages - look for installed packages that have not been used
//! (or upgraded) for a while.

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use rusty_core::{
    parse_threshold, DiagnosticSink, ScanFlags, ScanOptions, ScanProgress, Scanner, StaleReport,
    TracingSink, Warning, DEFAULT_THRESHOLD_DAYS,
};
use rusty_pacman::{PacmanConfig, PacmanSource, ReverseDepsQuery};
use std::process::ExitCode;
use tracing::{debug, error, Level};
use tracing_subscriber::FmtSubscriber;

/// Look for unused packages.
#[derive(Parser, Debug)]
#[command(name = "rusty-packages")]
#[command(version, about, long_about = None)]
struct Cli {
    /// When calculating a package's last use time, take into consideration
    /// last use of packages depending on it also. Not allowed with --last-upgraded
    #[arg(short = 'd', long)]
    follow_deps: bool,

    /// Follow dependents of dependents too (requires --follow-deps)
    #[arg(long)]
    transitive: bool,

    /// Show packages not used since last upgrade only. Not allowed with --last-upgraded
    #[arg(short = 'u', long)]
    since_upgrade: bool,

    /// Instead of last use time, look for last update time. This allows
    /// finding packages not updated for a long time
    #[arg(short = 'l', long)]
    last_upgraded: bool,

    /// Show packages not used for more than this number of days
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_THRESHOLD_DAYS.to_string(),
        allow_negative_numbers = true
    )]
    time: String,

    /// How to find packages depending on a package
    #[arg(long, value_enum, default_value_t = ReverseDeps::Pactree)]
    reverse_deps: ReverseDeps,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Do not draw a progress bar
    #[arg(long)]
    no_progress: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReverseDeps {
    /// pactree -rl
    Pactree,
    /// "Required By" from pacman -Qi
    Pacman,
}

impl From<ReverseDeps> for ReverseDepsQuery {
    fn from(value: ReverseDeps) -> Self {
        match value {
            ReverseDeps::Pactree => ReverseDepsQuery::Pactree,
            ReverseDeps::Pacman => ReverseDepsQuery::QueryInfo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    fn flags(&self) -> rusty_core::Result<ScanFlags> {
        Ok(ScanFlags {
            follow_deps: self.follow_deps,
            transitive: self.transitive,
            since_upgrade: self.since_upgrade,
            last_upgraded: self.last_upgraded,
            time_days: parse_threshold(&self.time)?,
        })
    }
}

/// Logs warnings without tearing the progress bar.
struct ProgressSink {
    bar: ProgressBar,
}

impl DiagnosticSink for ProgressSink {
    fn warn(&self, warning: Warning) {
        self.bar.suspend(|| TracingSink.warn(warning));
    }
}

fn progress_bar(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

fn print_report(report: &StaleReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => println!("{}", report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    // Reject bad flag combinations before touching the package database.
    let options = ScanOptions::from_flags(&cli.flags()?)?;
    debug!("Scan options: {:?}", options);

    let source = PacmanSource::with_config(PacmanConfig {
        reverse_deps: cli.reverse_deps.into(),
        ..Default::default()
    });
    let now = Utc::now().timestamp();

    let bar = progress_bar(!cli.no_progress);
    let sink = ProgressSink { bar: bar.clone() };
    let tick = bar.clone();

    let report = Scanner::new(&source, &sink, options, now)
        .with_progress(Box::new(move |progress: ScanProgress<'_>| {
            tick.set_length(progress.total as u64);
            tick.set_position(progress.index as u64);
            tick.set_message(progress.package.to_string());
        }))
        .run()
        .context("Failed to read the package database")?;
    bar.finish_and_clear();

    debug!("{} of the scanned packages are stale", report.len());
    print_report(&report, cli.format)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set subscriber: {}", e);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}
