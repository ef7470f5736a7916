//! Command line interface.

pub mod command;

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::{command, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Keeps a local mirror of the NOAA Global Summary of the Day archive
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// JSON config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Root directory of the local archive mirror
    #[arg(long, global = true, env = "GSOD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Archive listing URL
    #[arg(long, global = true, env = "GSOD_BASE_URL")]
    pub base_url: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Hide progress bars
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download, merge and verify new or changed archives
    Sync {
        /// Only these years, e.g. `--year 2020 --year 2021`
        #[arg(long = "year")]
        years: Vec<String>,

        /// Also write `{year}_full.parquet`
        #[arg(long)]
        parquet: bool,
    },
    /// Show archives that are new or changed upstream
    Status {},
    /// Merge and verify an archive that is already on disk
    Merge {
        archive: PathBuf,

        /// Process again even if a completion marker exists
        #[arg(long)]
        force: bool,

        /// Also write `{year}_full.parquet`
        #[arg(long)]
        parquet: bool,
    },
}

impl GlobalArgs {
    /// Defaults, then the config file, then environment and flags.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;

        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }

        Ok(config)
    }
}

/// Installs the stderr subscriber. `RUST_LOG` wins over `--log-level`.
pub fn setup_logging(args: &GlobalArgs) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gsod_sync={}", args.log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

const PROGRESS_TEMPLATE: &str = "[{eta_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}";

/// Creates a progress bar.
pub fn create_progress_bar(size: u64, message: String) -> ProgressBar {
    let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

    ProgressBar::new(size).with_message(message).with_style(style)
}

// -- Tests -------------------------------------------------------------------
