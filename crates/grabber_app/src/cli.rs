use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use grabber_core::{NamingMode, RunConfig, DEFAULT_MAX_SIDE};
use grabber_engine::FetchSettings;
use log::LevelFilter;
use url::Url;

use crate::logging::LogDestination;

/// Downloads and resizes images from any webpage.
#[derive(Debug, Parser)]
#[command(name = "image-grabber", version, about)]
pub struct Cli {
    /// Directory to save images in; created if missing
    pub output_directory: PathBuf,

    /// Web address to download images from
    pub url: Url,

    /// CSS selectors for the images
    pub css_selectors: String,

    /// Save images using alt text or original filename
    /// ("alt-text", "original-filename", or the labels "Alt text" / "Original filename")
    #[arg(long, short = 'n', default_value = "alt-text")]
    pub naming: NamingMode,

    /// Longest side of the square thumbnails, in pixels
    #[arg(long, default_value_t = DEFAULT_MAX_SIDE, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_side: u32,

    /// Give up on a request after this many seconds (default: wait indefinitely)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Give up connecting after this many seconds
    #[arg(long, value_name = "SECS")]
    pub connect_timeout: Option<u64>,

    /// User-Agent header sent with every request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Diagnostics level on stderr: off, error, warn, info, debug, trace
    #[arg(long, default_value = "warn", value_parser = parse_level)]
    pub log_level: LevelFilter,

    /// Also write diagnostics to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn run_config(&self) -> RunConfig {
        RunConfig::new(
            self.output_directory.clone(),
            self.url.clone(),
            self.css_selectors.clone(),
            self.naming,
        )
        .with_max_side(self.max_side)
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        let defaults = FetchSettings::default();
        FetchSettings {
            connect_timeout: self.connect_timeout.map(Duration::from_secs),
            request_timeout: self.timeout.map(Duration::from_secs),
            user_agent: self.user_agent.clone().unwrap_or_else(|| defaults.user_agent.clone()),
            ..defaults
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        match &self.log_file {
            Some(path) => LogDestination::Both(path.clone()),
            None => LogDestination::Terminal,
        }
    }
}

fn parse_level(value: &str) -> Result<LevelFilter, String> {
    grabber_logging::parse_level(value).ok_or_else(|| format!("unknown log level {value:?}"))
}
