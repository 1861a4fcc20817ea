//! Command-line interface for redub
//!
//! Provides argument parsing using clap derive macros.

use crate::audio::LevelMetric;
use crate::defaults;
use crate::language::Language;
use crate::stretch::StretchBackend;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Re-dub a video into another language
#[derive(Parser, Debug)]
#[command(
    name = "redub",
    version,
    about = "Re-dub a video into another language with synchronized subtitles"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a silence threshold in dBFS, limited to -80..=0.
fn parse_silence_thresh(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .trim_end_matches("dB")
        .trim_end_matches("db")
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    let (low, high) = defaults::SILENCE_THRESH_RANGE_DB;
    if !(low..=high).contains(&value) {
        return Err(format!("{} is outside {}..={} dB", value, low, high));
    }
    Ok(value)
}

/// Parse a per-segment timeout.
///
/// Supports any duration format accepted by `humantime`: bare numbers (seconds),
/// single-unit (`30s`, `5m`), and compound (`1m30s`).
fn parse_timeout(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    // Bare number → seconds
    let duration = match s.parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => humantime::parse_duration(s).map_err(|e| e.to_string())?,
    };
    if duration.is_zero() {
        return Err("timeout must be greater than zero".to_string());
    }
    Ok(duration)
}

/// Options of the `dub` command; unset values come from the config file.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct DubArgs {
    /// Input video (mp4, mov, avi, mkv, webm)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Target language code (see `redub languages`)
    #[arg(short, long, value_name = "LANG")]
    pub language: Option<Language>,

    /// Minimum silence between segments in ms (100-20000)
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u32).range(100..=20_000))]
    pub min_silence: Option<u32>,

    /// Silence threshold in dBFS (-80 to 0)
    #[arg(long, value_name = "DB", allow_negative_numbers = true, value_parser = parse_silence_thresh)]
    pub silence_thresh: Option<f64>,

    /// Directory for the dubbed video and subtitles (default: next to the input)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Segments processed concurrently (1-64)
    #[arg(long, value_name = "N", value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..=64))]
    pub workers: Option<usize>,

    /// Per-segment time budget. Examples: 90, 90s, 2m
    #[arg(long, value_name = "DURATION", value_parser = parse_timeout)]
    pub segment_timeout: Option<Duration>,

    /// Time-stretch backend (native, ffmpeg)
    #[arg(long, value_name = "BACKEND")]
    pub stretch: Option<StretchBackend>,

    /// Window level used for silence detection (peak, rms)
    #[arg(long, value_name = "METRIC")]
    pub level: Option<LevelMetric>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dub a video into another language
    Dub(DubArgs),

    /// List supported target languages
    Languages,

    /// Check system dependencies
    Check,

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Validate a subtitle file and summarize it
    Subtitles {
        /// SubRip file to inspect
        #[arg(value_name = "SRT")]
        file: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
}
