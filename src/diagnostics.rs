//! System diagnostics and dependency checking.
//!
//! Verifies that the media tools and service credentials a dub needs are in place.

use crate::config::Config;
use owo_colors::OwoColorize;
use std::path::Path;
use std::process::Command;

/// Result of a dependency check.
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Tool is installed and working
    Ok(String),
    /// Tool is not found
    NotFound,
    /// Tool is found but has issues
    Warning(String),
}

/// First line of a `-version` banner, e.g. `ffmpeg version 6.1.1`.
pub fn version_line(stdout: &str) -> String {
    let line = stdout.lines().next().unwrap_or("").trim();
    // "ffmpeg version 6.1.1-3ubuntu5 Copyright (c) ..." → drop the copyright tail
    match line.find(" Copyright") {
        Some(idx) => line[..idx].to_string(),
        None => line.to_string(),
    }
}

/// Check that a media tool runs and report its version.
pub fn check_tool(tool: &Path) -> CheckResult {
    match Command::new(tool).arg("-version").output() {
        Ok(output) if output.status.success() => {
            CheckResult::Ok(version_line(&String::from_utf8_lossy(&output.stdout)))
        }
        Ok(_) => CheckResult::Warning(format!("'{}' found but -version failed", tool.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckResult::NotFound,
        Err(e) => CheckResult::Warning(format!("Error checking '{}': {}", tool.display(), e)),
    }
}

/// Check whether a transcription API key is configured.
pub fn check_api_key(config: &Config) -> CheckResult {
    match config.require_api_key() {
        Ok(_) => CheckResult::Ok("configured".to_string()),
        Err(_) => CheckResult::NotFound,
    }
}

fn report(label: &str, result: &CheckResult, missing_hint: &str) -> bool {
    print!("{}: ", label);
    match result {
        CheckResult::Ok(detail) => {
            println!("{} OK ({})", "✓".green(), detail);
            true
        }
        CheckResult::NotFound => {
            println!("{} NOT FOUND", "✗".red());
            println!("  {}", missing_hint);
            false
        }
        CheckResult::Warning(msg) => {
            println!("{} WARNING: {}", "⚠".yellow(), msg);
            false
        }
    }
}

/// Run all dependency checks and print results.
///
/// Returns `true` when everything a dub needs is available.
pub fn check_dependencies(config: &Config) -> bool {
    println!("redub {}", crate::version_string());
    println!("Checking system dependencies...\n");

    let ffmpeg = report(
        "ffmpeg",
        &check_tool(&config.media.ffmpeg),
        "Install: sudo apt install ffmpeg  (or set media.ffmpeg / REDUB_FFMPEG)",
    );
    let ffprobe = report(
        "ffprobe",
        &check_tool(&config.media.ffprobe),
        "Usually ships with ffmpeg (or set media.ffprobe / REDUB_FFPROBE)",
    );
    let api_key = report(
        "Transcription API key",
        &check_api_key(config),
        "Export OPENAI_API_KEY or set services.openai_api_key in the config file",
    );

    println!();
    let ready = ffmpeg && ffprobe && api_key;
    if ready {
        println!("{}", "All dependencies satisfied.".green());
    } else {
        println!("{}", "Some dependencies are missing; `redub dub` will fail.".red());
    }
    ready
}
