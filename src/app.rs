//! Dubbing application entry point.
//!
//! Wires the configuration, the ffmpeg backend and the remote services into
//! a pipeline and runs one job: extract → segment → transform → composite → mux

use crate::cli::DubArgs;
use crate::config::Config;
use crate::dub::{DubArtifacts, DubRequest, dub_video};
use crate::error::Result;
use crate::language::Language;
use crate::media::{FfmpegMedia, MediaBackend};
use crate::pipeline::{DubPipeline, LogObserver, ProgressEvent, ProgressObserver};
use crate::services::{GoogleTranslator, GoogleTts, OpenAiTranscriber, Services};
use crate::stretch::create_stretcher;
use crate::subtitle::SrtDocument;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Apply `dub` command-line options on top of the loaded configuration.
pub fn apply_dub_overrides(config: &mut Config, args: &DubArgs) {
    if let Some(language) = args.language {
        config.dub.target_language = language;
    }
    if let Some(ms) = args.min_silence {
        config.segmenter.min_silence_ms = ms;
    }
    if let Some(db) = args.silence_thresh {
        config.segmenter.silence_thresh_db = db;
    }
    if let Some(level) = args.level {
        config.segmenter.level = level;
    }
    if let Some(dir) = &args.output_dir {
        config.dub.output_dir = Some(dir.clone());
    }
    if let Some(workers) = args.workers {
        config.pipeline.workers = workers;
    }
    if let Some(timeout) = args.segment_timeout {
        config.pipeline.segment_timeout_secs = timeout.as_secs().max(1);
    }
    if let Some(backend) = args.stretch {
        config.stretch.backend = backend;
    }
}

/// Where the artifacts go: the configured directory, else next to the input.
pub fn resolve_output_dir(config: &Config, input: &Path) -> PathBuf {
    if let Some(dir) = &config.dub.output_dir {
        return dir.clone();
    }
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Run the dub command.
///
/// # Arguments
/// * `config` - Base configuration (overridden by `args`)
/// * `args` - Options given on the command line
/// * `quiet` - Suppress the progress bar and summary
pub async fn run_dub_command(mut config: Config, args: DubArgs, quiet: bool) -> Result<DubArtifacts> {
    apply_dub_overrides(&mut config, &args);
    config.validate()?;
    let api_key = config.require_api_key()?.to_string();

    let media: Arc<dyn MediaBackend> =
        Arc::new(FfmpegMedia::new(&config.media.ffmpeg, &config.media.ffprobe));
    let services = Services::new(
        Arc::new(OpenAiTranscriber::new(
            &config.services.openai_base_url,
            &api_key,
            &config.services.transcription_model,
        )?),
        Arc::new(GoogleTranslator::new(&config.services.translate_url)?),
        Arc::new(GoogleTts::new(
            &config.services.tts_url,
            Arc::clone(&media),
            config.media.sample_rate,
        )?),
    );
    let stretcher = create_stretcher(config.stretch.backend, &config.media.ffmpeg);
    log::debug!("Services: {:?}, stretcher: {}", services, stretcher.name());

    let observer: Arc<dyn ProgressObserver> = if quiet {
        Arc::new(LogObserver)
    } else {
        Arc::new(ProgressBarObserver::new())
    };
    let pipeline =
        DubPipeline::new(config.pipeline_config(), services, stretcher).with_observer(observer);

    let request = DubRequest {
        output_dir: resolve_output_dir(&config, &args.input),
        input: args.input,
        language: config.dub.target_language,
        sample_rate: config.media.sample_rate,
    };

    if !quiet {
        eprintln!(
            "Dubbing {} into {}...",
            request.input.display(),
            request.language.name()
        );
    }

    let artifacts = dub_video(&request, media.as_ref(), &pipeline).await?;

    if !quiet {
        let total = artifacts.output.reports.len();
        let degraded = artifacts.output.degraded_segments();
        eprintln!("{} {}", "✓".green(), artifacts.video.display());
        eprintln!("{} {}", "✓".green(), artifacts.subtitles.display());
        if degraded > 0 {
            eprintln!(
                "{}",
                format!("{} of {} segment(s) used a fallback", degraded, total).yellow()
            );
        }
    }

    Ok(artifacts)
}

/// Progress bar over the segments of a run.
pub struct ProgressBarObserver {
    bar: ProgressBar,
}

impl ProgressBarObserver {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} segments {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }
}

impl Default for ProgressBarObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ProgressBarObserver {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Segmented { count, .. } => {
                self.bar.set_length(*count as u64);
                self.bar.set_message("transcribing");
            }
            ProgressEvent::SegmentStarted { .. } => {}
            ProgressEvent::SegmentFinished { report } => {
                if report.is_degraded() {
                    self.bar.println(format!(
                        "segment {} ({}): fallback used",
                        report.index, report.interval
                    ));
                }
                self.bar.inc(1);
            }
            ProgressEvent::CompositingStarted => self.bar.set_message("compositing"),
            ProgressEvent::CompositingFinished { .. } => self.bar.finish_with_message("done"),
        }
    }
}

/// Print the supported target languages.
pub fn print_languages(current: Language) {
    println!("Supported languages (current: {}):", current.code().green());
    for language in Language::ALL {
        if language == current {
            println!("  {} {:<6} {}", "●".green(), language.code(), language.name());
        } else {
            println!("  ○ {:<6} {}", language.code(), language.name());
        }
    }
}

/// Parse a subtitle file and print a summary of it.
pub fn inspect_subtitles(path: &Path) -> Result<SrtDocument> {
    let document = SrtDocument::read(path)?;
    println!("{}: {} cue(s)", path.display(), document.len());
    if let Some((start, end)) = document.span() {
        println!(
            "  {}  {} → {}",
            "Span:".dimmed(),
            crate::subtitle::format_timestamp(start),
            crate::subtitle::format_timestamp(end)
        );
    }
    let empty = document.cues().iter().filter(|c| c.text.trim().is_empty()).count();
    if empty > 0 {
        println!("  {} {}", "Empty cues:".dimmed(), empty);
    }
    Ok(document)
}
