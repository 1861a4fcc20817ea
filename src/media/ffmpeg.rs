//! ffmpeg / ffprobe subprocess adapter.

use super::MediaBackend;
use crate::audio::{AudioTrack, wav};
use crate::defaults::{MUX_AUDIO_CODEC, WEBM_AUDIO_CODEC};
use crate::error::{DubError, Result};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;

/// Lines of stderr kept in error messages.
const STDERR_TAIL_LINES: usize = 12;

/// Media backend driving the ffmpeg and ffprobe executables.
#[derive(Debug, Clone)]
pub struct FfmpegMedia {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for FfmpegMedia {
    fn default() -> Self {
        Self::new(Path::new("ffmpeg"), Path::new("ffprobe"))
    }
}

impl FfmpegMedia {
    pub fn new(ffmpeg: &Path, ffprobe: &Path) -> Self {
        Self {
            ffmpeg: ffmpeg.to_path_buf(),
            ffprobe: ffprobe.to_path_buf(),
        }
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.ffmpeg
    }

    pub fn ffprobe(&self) -> &Path {
        &self.ffprobe
    }

    async fn run(&self, tool: &Path, args: Vec<OsString>) -> Result<Output> {
        log::debug!(
            "{} {}",
            tool.display(),
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let output = Command::new(tool)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DubError::MediaToolNotFound {
                        tool: tool.display().to_string(),
                    }
                } else {
                    DubError::MediaCommand {
                        tool: tool_name(tool),
                        message: format!("failed to start: {}", e),
                    }
                }
            })?;

        if !output.status.success() {
            return Err(DubError::MediaCommand {
                tool: tool_name(tool),
                message: format!("{}: {}", output.status, stderr_tail(&output.stderr)),
            });
        }
        Ok(output)
    }
}

#[async_trait::async_trait]
impl MediaBackend for FfmpegMedia {
    async fn extract_audio(&self, video: &Path, output: &Path, sample_rate: u32) -> Result<()> {
        self.run(&self.ffmpeg, extract_args(video, output, sample_rate))
            .await
            .map(|_| ())
    }

    async fn probe_duration(&self, media: &Path) -> Result<f64> {
        let output = self.run(&self.ffprobe, probe_args(media)).await.map_err(|e| match e {
            DubError::MediaCommand { message, .. } => DubError::Probe { message },
            other => other,
        })?;
        parse_duration(&String::from_utf8_lossy(&output.stdout))
    }

    async fn strip_audio(&self, video: &Path, output: &Path) -> Result<()> {
        self.run(&self.ffmpeg, strip_args(video, output))
            .await
            .map(|_| ())
    }

    async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        match self.run(&self.ffmpeg, mux_args(video, audio, output, false)).await {
            Ok(_) => Ok(()),
            Err(DubError::MediaCommand { message, .. }) => {
                log::warn!("Mux failed, retrying with explicit stream mapping: {}", message);
                self.run(&self.ffmpeg, mux_args(video, audio, output, true))
                    .await
                    .map(|_| ())
            }
            Err(e) => Err(e),
        }
    }

    async fn transcode_to_wav(&self, encoded: &[u8], sample_rate: u32) -> Result<AudioTrack> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("speech.bin");
        let output = dir.path().join("speech.wav");
        tokio::fs::write(&input, encoded).await?;

        self.run(&self.ffmpeg, extract_args(&input, &output, sample_rate))
            .await?;

        let track = tokio::task::spawn_blocking(move || wav::read_track_from_path(&output))
            .await
            .map_err(|e| DubError::Other(format!("WAV decode task failed: {}", e)))??;
        drop(dir);
        Ok(track)
    }
}

fn tool_name(tool: &Path) -> String {
    tool.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| tool.display().to_string())
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

fn args<I, S>(items: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    items.into_iter().map(|s| s.as_ref().to_os_string()).collect()
}

/// `ffmpeg -i <in> -vn -ac 1 -ar <rate> -acodec pcm_s16le <out>`
pub fn extract_args(input: &Path, output: &Path, sample_rate: u32) -> Vec<OsString> {
    let rate = sample_rate.to_string();
    args([
        OsStr::new("-y"),
        OsStr::new("-hide_banner"),
        OsStr::new("-loglevel"),
        OsStr::new("error"),
        OsStr::new("-i"),
        input.as_os_str(),
        OsStr::new("-vn"),
        OsStr::new("-ac"),
        OsStr::new("1"),
        OsStr::new("-ar"),
        OsStr::new(&rate),
        OsStr::new("-acodec"),
        OsStr::new("pcm_s16le"),
        output.as_os_str(),
    ])
}

pub fn probe_args(media: &Path) -> Vec<OsString> {
    args([
        OsStr::new("-v"),
        OsStr::new("error"),
        OsStr::new("-show_entries"),
        OsStr::new("format=duration"),
        OsStr::new("-of"),
        OsStr::new("default=noprint_wrappers=1:nokey=1"),
        media.as_os_str(),
    ])
}

pub fn strip_args(video: &Path, output: &Path) -> Vec<OsString> {
    args([
        OsStr::new("-y"),
        OsStr::new("-hide_banner"),
        OsStr::new("-loglevel"),
        OsStr::new("error"),
        OsStr::new("-i"),
        video.as_os_str(),
        OsStr::new("-an"),
        OsStr::new("-c:v"),
        OsStr::new("copy"),
        output.as_os_str(),
    ])
}

/// Mux arguments; `explicit_map` pins the first video and first audio stream.
pub fn mux_args(video: &Path, audio: &Path, output: &Path, explicit_map: bool) -> Vec<OsString> {
    let mut list = args([
        OsStr::new("-y"),
        OsStr::new("-hide_banner"),
        OsStr::new("-loglevel"),
        OsStr::new("error"),
        OsStr::new("-i"),
        video.as_os_str(),
        OsStr::new("-i"),
        audio.as_os_str(),
    ]);
    if explicit_map {
        list.extend(args(["-map", "0:v:0", "-map", "1:a:0"]));
    }
    list.extend(args(["-c:v", "copy", "-c:a", mux_audio_codec(output), "-shortest"]));
    list.push(output.as_os_str().to_os_string());
    list
}

/// Audio codec the output container can hold.
pub fn mux_audio_codec(output: &Path) -> &'static str {
    match output.extension().and_then(OsStr::to_str) {
        Some(ext) if ext.eq_ignore_ascii_case("webm") => WEBM_AUDIO_CODEC,
        _ => MUX_AUDIO_CODEC,
    }
}

/// Parses ffprobe's bare `format=duration` output.
pub fn parse_duration(stdout: &str) -> Result<f64> {
    let value = stdout.trim();
    let seconds = value.parse::<f64>().map_err(|_| DubError::Probe {
        message: format!("unexpected ffprobe output '{}'", value),
    })?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(DubError::Probe {
            message: format!("invalid duration {}", seconds),
        });
    }
    Ok(seconds)
}
