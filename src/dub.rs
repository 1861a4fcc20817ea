//! Video-level dubbing: demux, run the pipeline, remux.
//!
//! Every intermediate file lives in a temporary work directory. The dubbed
//! video and its subtitles are copied into the output directory only after
//! every step succeeded.

use crate::audio::{AudioTrack, wav};
use crate::defaults::{DURATION_TOLERANCE_MS, SUPPORTED_CONTAINERS};
use crate::error::{DubError, Result};
use crate::language::Language;
use crate::media::MediaBackend;
use crate::pipeline::{DubOutput, DubPipeline};
use std::path::{Path, PathBuf};

/// One dubbing job.
#[derive(Debug, Clone)]
pub struct DubRequest {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub language: Language,
    /// Rate the audio is extracted at and the dub is rendered at.
    pub sample_rate: u32,
}

/// Files written by a successful job.
#[derive(Debug, Clone)]
pub struct DubArtifacts {
    pub video: PathBuf,
    pub subtitles: PathBuf,
    pub output: DubOutput,
}

/// Lowercased container extension of `input`, if it is one we accept.
pub fn check_container(input: &Path) -> Result<String> {
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| SUPPORTED_CONTAINERS.contains(&e.as_str()));
    ext.ok_or_else(|| DubError::UnsupportedContainer {
        path: input.display().to_string(),
    })
}

/// File names of the artifacts: `<stem>.<lang>.<ext>` and `<stem>.<lang>.srt`.
pub fn artifact_names(input: &Path, language: Language) -> Result<(String, String)> {
    let ext = check_container(input)?;
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DubError::UnsupportedContainer {
            path: input.display().to_string(),
        })?;
    Ok((
        format!("{}.{}.{}", stem, language.code(), ext),
        format!("{}.{}.srt", stem, language.code()),
    ))
}

/// Runs a complete job.
pub async fn dub_video(
    request: &DubRequest,
    media: &dyn MediaBackend,
    pipeline: &DubPipeline,
) -> Result<DubArtifacts> {
    let (video_name, srt_name) = artifact_names(&request.input, request.language)?;
    if !tokio::fs::try_exists(&request.input).await? {
        return Err(DubError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input not found: {}", request.input.display()),
        )));
    }

    let work = tempfile::tempdir()?;
    let extracted = work.path().join("source.wav");
    log::info!("Extracting audio from {}", request.input.display());
    media
        .extract_audio(&request.input, &extracted, request.sample_rate)
        .await?;

    let reported_secs = media.probe_duration(&extracted).await?;
    let track = tokio::task::spawn_blocking(move || wav::read_track_from_path(&extracted))
        .await
        .map_err(|e| DubError::Other(format!("Audio decode task failed: {}", e)))??;
    let track = reconcile_duration(track.resampled(request.sample_rate), reported_secs);

    let output = pipeline.run(track).await?;

    let dubbed_audio = work.path().join("dub.wav");
    let srt_path = work.path().join(&srt_name);
    let video_only = work.path().join(format!("video_only.{}", check_container(&request.input)?));
    let muxed = work.path().join(&video_name);

    let timeline = output.timeline.clone();
    let audio_target = dubbed_audio.clone();
    tokio::task::spawn_blocking(move || wav::write_track(&timeline, &audio_target))
        .await
        .map_err(|e| DubError::Other(format!("Audio encode task failed: {}", e)))??;
    output.subtitles.write(&srt_path)?;

    log::info!("Muxing dubbed audio into {}", video_name);
    media.strip_audio(&request.input, &video_only).await?;
    media.mux(&video_only, &dubbed_audio, &muxed).await?;

    tokio::fs::create_dir_all(&request.output_dir).await?;
    let subtitles = publish(&srt_path, &request.output_dir, &srt_name).await?;
    let video = match publish(&muxed, &request.output_dir, &video_name).await {
        Ok(video) => video,
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&subtitles).await {
                log::debug!("Could not remove {}: {}", subtitles.display(), cleanup);
            }
            return Err(e);
        }
    };

    log::info!("Wrote {} and {}", video.display(), subtitles.display());
    Ok(DubArtifacts {
        video,
        subtitles,
        output,
    })
}

/// Sizes the decoded soundtrack by the length the media tool reports for it.
///
/// Small differences are rounding and keep the decoded length. Larger ones
/// pad or truncate the track to the reported length.
pub fn reconcile_duration(track: AudioTrack, reported_secs: f64) -> AudioTrack {
    let reported_ms = (reported_secs * 1000.0).round() as u64;
    let decoded_ms = track.duration_ms();
    if reported_ms.abs_diff(decoded_ms) <= DURATION_TOLERANCE_MS {
        return track;
    }
    log::warn!(
        "Soundtrack decodes to {} ms but is reported as {} ms; using the reported length",
        decoded_ms,
        reported_ms
    );
    track.fit_to(reported_ms)
}

/// Copies `source` into `dir` under `name`, via a hidden partial file and a rename.
async fn publish(source: &Path, dir: &Path, name: &str) -> Result<PathBuf> {
    let partial = dir.join(format!(".{}.partial", name));
    let target = dir.join(name);
    tokio::fs::copy(source, &partial).await?;
    if let Err(e) = tokio::fs::rename(&partial, &target).await {
        if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
            log::debug!("Could not remove {}: {}", partial.display(), cleanup);
        }
        return Err(e.into());
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_containers_are_accepted() {
        for name in ["a.mp4", "b.MOV", "c.avi", "d.mkv", "e.webm"] {
            assert!(check_container(Path::new(name)).is_ok(), "{}", name);
        }
        assert_eq!(check_container(Path::new("clip.MKV")).unwrap(), "mkv");
    }

    #[test]
    fn test_unsupported_container_is_rejected() {
        for name in ["a.flv", "b", "c.mp3", ".mp4x"] {
            assert!(matches!(
                check_container(Path::new(name)),
                Err(DubError::UnsupportedContainer { .. })
            ));
        }
    }

    #[test]
    fn test_artifact_names() {
        let (video, srt) = artifact_names(Path::new("/videos/talk.final.mp4"), Language::Hindi).unwrap();
        assert_eq!(video, "talk.final.hi.mp4");
        assert_eq!(srt, "talk.final.hi.srt");

        let (video, _) = artifact_names(Path::new("clip.WEBM"), Language::Chinese).unwrap();
        assert_eq!(video, "clip.zh-CN.webm");
    }

    #[test]
    fn test_reconcile_duration_keeps_rounding_differences() {
        let track = AudioTrack::silent(10_000, 16_000);
        assert_eq!(reconcile_duration(track.clone(), 10.02).duration_ms(), 10_000);
        assert_eq!(reconcile_duration(track, 9.97).duration_ms(), 10_000);
    }

    #[test]
    fn test_reconcile_duration_follows_reported_length() {
        let track = AudioTrack::new(vec![100; 16_000], 16_000);

        let padded = reconcile_duration(track.clone(), 1.5);
        assert_eq!(padded.duration_ms(), 1500);
        assert!(padded.samples()[16_000..].iter().all(|&s| s == 0));

        assert_eq!(reconcile_duration(track, 0.5).duration_ms(), 500);
    }

    #[tokio::test]
    async fn test_publish_leaves_no_partial_file() {
        let src_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("x.srt");
        std::fs::write(&source, "data").unwrap();

        let target = publish(&source, out_dir.path(), "x.hi.srt").await.unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "data");
        let names: Vec<String> = std::fs::read_dir(out_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["x.hi.srt"]);
    }
}
