//! WAV decoding and encoding for audio tracks.
//!
//! Any channel count is downmixed to mono. Integer PCM of 8 to 32 bits and
//! 32-bit float are accepted; everything is converted to 16-bit.

use crate::audio::track::AudioTrack;
use crate::error::{DubError, Result};
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

/// Decodes a WAV stream into a mono track at the file's own sample rate.
pub fn read_track<R: Read>(reader: R) -> Result<AudioTrack> {
    let mut wav_reader = hound::WavReader::new(reader).map_err(|e| DubError::AudioDecode {
        message: format!("Failed to parse WAV file: {}", e),
    })?;

    let spec = wav_reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<i16> = match spec.sample_format {
        hound::SampleFormat::Int if spec.bits_per_sample <= 16 => {
            let shift = 16 - spec.bits_per_sample as u32;
            wav_reader
                .samples::<i16>()
                .map(|s| s.map(|v| v << shift))
                .collect::<std::result::Result<Vec<_>, _>>()
        }
        hound::SampleFormat::Int => {
            let shift = spec.bits_per_sample as u32 - 16;
            wav_reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v >> shift) as i16))
                .collect::<std::result::Result<Vec<_>, _>>()
        }
        hound::SampleFormat::Float => wav_reader
            .samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
            .collect::<std::result::Result<Vec<_>, _>>(),
    }
    .map_err(|e| DubError::AudioDecode {
        message: format!("Failed to read WAV samples: {}", e),
    })?;

    let mono = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    };

    Ok(AudioTrack::new(mono, spec.sample_rate))
}

/// Decodes a WAV file from disk.
pub fn read_track_from_path(path: &Path) -> Result<AudioTrack> {
    let file = File::open(path).map_err(|e| DubError::AudioDecode {
        message: format!("Failed to open {}: {}", path.display(), e),
    })?;
    read_track(BufReader::new(file))
}

fn wav_spec(track: &AudioTrack) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate: track.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

fn encode_error(e: hound::Error) -> DubError {
    DubError::AudioEncode {
        message: e.to_string(),
    }
}

/// Encodes a track as a 16-bit mono WAV byte buffer.
pub fn encode_wav(track: &AudioTrack) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, wav_spec(track)).map_err(encode_error)?;
        for &sample in track.samples() {
            writer.write_sample(sample).map_err(encode_error)?;
        }
        writer.finalize().map_err(encode_error)?;
    }
    Ok(cursor.into_inner())
}

/// Writes a track to disk as a 16-bit mono WAV file.
pub fn write_track(track: &AudioTrack, path: &Path) -> Result<()> {
    let mut writer = hound::WavWriter::create(path, wav_spec(track)).map_err(encode_error)?;
    for &sample in track.samples() {
        writer.write_sample(sample).map_err(encode_error)?;
    }
    writer.finalize().map_err(encode_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_wav_data(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn read_mono_matches_exactly() {
        let input_samples = vec![100i16, 200, 300, 400, 500];
        let wav_data = make_wav_data(16000, 1, &input_samples);

        let track = read_track(Cursor::new(wav_data)).unwrap();

        assert_eq!(track.samples(), input_samples.as_slice());
        assert_eq!(track.sample_rate(), 16000);
    }

    #[test]
    fn read_stereo_downmixes_to_mono() {
        // Stereo pairs: (100, 200), (300, 400), (500, 600)
        let wav_data = make_wav_data(44100, 2, &[100i16, 200, 300, 400, 500, 600]);

        let track = read_track(Cursor::new(wav_data)).unwrap();

        assert_eq!(track.samples(), &[150i16, 350, 550]);
        assert_eq!(track.sample_rate(), 44100);
    }

    #[test]
    fn read_six_channels_downmixes_to_mono() {
        let wav_data = make_wav_data(48000, 6, &[60i16, 60, 60, 60, 60, 60, -6, -6, -6, -6, -6, -6]);

        let track = read_track(Cursor::new(wav_data)).unwrap();

        assert_eq!(track.samples(), &[60i16, -6]);
    }

    #[test]
    fn read_float_wav_scales_to_i16() {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 24000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for s in [0.0f32, 0.5, -1.0, 2.0] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let track = read_track(Cursor::new(cursor.into_inner())).unwrap();

        assert_eq!(track.samples(), &[0i16, 16383, -32767, 32767]);
    }

    #[test]
    fn encode_then_read_preserves_track() {
        let track = AudioTrack::new(vec![1, -1, 1000, -1000, i16::MAX, i16::MIN], 22050);
        let bytes = encode_wav(&track).unwrap();
        assert_eq!(read_track(Cursor::new(bytes)).unwrap(), track);
    }

    #[test]
    fn write_track_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let track = AudioTrack::silent(250, 16000);

        write_track(&track, &path).unwrap();
        let back = read_track_from_path(&path).unwrap();

        assert_eq!(back.duration_ms(), 250);
    }

    #[test]
    fn invalid_wav_data_returns_error() {
        let result = read_track(Cursor::new(vec![0u8, 1, 2, 3, 4, 5]));

        match result {
            Err(DubError::AudioDecode { message }) => {
                assert!(message.contains("Failed to parse WAV file"));
            }
            other => panic!("Expected AudioDecode error, got {:?}", other),
        }
    }

    #[test]
    fn missing_file_returns_decode_error() {
        let result = read_track_from_path(Path::new("/nonexistent/redub/input.wav"));
        assert!(matches!(result, Err(DubError::AudioDecode { .. })));
    }
}
