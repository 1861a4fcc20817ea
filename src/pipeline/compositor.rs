//! Timeline reconstruction.

use crate::audio::AudioTrack;

/// Lays clips onto a silent base of `total_duration_ms` at their start offsets.
///
/// Clips are summed into the base with saturation. Anything that would land
/// past the end is discarded, so the result is always exactly
/// `total_duration_ms` long. Clips at another sample rate are resampled first.
pub fn composite<'a, I>(total_duration_ms: u64, sample_rate: u32, clips: I) -> AudioTrack
where
    I: IntoIterator<Item = (&'a AudioTrack, u64)>,
{
    let mut timeline = AudioTrack::silent(total_duration_ms, sample_rate);
    for (clip, start_ms) in clips {
        if start_ms >= total_duration_ms || clip.is_empty() {
            continue;
        }
        if clip.sample_rate() == sample_rate {
            timeline.overlay(clip, start_ms);
        } else {
            timeline.overlay(&clip.clone().resampled(sample_rate), start_ms);
        }
    }
    timeline
}
