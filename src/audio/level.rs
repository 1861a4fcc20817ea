//! Loudness measures used by silence detection.

use crate::defaults::FULL_SCALE;
use serde::{Deserialize, Serialize};

/// How a window of samples is reduced to a single level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelMetric {
    /// Largest absolute sample value in the window.
    #[default]
    Peak,
    /// Root mean square of the window.
    Rms,
}

impl std::fmt::Display for LevelMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LevelMetric::Peak => f.write_str("peak"),
            LevelMetric::Rms => f.write_str("rms"),
        }
    }
}

impl std::str::FromStr for LevelMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "peak" => Ok(LevelMetric::Peak),
            "rms" => Ok(LevelMetric::Rms),
            other => Err(format!("unknown level metric '{}' (expected peak or rms)", other)),
        }
    }
}

/// Converts a dBFS value to a raw 16-bit amplitude.
pub fn db_to_amplitude(db: f64) -> f64 {
    10f64.powf(db / 20.0) * FULL_SCALE
}

/// Largest absolute sample value.
pub fn peak(samples: &[i16]) -> u16 {
    samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0)
}

/// Root mean square in raw sample units (0 for an empty slice).
pub fn rms(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    (sum_of_squares(samples) as f64 / samples.len() as f64).sqrt()
}

/// Sum of squared sample values.
pub fn sum_of_squares(samples: &[i16]) -> u64 {
    samples.iter().map(|&s| (s as i64 * s as i64) as u64).sum()
}

/// Level of a window according to `metric`, in raw sample units.
pub fn measure(samples: &[i16], metric: LevelMetric) -> f64 {
    match metric {
        LevelMetric::Peak => peak(samples) as f64,
        LevelMetric::Rms => rms(samples),
    }
}
