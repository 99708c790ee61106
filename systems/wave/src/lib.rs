#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Randomized cyclic wave generator.
//!
//! Each cycle climbs with half-normal increments, falls with half-normal
//! decrements, is rescaled into `[min, peak]` with its maximum pinned to the
//! peak, and finally receives uniform noise before being clamped back into
//! range. Records left over after the last full cycle stay at the minimum.

use chrono::NaiveDate;
use rand::Rng;
use rand_distr::{Distribution, Normal, NormalError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest accepted randomness level.
pub const MIN_RANDOMNESS: u8 = 1;
/// Highest accepted randomness level.
pub const MAX_RANDOMNESS: u8 = 10;
/// Lowest accepted minimum fraction of the peak.
pub const MIN_FRACTION_LOWER: f64 = 0.1;
/// Highest accepted minimum fraction of the peak.
pub const MIN_FRACTION_UPPER: f64 = 0.5;

/// Validated wave parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWaveConfig")]
pub struct WaveConfig {
    length: usize,
    cycles: usize,
    peak: u32,
    randomness: u8,
    min_fraction: f64,
}

#[derive(Deserialize)]
struct RawWaveConfig {
    length: usize,
    cycles: usize,
    peak: u32,
    randomness: u8,
    min_fraction: f64,
}

impl TryFrom<RawWaveConfig> for WaveConfig {
    type Error = WaveError;

    fn try_from(raw: RawWaveConfig) -> Result<Self, Self::Error> {
        WaveConfig::new(
            raw.length,
            raw.cycles,
            raw.peak,
            raw.randomness,
            raw.min_fraction,
        )
    }
}

impl WaveConfig {
    /// Creates a configuration, rejecting out-of-range parameters.
    pub fn new(
        length: usize,
        cycles: usize,
        peak: u32,
        randomness: u8,
        min_fraction: f64,
    ) -> Result<Self, WaveError> {
        if peak == 0 {
            return Err(WaveError::ZeroPeak);
        }
        if cycles == 0 || cycles > length {
            return Err(WaveError::InvalidCycles { cycles, length });
        }
        if !(MIN_RANDOMNESS..=MAX_RANDOMNESS).contains(&randomness) {
            return Err(WaveError::RandomnessOutOfRange { randomness });
        }
        if !(MIN_FRACTION_LOWER..=MIN_FRACTION_UPPER).contains(&min_fraction) {
            return Err(WaveError::MinFractionOutOfRange { min_fraction });
        }
        Ok(Self {
            length,
            cycles,
            peak,
            randomness,
            min_fraction,
        })
    }

    /// Total number of generated values.
    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Number of full cycles.
    #[must_use]
    pub const fn cycles(&self) -> usize {
        self.cycles
    }

    /// Value every cycle is scaled to touch.
    #[must_use]
    pub const fn peak(&self) -> u32 {
        self.peak
    }

    /// Spread of the step distribution and amplitude of the noise.
    #[must_use]
    pub const fn randomness(&self) -> u8 {
        self.randomness
    }

    /// Floor of the wave as a fraction of the peak.
    #[must_use]
    pub const fn min_fraction(&self) -> f64 {
        self.min_fraction
    }

    /// Absolute floor of the wave.
    #[must_use]
    pub fn min_value(&self) -> f64 {
        f64::from(self.peak) * self.min_fraction
    }

    /// Number of values per cycle, truncated.
    #[must_use]
    pub const fn cycle_length(&self) -> usize {
        self.length / self.cycles
    }
}

/// Invalid wave parameter.
#[derive(Debug, Error)]
pub enum WaveError {
    /// The peak was zero.
    #[error("wave peak must be a positive integer")]
    ZeroPeak,
    /// The cycle count was zero or larger than the number of records.
    #[error("cycle count {cycles} must be between 1 and the record count {length}")]
    InvalidCycles {
        /// Requested cycles.
        cycles: usize,
        /// Requested record count.
        length: usize,
    },
    /// Randomness outside `1..=10`.
    #[error("randomness level {randomness} must be between 1 and 10")]
    RandomnessOutOfRange {
        /// Requested level.
        randomness: u8,
    },
    /// Minimum fraction outside `0.1..=0.5`.
    #[error("minimum fraction {min_fraction} must be between 0.1 and 0.5")]
    MinFractionOutOfRange {
        /// Requested fraction.
        min_fraction: f64,
    },
    /// The step distribution rejected its parameters.
    #[error("invalid step distribution: {0}")]
    Distribution(#[from] NormalError),
}

/// Wave value attached to a calendar day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DatedLevel {
    date: NaiveDate,
    level: u32,
}

impl DatedLevel {
    /// Calendar day.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Rounded wave value.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }
}

/// Generates `config.length()` wave values.
pub fn generate_wave<R: Rng + ?Sized>(
    config: &WaveConfig,
    rng: &mut R,
) -> Result<Vec<f64>, WaveError> {
    let peak = f64::from(config.peak());
    let min_value = config.min_value();
    let randomness = f64::from(config.randomness());
    let cycle_length = config.cycle_length();

    let mut values = vec![min_value; config.length()];
    let step = Normal::new(peak / cycle_length as f64, randomness)?;

    for cycle in values.chunks_exact_mut(cycle_length).take(config.cycles()) {
        let half = cycle_length / 2;
        let mut level = 0.0;
        for (index, slot) in cycle.iter_mut().enumerate() {
            let magnitude = step.sample(rng).abs();
            level += if index < half { magnitude } else { -magnitude };
            *slot = level;
        }

        rescale(cycle, min_value, peak);

        for slot in cycle.iter_mut() {
            let noise = rng.gen_range(-randomness..randomness);
            *slot = (*slot + noise).clamp(min_value, peak);
        }
    }

    Ok(values)
}

/// Maps the cycle onto `[min_value, peak]` and pins its maximum to the peak.
fn rescale(cycle: &mut [f64], min_value: f64, peak: f64) {
    let low = cycle.iter().copied().fold(f64::INFINITY, f64::min);
    let high = cycle.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = high - low;
    let argmax = cycle.iter().position(|value| *value == high).unwrap_or(0);

    for slot in cycle.iter_mut() {
        *slot = if span > 0.0 {
            (*slot - low) * ((peak - min_value) / span) + min_value
        } else {
            min_value
        };
    }
    if let Some(slot) = cycle.get_mut(argmax) {
        *slot = peak;
    }
}

/// Rounds wave values to whole levels on consecutive days starting at `start`.
#[must_use]
pub fn dated_levels(values: &[f64], start: NaiveDate) -> Vec<DatedLevel> {
    values
        .iter()
        .zip(start.iter_days())
        .map(|(value, date)| DatedLevel {
            date,
            level: value.round().max(0.0) as u32,
        })
        .collect()
}
