#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Phased sequence synthesizer.
//!
//! Walks the configured date range one calendar day at a time and emits one
//! [`Sample`] per day. The level climbs by the configured increment, resolves
//! a peak transition according to the [`PhasePolicy`], and falls back toward
//! half the peak before climbing again. Generation stops as soon as the end
//! date is passed, even in the middle of a denial or hold run.

use rand::Rng;
use samgen_core::{
    ConfigurationError, GenerationConfig, Phase, PhasePolicy, RepetitionRange, Sample,
};

/// Produces the dated level sequence for the configuration.
///
/// The random source is consumed only when a peak transition resolves, so
/// two calls with identically seeded generators yield identical sequences.
pub fn synthesize<R: Rng + ?Sized>(
    config: &GenerationConfig,
    rng: &mut R,
) -> Result<Vec<Sample>, ConfigurationError> {
    config.validate()?;

    let capacity = usize::try_from(config.total_days()).unwrap_or(0);
    let mut samples = Vec::with_capacity(capacity);
    let mut machine = Machine::new(config);

    for date in config.start().iter_days() {
        if date > config.end() {
            break;
        }
        let (level, phase) = machine.step(rng)?;
        samples.push(Sample::new(date, level, phase));
    }

    Ok(samples)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    RampUp { level: u32 },
    RampDown { level: u32 },
    Plateau { phase: Phase, remaining: u32 },
}

#[derive(Debug)]
struct Machine<'a> {
    config: &'a GenerationConfig,
    increment: u32,
    peak: u32,
    state: State,
}

impl<'a> Machine<'a> {
    fn new(config: &'a GenerationConfig) -> Self {
        let increment = config.increment();
        let peak = config.peak();
        Self {
            config,
            increment,
            peak,
            state: State::RampUp {
                level: increment.min(peak),
            },
        }
    }

    /// Emits the level and phase for the current day and advances the state.
    fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(u32, Phase), ConfigurationError> {
        match self.state {
            State::RampUp { level } => {
                if level >= self.peak {
                    self.state = self.peak_transition(rng)?;
                    Ok((self.peak, Phase::RampUp))
                } else {
                    self.state = State::RampUp {
                        level: level.saturating_add(self.increment).min(self.peak),
                    };
                    Ok((level, Phase::RampUp))
                }
            }
            State::Plateau { phase, remaining } => {
                self.state = if remaining > 1 {
                    State::Plateau {
                        phase,
                        remaining: remaining - 1,
                    }
                } else {
                    self.descend()
                };
                Ok((self.peak, phase))
            }
            State::RampDown { level } => {
                self.state = if f64::from(level) <= self.config.half_peak() {
                    State::RampUp {
                        level: level.saturating_add(self.increment).min(self.peak),
                    }
                } else {
                    State::RampDown {
                        level: level.saturating_sub(self.increment),
                    }
                };
                Ok((level, Phase::RampDown))
            }
        }
    }

    /// Chooses what follows the peak; repetition counts are drawn once here.
    fn peak_transition<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<State, ConfigurationError> {
        match self.config.policy() {
            PhasePolicy::DenialOnly => Ok(plateau(
                Phase::Denial,
                self.config.denial_range(),
                rng,
            )),
            PhasePolicy::HoldOrDecrement => {
                if rng.gen_bool(0.5) {
                    let range = self
                        .config
                        .hold_range()
                        .unwrap_or_else(|| self.config.denial_range());
                    Ok(plateau(Phase::Hold, range, rng))
                } else {
                    Ok(self.descend())
                }
            }
            PhasePolicy::FlatHold => {
                let range =
                    self.config
                        .hold_range()
                        .ok_or(ConfigurationError::MissingHoldRange {
                            policy: PhasePolicy::FlatHold,
                        })?;
                Ok(plateau(Phase::Hold, range, rng))
            }
        }
    }

    fn descend(&self) -> State {
        State::RampDown {
            level: self.peak.saturating_sub(self.increment),
        }
    }
}

fn plateau<R: Rng + ?Sized>(phase: Phase, range: RepetitionRange, rng: &mut R) -> State {
    State::Plateau {
        phase,
        remaining: rng.gen_range(range.lo()..=range.hi()),
    }
}
