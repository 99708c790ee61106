#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Post-hoc event derivation over a synthesized sample sequence.
//!
//! The synthesizer is the single source of truth for phases; this system only
//! scans its output. Denial events are never emitted inline.

use chrono::NaiveDate;
use samgen_core::{DenialEvent, Phase, Sample};
use serde::Serialize;

/// Rule selecting which samples produce a denial event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenialSelector {
    /// Every sample tagged [`Phase::Denial`].
    DenialPhase,
    /// Every sample whose level equals the provided peak, regardless of phase.
    PeakLevel(u32),
}

impl DenialSelector {
    fn matches(self, sample: &Sample) -> bool {
        match self {
            DenialSelector::DenialPhase => sample.phase() == Phase::Denial,
            DenialSelector::PeakLevel(peak) => sample.level() == peak,
        }
    }
}

/// Emits one [`DenialEvent`] of magnitude `increment` per selected sample.
#[must_use]
pub fn derive_denials(
    samples: &[Sample],
    increment: u32,
    selector: DenialSelector,
) -> Vec<DenialEvent> {
    samples
        .iter()
        .enumerate()
        .filter(|(_, sample)| selector.matches(sample))
        .map(|(index, sample)| DenialEvent::new(sample.date(), increment, index))
        .collect()
}

/// Maximal stretch of consecutive samples sharing one phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PhaseRun {
    phase: Phase,
    start_index: usize,
    start_date: NaiveDate,
    len: usize,
}

impl PhaseRun {
    /// Phase shared by every sample of the run.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Index of the first sample of the run.
    #[must_use]
    pub const fn start_index(&self) -> usize {
        self.start_index
    }

    /// Date of the first sample of the run.
    #[must_use]
    pub const fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Number of samples in the run; never zero.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Always `false`; runs contain at least one sample.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Groups consecutive samples of `phase` into runs, in sample order.
///
/// For [`Phase::Denial`] and [`Phase::Hold`] each run corresponds to one peak
/// visit, so its length equals the repetition count drawn for that visit
/// unless the date range cut it short.
#[must_use]
pub fn phase_runs(samples: &[Sample], phase: Phase) -> Vec<PhaseRun> {
    let mut runs: Vec<PhaseRun> = Vec::new();
    for (index, sample) in samples.iter().enumerate() {
        if sample.phase() != phase {
            continue;
        }
        match runs.last_mut() {
            Some(run) if run.start_index + run.len == index => run.len += 1,
            _ => runs.push(PhaseRun {
                phase,
                start_index: index,
                start_date: sample.date(),
                len: 1,
            }),
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).expect("valid date")
    }

    fn scenario() -> Vec<Sample> {
        let shape = [
            (20, Phase::RampUp),
            (40, Phase::RampUp),
            (60, Phase::RampUp),
            (80, Phase::RampUp),
            (100, Phase::RampUp),
            (100, Phase::Denial),
            (100, Phase::Denial),
            (80, Phase::RampDown),
            (60, Phase::RampDown),
            (40, Phase::RampDown),
        ];
        shape
            .iter()
            .zip(1..)
            .map(|((level, phase), offset)| Sample::new(day(offset), *level, *phase))
            .collect()
    }

    #[test]
    fn denial_phase_selector_pairs_each_denial_day() {
        let samples = scenario();
        let denials = derive_denials(&samples, 20, DenialSelector::DenialPhase);
        assert_eq!(
            denials,
            vec![
                DenialEvent::new(day(6), 20, 5),
                DenialEvent::new(day(7), 20, 6),
            ]
        );
    }

    #[test]
    fn peak_level_selector_includes_the_ramp_top() {
        let samples = scenario();
        let denials = derive_denials(&samples, 20, DenialSelector::PeakLevel(100));
        let days: Vec<_> = denials.iter().map(DenialEvent::date).collect();
        assert_eq!(days, vec![day(5), day(6), day(7)]);
    }

    #[test]
    fn phase_runs_group_consecutive_samples() {
        let mut samples = scenario();
        samples.push(Sample::new(day(11), 60, Phase::RampUp));
        samples.push(Sample::new(day(12), 100, Phase::Denial));

        let runs = phase_runs(&samples, Phase::Denial);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].start_date(), day(6));
        assert_eq!(runs[0].len(), 2);
        assert_eq!(runs[1].start_index(), 11);
        assert_eq!(runs[1].len(), 1);

        let ramp_up = phase_runs(&samples, Phase::RampUp);
        assert_eq!(ramp_up.iter().map(PhaseRun::len).collect::<Vec<_>>(), [5, 1]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(derive_denials(&[], 5, DenialSelector::DenialPhase).is_empty());
        assert!(phase_runs(&[], Phase::Hold).is_empty());
    }

    #[test]
    fn phase_run_serializes_with_phase_label() {
        let runs = phase_runs(&scenario(), Phase::Denial);
        let json = serde_json::to_value(runs[0]).expect("serialize");
        assert_eq!(json["phase"], "denial");
        assert_eq!(json["start_date"], "2024-01-06");
    }
}
