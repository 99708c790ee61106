#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Run statistics: per-day usage and denial totals plus phase bookkeeping.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use samgen_core::{Phase, Run};
use samgen_system_denials::{phase_runs, PhaseRun};
use serde::Serialize;

/// Total attributed to one calendar day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DailyTotal {
    date: NaiveDate,
    total: u64,
}

impl DailyTotal {
    /// Calendar day.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Sum for the day.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }
}

/// Aggregated view of one run, serializable for reports.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    peak: u32,
    increment: u32,
    days: usize,
    daily_usage: Vec<DailyTotal>,
    daily_denials: Vec<DailyTotal>,
    phase_counts: BTreeMap<Phase, usize>,
    peak_visits: usize,
    denial_runs: Vec<PhaseRun>,
    hold_runs: Vec<PhaseRun>,
    warnings: Vec<String>,
}

impl RunSummary {
    /// Peak level of the run.
    #[must_use]
    pub const fn peak(&self) -> u32 {
        self.peak
    }

    /// Ramp step of the run.
    #[must_use]
    pub const fn increment(&self) -> u32 {
        self.increment
    }

    /// Number of distinct days with at least one sample.
    #[must_use]
    pub const fn days(&self) -> usize {
        self.days
    }

    /// Usage per day; fanned-out runs sum their category shares.
    #[must_use]
    pub fn daily_usage(&self) -> &[DailyTotal] {
        &self.daily_usage
    }

    /// Denied seats per day, only for days with denials.
    #[must_use]
    pub fn daily_denials(&self) -> &[DailyTotal] {
        &self.daily_denials
    }

    /// Number of samples tagged with the phase.
    #[must_use]
    pub fn phase_count(&self, phase: Phase) -> usize {
        self.phase_counts.get(&phase).copied().unwrap_or(0)
    }

    /// Number of times a ramp reached the peak.
    #[must_use]
    pub const fn peak_visits(&self) -> usize {
        self.peak_visits
    }

    /// Consecutive denial stretches.
    #[must_use]
    pub fn denial_runs(&self) -> &[PhaseRun] {
        &self.denial_runs
    }

    /// Consecutive hold stretches.
    #[must_use]
    pub fn hold_runs(&self) -> &[PhaseRun] {
        &self.hold_runs
    }

    /// Rendered messages of the lookups skipped while assembling the run.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// Builds the summary of a run.
#[must_use]
pub fn summarize(run: &Run) -> RunSummary {
    let mut usage: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    match run.fanout() {
        Some(fanout) => {
            for shares in fanout {
                *usage.entry(shares.date()).or_default() += shares.total();
            }
        }
        None => {
            for sample in run.samples() {
                *usage.entry(sample.date()).or_default() += u64::from(sample.level());
            }
        }
    }

    let mut denials: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for event in run.denials() {
        *denials.entry(event.date()).or_default() += u64::from(event.magnitude());
    }

    let mut phase_counts: BTreeMap<Phase, usize> =
        Phase::ALL.iter().map(|phase| (*phase, 0)).collect();
    for sample in run.samples() {
        *phase_counts.entry(sample.phase()).or_default() += 1;
    }

    let peak_visits = run
        .samples()
        .iter()
        .filter(|sample| sample.phase() == Phase::RampUp && sample.level() == run.peak())
        .count();

    let days = run
        .samples()
        .iter()
        .map(|sample| sample.date())
        .collect::<std::collections::BTreeSet<_>>()
        .len();

    RunSummary {
        peak: run.peak(),
        increment: run.increment(),
        days,
        daily_usage: totals(usage),
        daily_denials: totals(denials),
        phase_counts,
        peak_visits,
        denial_runs: phase_runs(run.samples(), Phase::Denial),
        hold_runs: phase_runs(run.samples(), Phase::Hold),
        warnings: run.warnings().iter().map(ToString::to_string).collect(),
    }
}

fn totals(map: BTreeMap<NaiveDate, u64>) -> Vec<DailyTotal> {
    map.into_iter()
        .map(|(date, total)| DailyTotal { date, total })
        .collect()
}
