#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the samgen fixture generator.
//!
//! This crate defines the vocabulary that connects the pure generation
//! systems, the reference repository and the adapters. The synthesizer turns
//! a [`GenerationConfig`] into [`Sample`] values, the deriver turns samples
//! into [`DenialEvent`] values, the fanout splits totals into
//! [`CategoryShare`] values and the emitter flattens all of it into
//! [`Record`] values that adapters serialize. Nothing in here performs I/O.

use std::fmt;
use std::num::NonZeroU32;

use chrono::{Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Calendar date format used by every emitted date field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Timestamp format used by creation and update stamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Minute-resolution timestamp used by the last denial time field.
pub const MINUTE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Seed stream label reserved for the sequence synthesizer.
pub const RNG_STREAM_SYNTHESIS: &str = "samgen/synthesis";
/// Seed stream label reserved for the category fanout.
pub const RNG_STREAM_FANOUT: &str = "samgen/fanout";
/// Seed stream label reserved for the license quantity split.
pub const RNG_STREAM_LICENSE_SPLIT: &str = "samgen/license-split";
/// Seed stream label reserved for the record emitter.
pub const RNG_STREAM_EMISSION: &str = "samgen/emission";
/// Seed stream label reserved for the randomized wave generator.
pub const RNG_STREAM_WAVE: &str = "samgen/wave";

/// Phase tag attached to every synthesized sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Level is climbing toward the peak.
    RampUp,
    /// Level is pinned at the peak without denial semantics.
    Hold,
    /// Level is falling back toward half the peak.
    RampDown,
    /// Level is pinned at the peak and every day carries a denial.
    Denial,
}

impl Phase {
    /// Every phase in declaration order.
    pub const ALL: [Phase; 4] = [Phase::RampUp, Phase::Hold, Phase::RampDown, Phase::Denial];

    /// Stable snake-case label of the phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::RampUp => "ramp_up",
            Phase::Hold => "hold",
            Phase::RampDown => "ramp_down",
            Phase::Denial => "denial",
        }
    }

    /// Reports whether samples of this phase sit at the peak.
    #[must_use]
    pub const fn is_peak(self) -> bool {
        matches!(self, Phase::Hold | Phase::Denial)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides what the synthesizer does once the ramp reaches the peak.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhasePolicy {
    /// Every peak visit starts a denial run drawn from the denial range.
    #[default]
    DenialOnly,
    /// Every peak visit flips a fair coin between a hold run and an immediate ramp down.
    HoldOrDecrement,
    /// Every peak visit starts a hold run drawn from the hold range.
    FlatHold,
}

impl PhasePolicy {
    /// Stable snake-case label of the policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PhasePolicy::DenialOnly => "denial_only",
            PhasePolicy::HoldOrDecrement => "hold_or_decrement",
            PhasePolicy::FlatHold => "flat_hold",
        }
    }
}

impl fmt::Display for PhasePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive range of repetition counts drawn once per peak visit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RepetitionRange {
    lo: NonZeroU32,
    hi: NonZeroU32,
}

impl RepetitionRange {
    /// Creates a range, rejecting zero bounds and inverted bounds.
    pub fn new(parameter: &'static str, lo: u32, hi: u32) -> Result<Self, ConfigurationError> {
        let lo_nz = NonZeroU32::new(lo).ok_or(ConfigurationError::ZeroRangeBound { parameter })?;
        let hi_nz = NonZeroU32::new(hi).ok_or(ConfigurationError::ZeroRangeBound { parameter })?;
        if lo > hi {
            return Err(ConfigurationError::InvertedRange { parameter, lo, hi });
        }
        Ok(Self { lo: lo_nz, hi: hi_nz })
    }

    /// Creates a range that always yields the same count.
    #[must_use]
    pub const fn exactly(count: NonZeroU32) -> Self {
        Self {
            lo: count,
            hi: count,
        }
    }

    /// Lower inclusive bound.
    #[must_use]
    pub const fn lo(&self) -> u32 {
        self.lo.get()
    }

    /// Upper inclusive bound.
    #[must_use]
    pub const fn hi(&self) -> u32 {
        self.hi.get()
    }

    /// Reports whether the count lies inside the range.
    #[must_use]
    pub const fn contains(&self, count: u32) -> bool {
        count >= self.lo.get() && count <= self.hi.get()
    }
}

/// Immutable input describing one generation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationConfig {
    start: NaiveDate,
    end: NaiveDate,
    peak: NonZeroU32,
    step_count: NonZeroU32,
    denial_range: RepetitionRange,
    hold_range: Option<RepetitionRange>,
    policy: PhasePolicy,
}

impl GenerationConfig {
    /// Creates a validated configuration using the default [`PhasePolicy::DenialOnly`] policy.
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        peak: u32,
        step_count: u32,
        denial_range: RepetitionRange,
    ) -> Result<Self, ConfigurationError> {
        let peak = NonZeroU32::new(peak).ok_or(ConfigurationError::ZeroPeak)?;
        let step_count = NonZeroU32::new(step_count).ok_or(ConfigurationError::ZeroStepCount)?;
        let config = Self {
            start,
            end,
            peak,
            step_count,
            denial_range,
            hold_range: None,
            policy: PhasePolicy::DenialOnly,
        };
        config.validate()?;
        Ok(config)
    }

    /// Replaces the peak transition policy.
    #[must_use]
    pub fn with_policy(mut self, policy: PhasePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Installs the range used for hold and flat runs.
    #[must_use]
    pub fn with_hold_range(mut self, range: RepetitionRange) -> Self {
        self.hold_range = Some(range);
        self
    }

    /// Checks every cross-field constraint.
    ///
    /// Constructors already run this, but the builder methods can still pair
    /// [`PhasePolicy::FlatHold`] with a missing hold range, so generators call
    /// it again before doing any work.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.end < self.start {
            return Err(ConfigurationError::InvertedDateRange {
                start: self.start,
                end: self.end,
            });
        }
        if self.step_count > self.peak {
            return Err(ConfigurationError::StepCountExceedsPeak {
                step_count: self.step_count.get(),
                peak: self.peak.get(),
            });
        }
        if self.policy == PhasePolicy::FlatHold && self.hold_range.is_none() {
            return Err(ConfigurationError::MissingHoldRange {
                policy: self.policy,
            });
        }
        Ok(())
    }

    /// First generated day.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last generated day, inclusive.
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Peak level every ramp climbs to.
    #[must_use]
    pub const fn peak(&self) -> u32 {
        self.peak.get()
    }

    /// Number of ramp steps between zero and the peak.
    #[must_use]
    pub const fn step_count(&self) -> u32 {
        self.step_count.get()
    }

    /// Fixed ramp step, `peak / step_count` with truncating division.
    #[must_use]
    pub const fn increment(&self) -> u32 {
        self.peak.get() / self.step_count.get()
    }

    /// Half of the peak using true division; the ramp-down floor.
    #[must_use]
    pub fn half_peak(&self) -> f64 {
        f64::from(self.peak.get()) / 2.0
    }

    /// Range of denial days drawn per peak visit.
    #[must_use]
    pub const fn denial_range(&self) -> RepetitionRange {
        self.denial_range
    }

    /// Range of hold days drawn per peak visit, when configured.
    #[must_use]
    pub const fn hold_range(&self) -> Option<RepetitionRange> {
        self.hold_range
    }

    /// Peak transition policy.
    #[must_use]
    pub const fn policy(&self) -> PhasePolicy {
        self.policy
    }

    /// Number of calendar days covered by the inclusive date range.
    #[must_use]
    pub fn total_days(&self) -> u64 {
        let span = self.end.signed_duration_since(self.start).num_days();
        u64::try_from(span).map_or(0, |days| days + 1)
    }
}

/// One synthesized data point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Sample {
    date: NaiveDate,
    level: u32,
    phase: Phase,
}

impl Sample {
    /// Creates a new sample.
    #[must_use]
    pub const fn new(date: NaiveDate, level: u32, phase: Phase) -> Self {
        Self { date, level, phase }
    }

    /// Calendar day of the sample.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Usage level of the sample.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Phase that produced the sample.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }
}

/// Synthetic rejected usage attempt paired with a peak-level sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DenialEvent {
    date: NaiveDate,
    magnitude: u32,
    sample_index: usize,
}

impl DenialEvent {
    /// Creates a denial event for the sample stored at `sample_index`.
    #[must_use]
    pub const fn new(date: NaiveDate, magnitude: u32, sample_index: usize) -> Self {
        Self {
            date,
            magnitude,
            sample_index,
        }
    }

    /// Day the denial happened.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Number of denied seats, always the configured increment.
    #[must_use]
    pub const fn magnitude(&self) -> u32 {
        self.magnitude
    }

    /// Position of the paired sample within the run.
    #[must_use]
    pub const fn sample_index(&self) -> usize {
        self.sample_index
    }
}

/// Identifier of a fanout category, typically a normalized product name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Creates a category identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrowed name of the category.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Portion of a total assigned to one category.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CategoryShare {
    category: Category,
    quantity: u32,
}

impl CategoryShare {
    /// Creates a share.
    #[must_use]
    pub fn new(category: Category, quantity: u32) -> Self {
        Self { category, quantity }
    }

    /// Category receiving the share.
    #[must_use]
    pub fn category(&self) -> &Category {
        &self.category
    }

    /// Quantity assigned to the category.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// Fanout of a single sample into per-category shares.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SampleShares {
    sample_index: usize,
    date: NaiveDate,
    shares: Vec<CategoryShare>,
}

impl SampleShares {
    /// Creates the expansion of the sample stored at `sample_index`.
    #[must_use]
    pub fn new(sample_index: usize, date: NaiveDate, shares: Vec<CategoryShare>) -> Self {
        Self {
            sample_index,
            date,
            shares,
        }
    }

    /// Position of the expanded sample within the run.
    #[must_use]
    pub const fn sample_index(&self) -> usize {
        self.sample_index
    }

    /// Day of the expanded sample.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Shares in category order.
    #[must_use]
    pub fn shares(&self) -> &[CategoryShare] {
        &self.shares
    }

    /// Sum of all shares.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.shares
            .iter()
            .map(|share| u64::from(share.quantity()))
            .sum()
    }
}

/// Complete output of one generation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Run {
    increment: u32,
    peak: u32,
    samples: Vec<Sample>,
    denials: Vec<DenialEvent>,
    fanout: Option<Vec<SampleShares>>,
    warnings: Vec<LookupError>,
}

impl Run {
    /// Assembles a run from synthesized samples and derived denial events.
    #[must_use]
    pub fn new(config: &GenerationConfig, samples: Vec<Sample>, denials: Vec<DenialEvent>) -> Self {
        Self {
            increment: config.increment(),
            peak: config.peak(),
            samples,
            denials,
            fanout: None,
            warnings: Vec::new(),
        }
    }

    /// Attaches the category expansion of every sample.
    #[must_use]
    pub fn with_fanout(mut self, fanout: Vec<SampleShares>) -> Self {
        self.fanout = Some(fanout);
        self
    }

    /// Records non-fatal lookup failures encountered while assembling the run.
    pub fn extend_warnings(&mut self, warnings: impl IntoIterator<Item = LookupError>) {
        self.warnings.extend(warnings);
    }

    /// Ramp step used by the run.
    #[must_use]
    pub const fn increment(&self) -> u32 {
        self.increment
    }

    /// Peak level used by the run.
    #[must_use]
    pub const fn peak(&self) -> u32 {
        self.peak
    }

    /// Samples in date order.
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Denial events in date order.
    #[must_use]
    pub fn denials(&self) -> &[DenialEvent] {
        &self.denials
    }

    /// Category expansion, when the run was fanned out.
    #[must_use]
    pub fn fanout(&self) -> Option<&[SampleShares]> {
        self.fanout.as_deref()
    }

    /// Lookup failures that were skipped.
    #[must_use]
    pub fn warnings(&self) -> &[LookupError] {
        &self.warnings
    }
}

/// Reference tables supplied by the CSV collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// Discovery models describing products, publishers and licenses.
    Discovery,
    /// Users together with their computers and workstations.
    User,
    /// User groups.
    Group,
    /// License servers.
    LicenseServer,
    /// License types.
    LicenseType,
}

impl TableKind {
    /// Every table in load order.
    pub const ALL: [TableKind; 5] = [
        TableKind::Discovery,
        TableKind::User,
        TableKind::Group,
        TableKind::LicenseServer,
        TableKind::LicenseType,
    ];

    /// Conventional file name of the table inside a reference directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            TableKind::Discovery => "discovery.csv",
            TableKind::User => "user.csv",
            TableKind::Group => "group.csv",
            TableKind::LicenseServer => "license_server.csv",
            TableKind::LicenseType => "license_type.csv",
        }
    }

    /// Human readable table name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            TableKind::Discovery => "discovery models",
            TableKind::User => "users",
            TableKind::Group => "groups",
            TableKind::LicenseServer => "license servers",
            TableKind::LicenseType => "license types",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of flat record produced by the emitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Concurrent usage of a license on one day.
    Usage,
    /// Denied usage attempt.
    Denial,
    /// License entitlement.
    License,
}

impl RecordKind {
    /// Stable lowercase label of the record kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RecordKind::Usage => "usage",
            RecordKind::Denial => "denial",
            RecordKind::License => "license",
        }
    }
}

/// Value carried by a record field.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    /// Plain text content.
    Text(String),
    /// Reference to another table, rendered with a display value.
    Reference {
        /// Human readable label of the referenced row.
        display: String,
        /// Opaque identifier of the referenced row.
        sys_id: String,
    },
    /// Field present without content.
    Empty,
}

impl FieldValue {
    /// Creates a text value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Creates a reference value.
    #[must_use]
    pub fn reference(display: impl Into<String>, sys_id: impl Into<String>) -> Self {
        FieldValue::Reference {
            display: display.into(),
            sys_id: sys_id.into(),
        }
    }

    /// Text content of the value; references yield their sys id.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            FieldValue::Reference { sys_id, .. } => Some(sys_id),
            FieldValue::Empty => None,
        }
    }
}

/// Named field of a record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Field {
    name: &'static str,
    value: FieldValue,
}

impl Field {
    /// Field name as the serializer expects it.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Field value.
    #[must_use]
    pub const fn value(&self) -> &FieldValue {
        &self.value
    }
}

/// Flat, format-agnostic record ready for serialization.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Record {
    kind: RecordKind,
    fields: Vec<Field>,
}

impl Record {
    /// Creates an empty record of the provided kind.
    #[must_use]
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            fields: Vec::new(),
        }
    }

    /// Appends a field, keeping insertion order.
    #[must_use]
    pub fn with(mut self, name: &'static str, value: FieldValue) -> Self {
        self.fields.push(Field { name, value });
        self
    }

    /// Kind of the record.
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Fields in insertion order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up the first field carrying the provided name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(Field::value)
    }
}

/// Opaque 128-bit identifier attached to emitted records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordToken(u128);

impl RecordToken {
    /// Wraps raw token bits.
    #[must_use]
    pub const fn new(bits: u128) -> Self {
        Self(bits)
    }

    /// Raw token bits.
    #[must_use]
    pub const fn get(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for RecordToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Wall-clock instant captured once per run and stamped on every record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EmissionClock {
    captured: NaiveDateTime,
}

impl EmissionClock {
    /// Years added to the captured instant to build license end dates.
    pub const LICENSE_TERM_YEARS: u32 = 10;

    /// Creates a clock pinned to the provided instant.
    #[must_use]
    pub const fn new(captured: NaiveDateTime) -> Self {
        Self { captured }
    }

    /// Captured instant.
    #[must_use]
    pub const fn captured(&self) -> NaiveDateTime {
        self.captured
    }

    /// Captured instant formatted with [`TIMESTAMP_FORMAT`].
    #[must_use]
    pub fn timestamp(&self) -> String {
        self.captured.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Captured instant formatted with [`MINUTE_TIMESTAMP_FORMAT`].
    #[must_use]
    pub fn minute_timestamp(&self) -> String {
        self.captured.format(MINUTE_TIMESTAMP_FORMAT).to_string()
    }

    /// License expiry stamp, [`Self::LICENSE_TERM_YEARS`] after the captured instant.
    ///
    /// February 29th clamps to the last day of February.
    #[must_use]
    pub fn license_end_timestamp(&self) -> String {
        self.captured
            .checked_add_months(Months::new(Self::LICENSE_TERM_YEARS * 12))
            .unwrap_or(self.captured)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }
}

/// Formats a calendar date with [`DATE_FORMAT`].
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Derives an independent seed for the named stream from a master seed.
#[must_use]
pub fn derive_stream_seed(master: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(master.to_le_bytes());
    hasher.update(label.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[0..8]);
    u64::from_le_bytes(bytes)
}

/// Invalid parameter detected before any generation work starts.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The peak quantity was zero.
    #[error("peak quantity must be a positive integer")]
    ZeroPeak,
    /// The step count was zero.
    #[error("step count must be a positive integer")]
    ZeroStepCount,
    /// The step count exceeded the peak, truncating the increment to zero.
    #[error("step count {step_count} exceeds peak {peak}; the ramp increment would be zero")]
    StepCountExceedsPeak {
        /// Offending step count.
        step_count: u32,
        /// Configured peak.
        peak: u32,
    },
    /// A repetition range bound was zero.
    #[error("{parameter} bounds must be at least 1")]
    ZeroRangeBound {
        /// Name of the offending range.
        parameter: &'static str,
    },
    /// A repetition range had its lower bound above its upper bound.
    #[error("{parameter} lower bound {lo} exceeds upper bound {hi}")]
    InvertedRange {
        /// Name of the offending range.
        parameter: &'static str,
        /// Lower bound.
        lo: u32,
        /// Upper bound.
        hi: u32,
    },
    /// The end date preceded the start date.
    #[error("end date {end} precedes start date {start}")]
    InvertedDateRange {
        /// First requested day.
        start: NaiveDate,
        /// Last requested day.
        end: NaiveDate,
    },
    /// A policy that needs a hold range was configured without one.
    #[error("phase policy {policy} requires a hold range")]
    MissingHoldRange {
        /// Policy that requested the range.
        policy: PhasePolicy,
    },
    /// The triple split was asked to split fewer than three units.
    #[error("total {total} is below 3; three distinct quantities cannot be produced")]
    TotalTooSmall {
        /// Requested total.
        total: u32,
    },
    /// The fanout was given no categories.
    #[error("category fanout requires at least one category")]
    EmptyCategories,
    /// The reference repository was queried before it was loaded.
    #[error("reference data has not been loaded")]
    ReferenceNotLoaded,
    /// A required reference table contained no rows.
    #[error("reference table '{table}' is empty")]
    EmptyTable {
        /// Table without rows.
        table: TableKind,
    },
}

/// Missing reference row or column; the affected item is skipped.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum LookupError {
    /// No discovery model matches the requested category.
    #[error("discovery model not found for category '{category}'")]
    MissingCategory {
        /// Category that failed to resolve.
        category: Category,
    },
    /// A reference row lacks a column the emitter needs.
    #[error("{table} row is missing column '{column}'")]
    MissingColumn {
        /// Table the row came from.
        table: TableKind,
        /// Missing column name.
        column: String,
    },
}

/// The triple split found no admissible answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
#[error("no three distinct positive quantities sum to {total} with a gap of at most {max_gap}")]
pub struct ConstraintUnsatisfiable {
    /// Requested total.
    pub total: u32,
    /// Requested maximum spread between the smallest and largest quantity.
    pub max_gap: u32,
}

/// Any failure raised by a generation stage.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Invalid parameter.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// Missing reference row.
    #[error(transparent)]
    Lookup(#[from] LookupError),
    /// Triple split failure.
    #[error(transparent)]
    Unsatisfiable(#[from] ConstraintUnsatisfiable),
}
