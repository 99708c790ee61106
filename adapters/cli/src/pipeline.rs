use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use samgen_core::{
    derive_stream_seed, EmissionClock, GenerationError, LookupError, Record, Run,
    RNG_STREAM_EMISSION, RNG_STREAM_FANOUT, RNG_STREAM_LICENSE_SPLIT, RNG_STREAM_SYNTHESIS,
};
use samgen_reference::ReferenceData;
use samgen_system_denials::{derive_denials, DenialSelector};
use samgen_system_emitter::{Emission, Emitter};
use samgen_system_fanout::{expand, resolve_categories};
use samgen_system_quantity_split::generate_distinct_numbers_with_constraints;
use samgen_system_summary::{summarize, RunSummary};
use samgen_system_synthesizer::synthesize;
use samgen_xml::render_unload;
use tracing::{debug, info, info_span, warn};

use crate::profile::Profile;

/// File receiving the concurrent usage fixture.
pub(crate) const USAGE_FILE: &str = "concurrent_records.xml";
/// File receiving the denial fixture.
pub(crate) const DENIAL_FILE: &str = "denial_records.xml";
/// File receiving the license fixture.
pub(crate) const LICENSE_FILE: &str = "license_records.xml";

/// Rendered fixture documents of one run.
#[derive(Debug)]
pub(crate) struct Fixtures {
    pub(crate) usage_xml: String,
    pub(crate) denial_xml: String,
    pub(crate) license_xml: Option<String>,
    pub(crate) summary: RunSummary,
    pub(crate) usage_records: usize,
    pub(crate) denial_records: usize,
    pub(crate) license_records: usize,
}

/// Runs every generation stage and renders the fixtures.
///
/// Each stage draws from its own stream derived from `seed`, so toggling the
/// fanout or the license split never changes the synthesized series.
pub(crate) fn generate(
    profile: &Profile,
    reference: &ReferenceData,
    clock: EmissionClock,
    seed: u64,
) -> Result<Fixtures> {
    let _span = info_span!("generate", seed).entered();
    let config = profile.generation.to_config()?;

    let license_split = if profile.license.enabled {
        let mut rng = stream(seed, RNG_STREAM_LICENSE_SPLIT);
        match generate_distinct_numbers_with_constraints(
            profile.license_total(),
            profile.license.max_gap,
            &mut rng,
        ) {
            Ok(split) => Some(split),
            Err(GenerationError::Unsatisfiable(error)) => {
                warn!(%error, "skipping license records");
                None
            }
            Err(error) => return Err(error.into()),
        }
    } else {
        None
    };

    let mut rng = stream(seed, RNG_STREAM_SYNTHESIS);
    let samples = synthesize(&config, &mut rng)?;
    let denials = derive_denials(&samples, config.increment(), DenialSelector::DenialPhase);
    info!(
        samples = samples.len(),
        denials = denials.len(),
        increment = config.increment(),
        "synthesized series"
    );
    let mut run = Run::new(&config, samples, denials);

    if profile.fanout.enabled {
        let (categories, warnings) =
            resolve_categories(reference, &profile.fanout.categories)?.into_parts();
        log_warnings(&warnings);
        if categories.is_empty() {
            warn!(
                requested = profile.fanout.categories.len(),
                "no fanout category resolved; emitting aggregate usage"
            );
        } else {
            let mut rng = stream(seed, RNG_STREAM_FANOUT);
            let fanout = expand(
                run.samples(),
                &categories,
                profile.fanout.remainder,
                &mut rng,
            )?;
            debug!(categories = categories.len(), "fanned out usage");
            run = run.with_fanout(fanout);
        }
        run.extend_warnings(warnings);
    }

    let mut emitter = Emitter::new(reference, clock);
    if let Some(column) = &profile.license.column {
        emitter = emitter.with_license_column(column.as_str());
    }
    let mut rng = stream(seed, RNG_STREAM_EMISSION);
    let usage = emitter.usage_records(&run, &mut rng)?;
    let denial = emitter.denial_records(run.denials(), &mut rng)?;
    let license = license_split
        .map(|(low, middle, high)| emitter.license_records(&[low, middle, high], &mut rng))
        .transpose()?;

    let usage = records_of(usage, &mut run);
    let denial = records_of(denial, &mut run);
    let license = license.map(|emission| records_of(emission, &mut run));

    Ok(Fixtures {
        usage_xml: render_unload(&usage, &clock)?,
        denial_xml: render_unload(&denial, &clock)?,
        license_xml: license
            .as_deref()
            .map(|records| render_unload(records, &clock))
            .transpose()?,
        summary: summarize(&run),
        usage_records: usage.len(),
        denial_records: denial.len(),
        license_records: license.map_or(0, |records| records.len()),
    })
}

/// Moves the emission's skipped items onto the run and returns its records.
fn records_of(emission: Emission, run: &mut Run) -> Vec<Record> {
    let (records, warnings) = emission.into_parts();
    log_warnings(&warnings);
    run.extend_warnings(warnings);
    records
}

/// Writes the rendered documents into `directory`, returning the written paths.
pub(crate) fn write_fixtures(directory: &Path, fixtures: &Fixtures) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(directory)
        .with_context(|| format!("failed to create output directory {}", directory.display()))?;

    let mut documents = vec![
        (USAGE_FILE, fixtures.usage_xml.as_str()),
        (DENIAL_FILE, fixtures.denial_xml.as_str()),
    ];
    if let Some(license_xml) = &fixtures.license_xml {
        documents.push((LICENSE_FILE, license_xml.as_str()));
    }

    let mut written = Vec::with_capacity(documents.len());
    for (name, contents) in documents {
        let path = directory.join(name);
        fs::write(&path, contents)
            .with_context(|| format!("failed to write fixture {}", path.display()))?;
        debug!(path = %path.display(), bytes = contents.len(), "wrote fixture");
        written.push(path);
    }
    Ok(written)
}

/// Writes the run summary as pretty-printed JSON.
pub(crate) fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create summary directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(summary).context("failed to serialize summary")?;
    fs::write(path, json).with_context(|| format!("failed to write summary {}", path.display()))
}

fn stream(seed: u64, label: &str) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_stream_seed(seed, label))
}

fn log_warnings(warnings: &[LookupError]) {
    for warning in warnings {
        warn!(%warning, "skipped item");
    }
}
