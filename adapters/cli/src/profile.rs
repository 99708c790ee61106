use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use samgen_core::{Category, GenerationConfig, PhasePolicy, RepetitionRange};
use samgen_system_fanout::RemainderPolicy;
use samgen_system_quantity_split::DEFAULT_MAX_GAP;
use serde::Deserialize;

const SUPPORTED_PROFILE_VERSION: u32 = 1;

/// Products the fanout splits usage across when the profile names none.
pub(crate) const DEFAULT_CATEGORIES: [&str; 3] = [
    "AutoCAD Architecture",
    "ArcGIS 3D Analyst",
    "Advanced Meshing",
];

/// Generation profile loaded from TOML.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Profile {
    pub(crate) version: u32,
    #[serde(default)]
    pub(crate) seed: Option<u64>,
    #[serde(default)]
    pub(crate) reference_dir: Option<PathBuf>,
    pub(crate) generation: GenerationSection,
    #[serde(default)]
    pub(crate) fanout: FanoutSection,
    #[serde(default)]
    pub(crate) license: LicenseSection,
    #[serde(default)]
    pub(crate) output: OutputSection,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GenerationSection {
    pub(crate) start: NaiveDate,
    pub(crate) end: NaiveDate,
    pub(crate) peak: u32,
    pub(crate) step_count: u32,
    pub(crate) denial_range: [u32; 2],
    #[serde(default)]
    pub(crate) hold_range: Option<[u32; 2]>,
    #[serde(default)]
    pub(crate) policy: PhasePolicy,
}

impl GenerationSection {
    pub(crate) fn to_config(&self) -> Result<GenerationConfig> {
        let [denial_lo, denial_hi] = self.denial_range;
        let denial = RepetitionRange::new("denial range", denial_lo, denial_hi)?;
        let mut config =
            GenerationConfig::new(self.start, self.end, self.peak, self.step_count, denial)?
                .with_policy(self.policy);
        if let Some([hold_lo, hold_hi]) = self.hold_range {
            config = config.with_hold_range(RepetitionRange::new("hold range", hold_lo, hold_hi)?);
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FanoutSection {
    pub(crate) enabled: bool,
    pub(crate) categories: Vec<Category>,
    pub(crate) remainder: RemainderPolicy,
}

impl Default for FanoutSection {
    fn default() -> Self {
        Self {
            enabled: true,
            categories: DEFAULT_CATEGORIES.iter().map(|name| Category::new(*name)).collect(),
            remainder: RemainderPolicy::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LicenseSection {
    pub(crate) enabled: bool,
    pub(crate) total: Option<u32>,
    pub(crate) max_gap: u32,
    pub(crate) column: Option<String>,
}

impl Default for LicenseSection {
    fn default() -> Self {
        Self {
            enabled: true,
            total: None,
            max_gap: DEFAULT_MAX_GAP,
            column: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct OutputSection {
    pub(crate) directory: PathBuf,
    pub(crate) summary: Option<PathBuf>,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("fixtures"),
            summary: None,
        }
    }
}

impl Profile {
    /// Reads and validates the profile stored at `path`.
    pub(crate) fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read profile at {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid profile {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let profile: Profile =
            toml::from_str(contents).context("failed to parse profile toml contents")?;
        if profile.version != SUPPORTED_PROFILE_VERSION {
            bail!(
                "unsupported profile version {}; expected {}",
                profile.version,
                SUPPORTED_PROFILE_VERSION
            );
        }
        if profile.fanout.enabled && profile.fanout.categories.is_empty() {
            bail!("fanout is enabled but lists no categories");
        }
        if profile.license.enabled && profile.license_total() < 3 {
            bail!(
                "license total {} is below 3; three distinct quantities cannot be produced",
                profile.license_total()
            );
        }
        let _ = profile.generation.to_config()?;
        Ok(profile)
    }

    /// Total split across the licensed discovery models; defaults to the peak.
    pub(crate) fn license_total(&self) -> u32 {
        self.license.total.unwrap_or(self.generation.peak)
    }
}
