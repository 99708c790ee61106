#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Category fanout: splits per-day totals into per-category shares.

use rand::{seq::index, Rng};
use samgen_core::{
    Category, CategoryShare, ConfigurationError, LookupError, Sample, SampleShares,
};
use samgen_reference::{query, ReferenceData};
use serde::{Deserialize, Serialize};

/// How the `total % k` leftover units are handed out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Leftover units go to distinct categories, so shares differ by at most one.
    #[default]
    Distinct,
    /// Each leftover unit picks a category independently; one category may
    /// receive several units.
    WithReplacement,
}

/// Splits `total` across `categories`, preserving category order.
///
/// Every category starts at `total / k` and the remainder is assigned
/// according to `policy`. The shares always sum to `total`.
pub fn distribute<R: Rng + ?Sized>(
    total: u32,
    categories: &[Category],
    policy: RemainderPolicy,
    rng: &mut R,
) -> Result<Vec<CategoryShare>, ConfigurationError> {
    if categories.is_empty() {
        return Err(ConfigurationError::EmptyCategories);
    }

    let count = categories.len() as u64;
    let base = u64::from(total) / count;
    let remainder = (u64::from(total) % count) as usize;
    // base never exceeds total, so it fits back into u32.
    let mut quantities = vec![base as u32; categories.len()];

    match policy {
        RemainderPolicy::Distinct => {
            for slot in index::sample(rng, categories.len(), remainder) {
                quantities[slot] += 1;
            }
        }
        RemainderPolicy::WithReplacement => {
            for _ in 0..remainder {
                quantities[rng.gen_range(0..categories.len())] += 1;
            }
        }
    }

    Ok(categories
        .iter()
        .zip(quantities)
        .map(|(category, quantity)| CategoryShare::new(category.clone(), quantity))
        .collect())
}

/// Categories that matched a discovery model, plus the ones that did not.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    resolved: Vec<Category>,
    warnings: Vec<LookupError>,
}

impl Resolution {
    /// Categories with a matching discovery model, in request order.
    #[must_use]
    pub fn resolved(&self) -> &[Category] {
        &self.resolved
    }

    /// One [`LookupError::MissingCategory`] per skipped category.
    #[must_use]
    pub fn warnings(&self) -> &[LookupError] {
        &self.warnings
    }

    /// Splits the resolution into its parts.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Category>, Vec<LookupError>) {
        (self.resolved, self.warnings)
    }
}

/// Resolves every category against the discovery table's normalized product.
///
/// A missing category is skipped and reported; an unloaded repository or an
/// empty discovery table fails the whole call.
pub fn resolve_categories(
    reference: &ReferenceData,
    categories: &[Category],
) -> Result<Resolution, ConfigurationError> {
    if categories.is_empty() {
        return Err(ConfigurationError::EmptyCategories);
    }

    let mut resolution = Resolution::default();
    for category in categories {
        match query::discovery_for(reference, category)? {
            Ok(_) => resolution.resolved.push(category.clone()),
            Err(warning) => resolution.warnings.push(warning),
        }
    }
    Ok(resolution)
}

/// Fans every sample level out across the categories.
pub fn expand<R: Rng + ?Sized>(
    samples: &[Sample],
    categories: &[Category],
    policy: RemainderPolicy,
    rng: &mut R,
) -> Result<Vec<SampleShares>, ConfigurationError> {
    if categories.is_empty() {
        return Err(ConfigurationError::EmptyCategories);
    }

    samples
        .iter()
        .enumerate()
        .map(|(index, sample)| {
            let shares = distribute(sample.level(), categories, policy, rng)?;
            Ok(SampleShares::new(index, sample.date(), shares))
        })
        .collect()
}
