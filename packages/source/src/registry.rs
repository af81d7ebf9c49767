//! Dataset registry: loads all dataset definitions from embedded TOML
//! configs.
//!
//! Each `.toml` file in `packages/source/datasets/` is baked into the binary
//! at compile time via [`include_str!`]. Adding a new dataset is as simple
//! as creating a new TOML file and adding it to the list below.

use crate::SourceError;
use crate::dataset_def::{DatasetDefinition, parse_dataset_toml};

/// TOML configs embedded at compile time.
const DATASET_TOMLS: &[(&str, &str)] = &[
    // ── CKAN datasets ────────────────────────────────────────────────
    ("montreal", include_str!("../datasets/montreal.toml")),
];

/// Dataset used when none is requested.
pub const DEFAULT_DATASET: &str = "montreal";

/// Returns all configured dataset definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (the configs are embedded, so
/// this is caught by the registry tests).
#[must_use]
pub fn all_datasets() -> Vec<DatasetDefinition> {
    DATASET_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_dataset_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Looks up a dataset by id.
///
/// # Errors
///
/// Returns [`SourceError::UnknownDataset`] if no dataset has that id.
pub fn find_dataset(id: &str) -> Result<DatasetDefinition, SourceError> {
    all_datasets()
        .into_iter()
        .find(|def| def.id == id)
        .ok_or_else(|| SourceError::UnknownDataset { id: id.to_string() })
}
