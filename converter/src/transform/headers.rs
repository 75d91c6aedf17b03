//! Header normalization: source-language headers to canonical field names.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::models::Dataset;

/// One entry of a rename table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMapping {
    /// Header text as found in the workbook
    pub source: String,
    /// Canonical field name
    pub target: String,
}

impl HeaderMapping {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// What [`normalize_headers`] changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderReport {
    /// (source, target) pairs in column order
    pub renamed: Vec<(String, String)>,
    /// Unrenamed columns dropped because a renamed column took their name
    pub dropped: Vec<String>,
}

/// Rename every column listed in `mappings` and drop collisions.
///
/// Columns without a mapping pass through. A column that already bears a
/// canonical name produced by the rename is dropped so each name appears
/// once; the renamed column wins.
pub fn normalize_headers(dataset: &mut Dataset, mappings: &[HeaderMapping]) -> HeaderReport {
    let table: HashMap<&str, &str> = mappings
        .iter()
        .map(|m| (m.source.as_str(), m.target.as_str()))
        .collect();

    let mut report = HeaderReport::default();
    let mut renamed_at = vec![false; dataset.columns().len()];
    let mut targets: HashSet<String> = HashSet::new();

    let renames: Vec<(usize, String, String)> = dataset
        .columns()
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| {
            table
                .get(name.as_str())
                .map(|target| (idx, name.clone(), target.to_string()))
        })
        .collect();

    for (idx, source, target) in renames {
        dataset.rename_column(idx, target.clone());
        renamed_at[idx] = true;
        targets.insert(target.clone());
        report.renamed.push((source, target));
    }

    let collisions: Vec<usize> = dataset
        .columns()
        .iter()
        .enumerate()
        .filter(|(idx, name)| !renamed_at[*idx] && targets.contains(name.as_str()))
        .map(|(idx, _)| idx)
        .collect();

    report.dropped = collisions
        .iter()
        .map(|&idx| dataset.columns()[idx].clone())
        .collect();
    dataset.drop_columns(&collisions);

    report
}
