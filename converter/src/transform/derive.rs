//! Derived-field rules.
//!
//! A pipeline carries one block of rules. The block is applied to a staged
//! copy of the dataset and only committed if every rule succeeds; on any
//! failure the dataset keeps its pre-derivation columns.

use serde::{Deserialize, Serialize};

use super::dates::convert_format_date;
use crate::error::{DeriveError, DeriveResult};
use crate::models::{Cell, Dataset};

/// A rule computing one or more columns from existing ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeriveRule {
    /// Reformat a date column in place (first matching format wins, else null)
    ParseDate {
        column: String,
        formats: Vec<String>,
    },

    /// Concatenate text columns without a separator
    Concat {
        target: String,
        sources: Vec<String>,
    },

    /// Split a text column on whitespace into exactly `targets.len()` columns
    SplitWhitespace {
        source: String,
        targets: Vec<String>,
    },
}

impl DeriveRule {
    pub fn parse_date(column: &str, formats: &[&str]) -> Self {
        DeriveRule::ParseDate {
            column: column.to_string(),
            formats: formats.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn concat(target: &str, sources: &[&str]) -> Self {
        DeriveRule::Concat {
            target: target.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn split_whitespace(source: &str, targets: &[&str]) -> Self {
        DeriveRule::SplitWhitespace {
            source: source.to_string(),
            targets: targets.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Apply this rule to a dataset
    pub fn apply(&self, dataset: &mut Dataset) -> DeriveResult<()> {
        match self {
            DeriveRule::ParseDate { column, formats } => apply_parse_date(dataset, column, formats),
            DeriveRule::Concat { target, sources } => apply_concat(dataset, target, sources),
            DeriveRule::SplitWhitespace { source, targets } => {
                apply_split_whitespace(dataset, source, targets)
            }
        }
    }
}

/// Apply every rule or none of them.
pub fn derive_all(dataset: &mut Dataset, rules: &[DeriveRule]) -> DeriveResult<()> {
    let mut staged = dataset.clone();
    for rule in rules {
        rule.apply(&mut staged)?;
    }
    *dataset = staged;
    Ok(())
}

fn column_cells(dataset: &Dataset, name: &str) -> DeriveResult<Vec<Cell>> {
    dataset
        .column(name)
        .map(|cells| cells.into_iter().cloned().collect())
        .ok_or_else(|| DeriveError::MissingColumn(name.to_string()))
}

fn apply_parse_date(dataset: &mut Dataset, column: &str, formats: &[String]) -> DeriveResult<()> {
    let converted = column_cells(dataset, column)?
        .iter()
        .map(|cell| {
            convert_format_date(&cell.to_source_string(), formats)
                .map(Cell::Text)
                .unwrap_or(Cell::Null)
        })
        .collect();
    dataset.set_column(column, converted);
    Ok(())
}

fn apply_concat(dataset: &mut Dataset, target: &str, sources: &[String]) -> DeriveResult<()> {
    let columns = sources
        .iter()
        .map(|s| column_cells(dataset, s))
        .collect::<DeriveResult<Vec<_>>>()?;

    let mut joined = Vec::with_capacity(dataset.len());
    for row in 0..dataset.len() {
        let operands: Vec<&Cell> = columns.iter().map(|col| &col[row]).collect();
        if operands.iter().any(|cell| cell.is_empty()) {
            joined.push(Cell::Missing);
            continue;
        }

        let mut value = String::new();
        for (cell, source) in operands.iter().zip(sources) {
            let text = cell.as_text().ok_or_else(|| DeriveError::NotText {
                column: source.clone(),
                row,
            })?;
            value.push_str(text);
        }
        joined.push(Cell::Text(value));
    }

    dataset.set_column(target, joined);
    Ok(())
}

/// Rows with fewer tokens than the widest row get nulls; non-text rows get
/// missing cells. The widest row must have exactly one token per target.
fn apply_split_whitespace(dataset: &mut Dataset, source: &str, targets: &[String]) -> DeriveResult<()> {
    let tokens: Vec<Option<Vec<String>>> = column_cells(dataset, source)?
        .iter()
        .map(|cell| {
            cell.as_text()
                .map(|s| s.split_whitespace().map(str::to_string).collect())
        })
        .collect();

    let width = tokens
        .iter()
        .flatten()
        .map(Vec::len)
        .max()
        .unwrap_or(0);
    if width != targets.len() {
        return Err(DeriveError::SplitWidth {
            column: source.to_string(),
            expected: targets.len(),
            found: width,
        });
    }

    for (i, target) in targets.iter().enumerate() {
        let cells = tokens
            .iter()
            .map(|row| match row {
                Some(parts) => parts.get(i).cloned().map(Cell::Text).unwrap_or(Cell::Null),
                None => Cell::Missing,
            })
            .collect();
        dataset.set_column(target, cells);
    }
    Ok(())
}
