//! High-level conversion API.
//!
//! Combines all stages for one input file:
//! load → rename headers → trim → metadata → derive → null-normalize → write.
//!
//! # Example
//!
//! ```rust,ignore
//! use freightsheet::{convert_file, ConvertOptions, PipelineKind};
//! use std::path::Path;
//!
//! let report = convert_file(
//!     PipelineKind::ShipmentExport.spec(),
//!     Path::new("2023.01_ship.xls"),
//!     &ConvertOptions::new("out"),
//! )?;
//! println!("Wrote {} rows to {}", report.row_count, report.output_path.display());
//! ```

use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::clean::trim_text_cells;
use super::dates::{parsed_on_from_file_name, ISO_DATE_FORMAT};
use super::derive::derive_all;
use super::headers::{normalize_headers, HeaderReport};
use super::catalog::{MetadataField, PipelineSpec};
use crate::config::ConvertOptions;
use crate::error::{DeriveError, PipelineError, PipelineResult};
use crate::logs::{log_info, log_info_indent, log_success, log_warning, LOG_BROADCASTER};
use crate::models::{Cell, Dataset, DATETIME_FORMAT};
use crate::parser::load_workbook;
use crate::writer::write_json;

/// Result of transforming one dataset.
#[derive(Debug)]
pub struct TransformOutcome {
    pub dataset: Dataset,
    pub headers: HeaderReport,
    /// Why the derived-field block was rolled back, if it was
    pub derive_error: Option<DeriveError>,
}

/// Summary of one converted file.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertReport {
    pub output_path: PathBuf,
    pub row_count: usize,
    pub columns: Vec<String>,
    /// False when the derived-field block was rolled back
    pub derived: bool,
}

/// Convert one workbook to `<output_folder>/<file name>.json`.
///
/// Nothing is written unless every fatal stage succeeds.
pub fn convert_file(
    spec: &PipelineSpec,
    input: &Path,
    options: &ConvertOptions,
) -> PipelineResult<ConvertReport> {
    LOG_BROADCASTER.set_echo(options.echo_logs);
    log_info(format!("📄 Processing ({}): {}", spec.name, input.display()));

    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| PipelineError::NoFileName(input.display().to_string()))?;

    let dataset = load_workbook(input, spec.engine, &spec.load_options())?;
    let outcome = transform_dataset(spec, dataset, &file_name, options.processed_at())?;

    let output_path = write_json(&outcome.dataset, &options.output_folder, &file_name)?;
    log_success(format!("💾 Output written to: {}", output_path.display()));

    Ok(ConvertReport {
        output_path,
        row_count: outcome.dataset.len(),
        columns: outcome.dataset.columns().to_vec(),
        derived: outcome.derive_error.is_none(),
    })
}

/// Run every in-memory stage on a loaded dataset.
///
/// Fails only when a required metadata value (the reporting month) cannot
/// be computed; a failing derived-field block is rolled back and reported
/// in [`TransformOutcome::derive_error`].
pub fn transform_dataset(
    spec: &PipelineSpec,
    mut dataset: Dataset,
    file_name: &str,
    processed_at: NaiveDateTime,
) -> PipelineResult<TransformOutcome> {
    let headers = normalize_headers(&mut dataset, &spec.headers);
    print_header_report(&headers);

    trim_text_cells(&mut dataset);
    add_metadata(&mut dataset, &spec.metadata, file_name, processed_at)?;

    let derive_error = match derive_all(&mut dataset, &spec.derive) {
        Ok(()) => {
            if !spec.derive.is_empty() {
                log_success(format!("Derived fields applied ({} rules)", spec.derive.len()));
            }
            None
        }
        Err(e) => {
            log_warning(format!("Derived fields rolled back: {}", e));
            Some(e)
        }
    };

    normalize_nulls(&mut dataset);

    Ok(TransformOutcome {
        dataset,
        headers,
        derive_error,
    })
}

/// Append the provenance fields to every row.
pub fn add_metadata(
    dataset: &mut Dataset,
    fields: &[MetadataField],
    file_name: &str,
    processed_at: NaiveDateTime,
) -> PipelineResult<()> {
    for field in fields {
        let value = match field {
            MetadataField::Constant { value, .. } => Cell::text(value.as_str()),
            MetadataField::ParsedOn { .. } => {
                let date = parsed_on_from_file_name(file_name)?;
                Cell::Text(date.format(ISO_DATE_FORMAT).to_string())
            }
            MetadataField::FileName { .. } => Cell::text(file_name),
            MetadataField::ProcessedAt { .. } => {
                Cell::Text(processed_at.format(DATETIME_FORMAT).to_string())
            }
        };
        dataset.fill_column(field.name(), value);
    }
    Ok(())
}

/// Replace missing sentinels and `"NaT"` text with explicit nulls.
pub fn normalize_nulls(dataset: &mut Dataset) {
    dataset.map_cells(|cell| {
        if cell.is_missing() || cell.as_text() == Some("NaT") {
            *cell = Cell::Null;
        }
    });
}

fn print_header_report(report: &HeaderReport) {
    log_info(format!("🗺️  Renamed {} columns", report.renamed.len()));
    for (source, target) in &report.renamed {
        log_info_indent(format!("{} → {}", source, target), 1);
    }
    for name in &report.dropped {
        log_warning(format!("Dropped duplicate column '{}'", name));
    }
}
