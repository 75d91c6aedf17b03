//! # Freightsheet - shipment and order spreadsheets to JSON
//!
//! Freightsheet converts spreadsheet exports (shipment logs, orders reports)
//! into normalized JSON records with canonical field names.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  XLS / XLSX │────▶│   Parser    │────▶│  Transform  │────▶│    JSON     │
//! │  workbook   │     │ (coercions) │     │  (catalog)  │     │ (one/row)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use freightsheet::{convert_file, ConvertOptions, PipelineKind};
//!
//! let options = ConvertOptions::new("out");
//! let report = convert_file(PipelineKind::OrdersReport.spec(), "2023.04_orders.xls".as_ref(), &options)?;
//! println!("Converted {} rows", report.row_count);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`models`] - Cells and datasets
//! - [`parser`] - Workbook loading
//! - [`transform`] - Header rename, cleanup, derivations, pipeline
//! - [`writer`] - JSON output
//! - [`config`] - Runtime options
//! - [`logs`] - Progress log

// Core modules
pub mod config;
pub mod error;
pub mod logs;
pub mod models;

// Loading
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod writer;

// =============================================================================
// Re-exports - Errors
// =============================================================================

pub use error::{
    DeriveError, FilenameDateError, LoadError, PipelineError, PipelineResult,
};

// =============================================================================
// Re-exports - Models & Config
// =============================================================================

pub use config::ConvertOptions;
pub use models::{Cell, ColumnType, Dataset};

// =============================================================================
// Re-exports - Loading
// =============================================================================

pub use parser::{dataset_from_grid, load_workbook, ColumnCoercion, LoadOptions, WorkbookEngine};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::{
    convert_file, convert_format_date, parsed_on_from_file_name, transform_dataset,
    ConvertReport, DeriveRule, HeaderMapping, MetadataField, PipelineKind, PipelineSpec,
    TransformOutcome,
};

// =============================================================================
// Re-exports - Output
// =============================================================================

pub use writer::{to_json_pretty, write_json};
