//! Transformation module.
//!
//! - Headers: source-language headers to canonical names
//! - Clean: whitespace trimming
//! - Dates: date conversion and the file-name reporting month
//! - Derive: all-or-nothing derived-field rules
//! - Catalog: static pipeline definitions
//! - Pipeline: the conversion entry points

pub mod catalog;
pub mod clean;
pub mod dates;
pub mod derive;
pub mod headers;
pub mod pipeline;

pub use clean::trim_text_cells;
pub use dates::{convert_format_date, parsed_on_from_file_name};
pub use derive::{derive_all, DeriveRule};
pub use headers::{normalize_headers, HeaderMapping, HeaderReport};
pub use pipeline::*;
pub use catalog::{MetadataField, PipelineKind, PipelineSpec, ORDERS_REPORT, SHIPMENT_EXPORT};
