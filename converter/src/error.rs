//! Error types for the Freightsheet conversion pipeline.
//!
//! - [`LoadError`] - Workbook reading and type coercion errors
//! - [`FilenameDateError`] - Reporting period missing from the file name
//! - [`DeriveError`] - Derived-field failures (always recovered by the deriver)
//! - [`PipelineError`] - Top-level conversion errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Loading Errors
// =============================================================================

/// Errors while reading a workbook into a dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The legacy XLS reader rejected the file.
    #[error("Failed to read XLS workbook: {0}")]
    Xls(#[from] calamine::XlsError),

    /// The auto-detected reader rejected the file.
    #[error("Failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    /// The workbook has no worksheet.
    #[error("Workbook has no worksheet")]
    NoWorksheet,

    /// Every row was skipped or empty, so no header row exists.
    #[error("No header row found")]
    NoHeader,

    /// A cell could not be coerced to the type its column requires.
    #[error("Cannot coerce row {row}, column '{column}': {message}")]
    Coercion {
        column: String,
        row: usize,
        message: String,
    },
}

// =============================================================================
// Filename Date Errors
// =============================================================================

/// Errors while extracting the reporting period from a file name.
#[derive(Debug, Error)]
pub enum FilenameDateError {
    /// No leading year.month token.
    #[error("Date not in file name! ({0})")]
    Missing(String),

    /// A token was found but it is not a calendar month.
    #[error("Invalid date '{token}' in file name '{file_name}'")]
    Invalid { file_name: String, token: String },
}

// =============================================================================
// Derivation Errors
// =============================================================================

/// Errors while computing derived columns.
///
/// These never abort a conversion: the deriver rolls the whole block back
/// and keeps the pre-derivation columns.
#[derive(Debug, Error)]
pub enum DeriveError {
    /// A source column is absent.
    #[error("Missing source column: {0}")]
    MissingColumn(String),

    /// Concatenation met a value that is not text.
    #[error("Cannot concatenate non-text value in column '{column}' at row {row}")]
    NotText { column: String, row: usize },

    /// Splitting produced a different number of columns than targets.
    #[error("Split of '{column}' produced {found} columns, expected {expected}")]
    SplitWidth {
        column: String,
        expected: usize,
        found: usize,
    },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level conversion errors.
///
/// This is the error type returned by [`crate::transform::pipeline::convert_file`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Workbook could not be loaded.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Reporting period could not be read from the file name.
    #[error("{0}")]
    FilenameDate(#[from] FilenameDateError),

    /// An environment setting could not be parsed.
    #[error("Invalid value '{value}' for {key}")]
    InvalidConfig { key: String, value: String },

    /// Input path has no file name component.
    #[error("Input path has no file name: {0}")]
    NoFileName(String),

    /// Output could not be written.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Output could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for derivation operations.
pub type DeriveResult<T> = Result<T, DeriveError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let load_err = LoadError::NoHeader;
        let pipeline_err: PipelineError = load_err.into();
        assert!(pipeline_err.to_string().contains("header"));

        let date_err = FilenameDateError::Missing("report.xls".into());
        let pipeline_err: PipelineError = date_err.into();
        assert!(pipeline_err.to_string().contains("Date not in file name!"));
    }

    #[test]
    fn test_coercion_error_format() {
        let err = LoadError::Coercion {
            column: "TEU".into(),
            row: 4,
            message: "cannot convert 'two' to integer".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("row 4"));
        assert!(msg.contains("'TEU'"));
        assert!(msg.contains("'two'"));
    }

    #[test]
    fn test_split_width_format() {
        let err = DeriveError::SplitWidth {
            column: "container_type_and_size".into(),
            expected: 2,
            found: 3,
        };
        assert_eq!(
            err.to_string(),
            "Split of 'container_type_and_size' produced 3 columns, expected 2"
        );
    }
}
