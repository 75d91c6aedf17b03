//! Runtime options for a conversion.
//!
//! Options come from the command line, optionally adjusted by environment
//! variables (a `.env` file is loaded first when present).

use chrono::{Local, NaiveDateTime};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::models::DATETIME_FORMAT;

/// Disable the stderr progress log when truthy.
pub const ENV_QUIET: &str = "FREIGHTSHEET_QUIET";

/// Fixed processing timestamp (`YYYY-MM-DD HH:MM:SS`) for reproducible output.
pub const ENV_NOW: &str = "FREIGHTSHEET_NOW";

/// Options for [`crate::transform::pipeline::convert_file`].
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Folder receiving `<input file name>.json`
    pub output_folder: PathBuf,

    /// Processing timestamp; the local clock when `None`
    pub now: Option<NaiveDateTime>,

    /// Echo progress log entries to stderr
    pub echo_logs: bool,
}

impl ConvertOptions {
    pub fn new(output_folder: impl AsRef<Path>) -> Self {
        Self {
            output_folder: output_folder.as_ref().to_path_buf(),
            now: None,
            echo_logs: true,
        }
    }

    /// Build options, then apply `FREIGHTSHEET_QUIET` and `FREIGHTSHEET_NOW`.
    pub fn from_env(output_folder: impl AsRef<Path>) -> PipelineResult<Self> {
        let _ = dotenvy::dotenv();

        let mut options = Self::new(output_folder);
        if let Ok(value) = env::var(ENV_QUIET) {
            options.echo_logs = !is_truthy(&value);
        }
        if let Ok(value) = env::var(ENV_NOW) {
            options.now = Some(parse_now(&value)?);
        }
        Ok(options)
    }

    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    /// The timestamp recorded as processing time.
    pub fn processed_at(&self) -> NaiveDateTime {
        self.now.unwrap_or_else(|| Local::now().naive_local())
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_now(value: &str) -> PipelineResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), DATETIME_FORMAT).map_err(|_| {
        PipelineError::InvalidConfig {
            key: ENV_NOW.to_string(),
            value: value.to_string(),
        }
    })
}
