//! JSON output.
//!
//! Writes a dataset as a JSON array of row objects, keys in column order,
//! indented by four spaces, with non-ASCII text emitted as is.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineResult;
use crate::models::Dataset;

/// Render the dataset to pretty JSON bytes.
pub fn to_json_pretty(dataset: &Dataset) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut buf, formatter);
    dataset.serialize(&mut serializer)?;
    Ok(buf)
}

/// `<output_folder>/<file_name>.json`
pub fn output_path(output_folder: &Path, file_name: &str) -> PathBuf {
    output_folder.join(format!("{}.json", file_name))
}

/// Write the dataset next to other outputs, replacing any existing file.
///
/// The document is rendered before the file is touched.
pub fn write_json(dataset: &Dataset, output_folder: &Path, file_name: &str) -> PipelineResult<PathBuf> {
    let json = to_json_pretty(dataset)?;
    let path = output_path(output_folder, file_name);
    fs::write(&path, json)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    fn dataset() -> Dataset {
        let mut ds = Dataset::new(vec!["terminal".into(), "teu".into()]);
        ds.push_row(vec![Cell::text("ПКТ"), Cell::Int(2)]);
        ds
    }

    #[test]
    fn test_four_space_indent_and_literal_unicode() {
        let json = String::from_utf8(to_json_pretty(&dataset()).unwrap()).unwrap();
        assert_eq!(
            json,
            "[\n    {\n        \"terminal\": \"ПКТ\",\n        \"teu\": 2\n    }\n]"
        );
    }

    #[test]
    fn test_empty_dataset() {
        let ds = Dataset::new(vec!["a".into()]);
        assert_eq!(to_json_pretty(&ds).unwrap(), b"[]");
    }

    #[test]
    fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let target = output_path(dir.path(), "2023.01_ship.xls");
        fs::write(&target, "stale").unwrap();

        let path = write_json(&dataset(), dir.path(), "2023.01_ship.xls").unwrap();
        assert_eq!(path, dir.path().join("2023.01_ship.xls.json"));

        let records: Vec<serde_json::Value> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(records[0]["terminal"], "ПКТ");
    }

    #[test]
    fn test_missing_folder_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(write_json(&dataset(), &missing, "x.xls").is_err());
    }
}
