//! Domain models for the Freightsheet conversion pipeline.
//!
//! - [`Cell`] - A single scalar value read from a worksheet
//! - [`Dataset`] - Named columns over rows of cells, mutated stage by stage
//! - [`ColumnType`] - Target type of a load-time coercion

use chrono::NaiveDateTime;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};

/// Display format for date-time cells.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Cells
// =============================================================================

/// A scalar cell value.
///
/// `Missing` is the tabular "no value" sentinel produced by the loader and by
/// derivations; `Null` is an explicit null. Both serialize as JSON `null`,
/// but only the null normalizer turns sentinels into `Null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// True for the missing sentinel (including NaN floats).
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Missing => true,
            Cell::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// True for anything that carries no value.
    pub fn is_empty(&self) -> bool {
        self.is_missing() || matches!(self, Cell::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the cell the way a string conversion of the source value reads.
    ///
    /// Missing becomes `nan`, null becomes `None`, integral floats keep a
    /// trailing `.0` and booleans are capitalized.
    pub fn to_source_string(&self) -> String {
        match self {
            Cell::Missing => "nan".to_string(),
            Cell::Null => "None".to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => format_float(*f),
            Cell::Bool(true) => "True".to_string(),
            Cell::Bool(false) => "False".to_string(),
            Cell::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
        }
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        let inf = if f > 0.0 { "inf" } else { "-inf" };
        inf.to_string()
    } else if f.fract() == 0.0 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Missing | Cell::Null => serializer.serialize_none(),
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Int(i) => serializer.serialize_i64(*i),
            Cell::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Cell::Float(_) => serializer.serialize_none(),
            Cell::Bool(b) => serializer.serialize_bool(*b),
            Cell::DateTime(dt) => {
                serializer.collect_str(&dt.format(DATETIME_FORMAT))
            }
        }
    }
}

// =============================================================================
// Column Types
// =============================================================================

/// Target type for a load-time column coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Render every present value as text.
    Text,
    /// Require an integral value in every row.
    Integer,
}

// =============================================================================
// Dataset
// =============================================================================

/// Rows of cells sharing one ordered set of named columns.
///
/// Every row always holds exactly one cell per column; absent values are
/// stored as cells, never by omitting the column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding with missing cells or truncating to the column count.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Missing);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cells of a column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Cell at `row` in column `name`.
    pub fn get(&self, row: usize, name: &str) -> Option<&Cell> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Replace a column's cells, or append the column if it does not exist.
    ///
    /// `cells` must hold one cell per row; extra cells are ignored and
    /// missing ones become [`Cell::Missing`].
    pub fn set_column(&mut self, name: &str, cells: Vec<Cell>) {
        let mut cells = cells.into_iter();
        match self.column_index(name) {
            Some(idx) => {
                for row in &mut self.rows {
                    row[idx] = cells.next().unwrap_or(Cell::Missing);
                }
            }
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(cells.next().unwrap_or(Cell::Missing));
                }
            }
        }
    }

    /// Set every row of a column to the same value.
    pub fn fill_column(&mut self, name: &str, value: Cell) {
        let cells = vec![value; self.rows.len()];
        self.set_column(name, cells);
    }

    pub fn rename_column(&mut self, idx: usize, name: impl Into<String>) {
        if let Some(column) = self.columns.get_mut(idx) {
            *column = name.into();
        }
    }

    /// Remove the columns at the given positions, keeping the order of the rest.
    pub fn drop_columns(&mut self, indices: &[usize]) {
        if indices.is_empty() {
            return;
        }
        let keep: Vec<bool> = (0..self.columns.len())
            .map(|i| !indices.contains(&i))
            .collect();

        let mut i = 0;
        self.columns.retain(|_| {
            let k = keep[i];
            i += 1;
            k
        });
        for row in &mut self.rows {
            let mut i = 0;
            row.retain(|_| {
                let k = keep[i];
                i += 1;
                k
            });
        }
    }

    /// Apply `f` to every cell.
    pub fn map_cells<F: FnMut(&mut Cell)>(&mut self, mut f: F) {
        for row in &mut self.rows {
            for cell in row.iter_mut() {
                f(cell);
            }
        }
    }

    /// Borrow each row as a serializable record.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |cells| Record {
            columns: &self.columns,
            cells,
        })
    }
}

/// One row viewed as an ordered map of column name to cell.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, cell) in self.columns.iter().zip(self.cells) {
            map.serialize_entry(name, cell)?;
        }
        map.end()
    }
}

impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for record in self.records() {
            seq.serialize_element(&record)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> Dataset {
        let mut ds = Dataset::new(vec!["a".into(), "b".into()]);
        ds.push_row(vec![Cell::text("x"), Cell::Int(1)]);
        ds.push_row(vec![Cell::text("y")]);
        ds
    }

    #[test]
    fn test_push_row_pads_missing() {
        let ds = sample();
        assert_eq!(ds.get(1, "b"), Some(&Cell::Missing));
    }

    #[test]
    fn test_set_column_appends_and_replaces() {
        let mut ds = sample();
        ds.set_column("c", vec![Cell::Int(7), Cell::Int(8)]);
        assert_eq!(ds.columns(), &["a", "b", "c"]);
        assert_eq!(ds.get(1, "c"), Some(&Cell::Int(8)));

        ds.set_column("a", vec![Cell::Null]);
        assert_eq!(ds.get(0, "a"), Some(&Cell::Null));
        assert_eq!(ds.get(1, "a"), Some(&Cell::Missing));
    }

    #[test]
    fn test_drop_columns_keeps_order() {
        let mut ds = sample();
        ds.set_column("c", vec![Cell::Int(7), Cell::Int(8)]);
        ds.drop_columns(&[1]);
        assert_eq!(ds.columns(), &["a", "c"]);
        assert_eq!(ds.rows()[0], vec![Cell::text("x"), Cell::Int(7)]);
    }

    #[test]
    fn test_serialize_keeps_column_order() {
        let mut ds = Dataset::new(vec!["zeta".into(), "alpha".into()]);
        ds.push_row(vec![Cell::text("Нет данных"), Cell::Missing]);

        let json = serde_json::to_string(&ds).unwrap();
        assert_eq!(json, r#"[{"zeta":"Нет данных","alpha":null}]"#);
    }

    #[test]
    fn test_source_string() {
        let dt = NaiveDate::from_ymd_opt(2023, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(Cell::DateTime(dt).to_source_string(), "2023-01-15 00:00:00");
        assert_eq!(Cell::Float(2.0).to_source_string(), "2.0");
        assert_eq!(Cell::Float(1.5).to_source_string(), "1.5");
        assert_eq!(Cell::Missing.to_source_string(), "nan");
        assert_eq!(Cell::Bool(true).to_source_string(), "True");
    }

    #[test]
    fn test_nan_float_is_missing() {
        assert!(Cell::Float(f64::NAN).is_missing());
        assert!(!Cell::Null.is_missing());
        assert!(Cell::Null.is_empty());
    }
}
