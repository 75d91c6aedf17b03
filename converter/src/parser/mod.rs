//! Workbook loader.
//!
//! Reads the first worksheet of a spreadsheet into a [`Dataset`] whose
//! columns are the raw header strings. No pipeline-specific logic here
//! beyond the optional per-column type coercions passed in [`LoadOptions`].

use calamine::{open_workbook, open_workbook_auto, Data, Range, Reader, Xls};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{LoadError, LoadResult};
use crate::logs::{log_info, log_success};
use crate::models::{Cell, ColumnType, Dataset};

/// Strings read as the missing sentinel in data rows.
pub const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Which reader opens the workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkbookEngine {
    /// Legacy binary `.xls` only.
    Legacy,
    /// Detect the format from the file.
    Auto,
}

/// A load-time coercion of one source column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnCoercion {
    /// Source header text
    pub source: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnCoercion {
    pub fn new(source: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            source: source.into(),
            column_type,
        }
    }
}

/// Options for [`load_workbook`] and [`dataset_from_grid`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Physical rows to skip before looking for the header
    pub skip_rows: usize,
    pub coercions: Vec<ColumnCoercion>,
}

/// Load the first worksheet of a workbook.
pub fn load_workbook<P: AsRef<Path>>(
    path: P,
    engine: WorkbookEngine,
    options: &LoadOptions,
) -> LoadResult<Dataset> {
    let path = path.as_ref();
    log_info(format!("📖 Reading workbook: {}", path.display()));

    let range = read_first_sheet(path, engine)?;
    let (first_row, first_col) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));
    // Sheet columns left of the used range still count as columns
    let grid: Vec<Vec<Cell>> = range
        .rows()
        .map(|row| {
            std::iter::repeat(Cell::Missing)
                .take(first_col)
                .chain(row.iter().map(cell_from_data))
                .collect()
        })
        .collect();

    let dataset = build_dataset(grid, first_row, options)?;
    log_success(format!(
        "Read {} rows, {} columns",
        dataset.len(),
        dataset.columns().len()
    ));
    Ok(dataset)
}

fn read_first_sheet(path: &Path, engine: WorkbookEngine) -> LoadResult<Range<Data>> {
    match engine {
        WorkbookEngine::Legacy => {
            let mut workbook: Xls<_> = open_workbook(path)?;
            Ok(workbook.worksheet_range_at(0).ok_or(LoadError::NoWorksheet)??)
        }
        WorkbookEngine::Auto => {
            let mut workbook = open_workbook_auto(path)?;
            Ok(workbook.worksheet_range_at(0).ok_or(LoadError::NoWorksheet)??)
        }
    }
}

/// Convert a worksheet cell.
pub fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Missing,
        Data::String(s) if s.is_empty() => Cell::Missing,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => float_cell(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => dt.as_datetime().map(Cell::DateTime).unwrap_or(Cell::Missing),
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .map(Cell::DateTime)
            .unwrap_or_else(|_| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

/// Integral floats become integers.
fn float_cell(f: f64) -> Cell {
    if f.is_nan() {
        Cell::Missing
    } else if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Cell::Int(f as i64)
    } else {
        Cell::Float(f)
    }
}

/// Build a dataset from physical worksheet rows starting at row 0.
pub fn dataset_from_grid(grid: Vec<Vec<Cell>>, options: &LoadOptions) -> LoadResult<Dataset> {
    build_dataset(grid, 0, options)
}

fn build_dataset(
    grid: Vec<Vec<Cell>>,
    first_row: usize,
    options: &LoadOptions,
) -> LoadResult<Dataset> {
    let skip = options.skip_rows.saturating_sub(first_row);
    let mut rows = grid
        .into_iter()
        .enumerate()
        .skip(skip)
        .map(|(idx, row)| (first_row + idx + 1, row))
        .skip_while(|(_, row)| row.iter().all(Cell::is_missing));

    let (_, header_row) = rows.next().ok_or(LoadError::NoHeader)?;
    let data_rows: Vec<(usize, Vec<Cell>)> = rows.collect();

    let width = data_rows
        .iter()
        .map(|(_, row)| row.len())
        .chain(std::iter::once(header_row.len()))
        .max()
        .unwrap_or(0);
    let headers = header_names(&header_row, width);

    let types: HashMap<&str, ColumnType> = options
        .coercions
        .iter()
        .map(|c| (c.source.as_str(), c.column_type))
        .collect();
    let column_types: Vec<Option<ColumnType>> = headers
        .iter()
        .map(|h| types.get(h.as_str()).copied())
        .collect();

    let mut dataset = Dataset::new(headers);
    for (line, row) in data_rows {
        let mut cells: Vec<Cell> = row.into_iter().map(missing_if_na).collect();
        if cells.iter().all(Cell::is_missing) {
            continue;
        }
        cells.resize(width, Cell::Missing);

        for (idx, cell) in cells.iter_mut().enumerate() {
            if let Some(column_type) = column_types[idx] {
                let value = std::mem::replace(cell, Cell::Missing);
                *cell = coerce_cell(value, column_type).map_err(|message| LoadError::Coercion {
                    column: dataset.columns()[idx].clone(),
                    row: line,
                    message,
                })?;
            }
        }
        dataset.push_row(cells);
    }

    Ok(dataset)
}

fn missing_if_na(cell: Cell) -> Cell {
    if let Cell::Text(s) = &cell {
        if NA_VALUES.contains(&s.as_str()) {
            return Cell::Missing;
        }
    }
    cell
}

/// Header names for `width` columns: blanks become `Unnamed: <i>` and
/// repeats get a numeric suffix.
fn header_names(row: &[Cell], width: usize) -> Vec<String> {
    let raw: Vec<String> = (0..width)
        .map(|i| match row.get(i) {
            None => format!("Unnamed: {}", i),
            Some(cell) if cell.is_missing() => format!("Unnamed: {}", i),
            Some(cell) => cell.to_source_string(),
        })
        .collect();

    let mut taken: HashSet<String> = HashSet::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(raw.len());

    for name in raw {
        let mut candidate = name.clone();
        while taken.contains(&candidate) {
            let count = counts.entry(name.clone()).or_insert(0);
            *count += 1;
            candidate = format!("{}.{}", name, count);
        }
        taken.insert(candidate.clone());
        names.push(candidate);
    }
    names
}

/// Coerce one cell, returning a message on failure.
pub fn coerce_cell(cell: Cell, column_type: ColumnType) -> Result<Cell, String> {
    match column_type {
        ColumnType::Text => Ok(match cell {
            Cell::Missing | Cell::Null | Cell::Text(_) => cell,
            Cell::Float(f) if f.is_nan() => Cell::Missing,
            other => Cell::Text(other.to_source_string()),
        }),
        ColumnType::Integer => match cell {
            Cell::Int(i) => Ok(Cell::Int(i)),
            Cell::Bool(b) => Ok(Cell::Int(b as i64)),
            Cell::Float(f) if f.is_finite() && f.fract() == 0.0 => Ok(Cell::Int(f as i64)),
            Cell::Float(f) if f.is_nan() => Err("missing value in integer column".to_string()),
            Cell::Float(f) => Err(format!("cannot safely convert {} to integer", f)),
            Cell::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(Cell::Int)
                .map_err(|_| format!("cannot convert '{}' to integer", s)),
            Cell::Missing | Cell::Null => Err("missing value in integer column".to_string()),
            Cell::DateTime(dt) => Err(format!("cannot convert date {} to integer", dt)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Cell {
        Cell::text(s)
    }

    fn opts(skip_rows: usize, coercions: Vec<ColumnCoercion>) -> LoadOptions {
        LoadOptions { skip_rows, coercions }
    }

    #[test]
    fn test_header_and_rows() {
        let grid = vec![
            vec![t("Терминал"), t("TEU")],
            vec![t("ПКТ"), Cell::Int(2)],
            vec![t("ВСК"), Cell::Int(1)],
        ];
        let ds = dataset_from_grid(grid, &LoadOptions::default()).unwrap();

        assert_eq!(ds.columns(), &["Терминал", "TEU"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.get(1, "Терминал"), Some(&t("ВСК")));
    }

    #[test]
    fn test_skip_rows() {
        let grid = vec![
            vec![t("Отчёт по заявкам"), Cell::Missing],
            vec![t("Инд."), t("№ конт.")],
            vec![t("ABCU"), t("1234567")],
        ];
        let ds = dataset_from_grid(grid, &opts(1, vec![])).unwrap();
        assert_eq!(ds.columns(), &["Инд.", "№ конт."]);
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn test_empty_rows_dropped() {
        let grid = vec![
            vec![t("a"), t("b")],
            vec![Cell::Missing, Cell::Missing],
            vec![t("NA"), t("")],
            vec![t(" "), Cell::Missing],
        ];
        let ds = dataset_from_grid(grid, &LoadOptions::default()).unwrap();
        // whitespace is a value until trimmed
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.get(0, "a"), Some(&t(" ")));
    }

    #[test]
    fn test_unnamed_and_duplicate_headers() {
        let grid = vec![
            vec![t("Судно"), Cell::Missing, t("Судно"), t("Судно")],
            vec![Cell::Int(1), Cell::Int(2), Cell::Int(3), Cell::Int(4)],
        ];
        let ds = dataset_from_grid(grid, &LoadOptions::default()).unwrap();
        assert_eq!(ds.columns(), &["Судно", "Unnamed: 1", "Судно.1", "Судно.2"]);
    }

    #[test]
    fn test_text_coercion() {
        let grid = vec![
            vec![t("ИНН Грузоотправителя"), t("Рейс")],
            vec![Cell::Int(7701234567), Cell::Missing],
            vec![Cell::Float(1.5), t("012E")],
        ];
        let coercions = vec![
            ColumnCoercion::new("ИНН Грузоотправителя", ColumnType::Text),
            ColumnCoercion::new("Рейс", ColumnType::Text),
        ];
        let ds = dataset_from_grid(grid, &opts(0, coercions)).unwrap();

        assert_eq!(ds.get(0, "ИНН Грузоотправителя"), Some(&t("7701234567")));
        assert_eq!(ds.get(0, "Рейс"), Some(&Cell::Missing));
        assert_eq!(ds.get(1, "ИНН Грузоотправителя"), Some(&t("1.5")));
    }

    #[test]
    fn test_integer_coercion() {
        assert_eq!(coerce_cell(t(" 2 "), ColumnType::Integer), Ok(Cell::Int(2)));
        assert_eq!(coerce_cell(Cell::Float(3.0), ColumnType::Integer), Ok(Cell::Int(3)));
        assert!(coerce_cell(Cell::Float(2.5), ColumnType::Integer).is_err());
        assert!(coerce_cell(Cell::Missing, ColumnType::Integer).is_err());
    }

    #[test]
    fn test_integer_coercion_error_reports_row() {
        let grid = vec![
            vec![t("TEU")],
            vec![Cell::Int(1)],
            vec![t("two")],
        ];
        let coercions = vec![ColumnCoercion::new("TEU", ColumnType::Integer)];
        let err = dataset_from_grid(grid, &opts(0, coercions)).unwrap_err();

        match err {
            LoadError::Coercion { column, row, .. } => {
                assert_eq!(column, "TEU");
                assert_eq!(row, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_no_header() {
        let grid = vec![vec![Cell::Missing]];
        assert!(matches!(
            dataset_from_grid(grid, &LoadOptions::default()),
            Err(LoadError::NoHeader)
        ));
    }

    #[test]
    fn test_cell_from_data() {
        assert_eq!(cell_from_data(&Data::Float(12.0)), Cell::Int(12));
        assert_eq!(cell_from_data(&Data::Float(0.5)), Cell::Float(0.5));
        assert_eq!(cell_from_data(&Data::String(String::new())), Cell::Missing);
        assert_eq!(cell_from_data(&Data::Empty), Cell::Missing);
    }

    #[test]
    fn test_load_xlsx_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Отчёт").unwrap();
        sheet.write_string(1, 0, "Инд.").unwrap();
        sheet.write_string(1, 1, "№ конт.").unwrap();
        sheet.write_string(2, 0, "ABCU").unwrap();
        sheet.write_number(2, 1, 1234567.0).unwrap();
        workbook.save(&path).unwrap();

        let ds = load_workbook(&path, WorkbookEngine::Auto, &opts(1, vec![])).unwrap();
        assert_eq!(ds.columns(), &["Инд.", "№ конт."]);
        assert_eq!(ds.get(0, "№ конт."), Some(&Cell::Int(1234567)));
    }

    #[test]
    fn test_load_keeps_leading_empty_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offset.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 1, "Терминал").unwrap();
        sheet.write_string(0, 3, "TEU").unwrap();
        sheet.write_string(1, 1, "ПКТ").unwrap();
        sheet.write_string(1, 2, "x").unwrap();
        sheet.write_number(1, 3, 2.0).unwrap();
        workbook.save(&path).unwrap();

        let ds = load_workbook(&path, WorkbookEngine::Auto, &LoadOptions::default()).unwrap();
        assert_eq!(ds.columns(), &["Unnamed: 0", "Терминал", "Unnamed: 2", "TEU"]);
        assert_eq!(ds.get(0, "Unnamed: 0"), Some(&Cell::Missing));
        assert_eq!(ds.get(0, "Unnamed: 2"), Some(&t("x")));
        assert_eq!(ds.get(0, "TEU"), Some(&Cell::Int(2)));
    }

    #[test]
    fn test_legacy_engine_rejects_xlsx() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        workbook.add_worksheet().write_string(0, 0, "Терминал").unwrap();
        workbook.save(&path).unwrap();

        assert!(load_workbook(&path, WorkbookEngine::Legacy, &LoadOptions::default()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = load_workbook(
            "/nonexistent/2023.01_ship.xls",
            WorkbookEngine::Legacy,
            &LoadOptions::default(),
        );
        assert!(result.is_err());
    }
}
