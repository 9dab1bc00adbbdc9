// Tabular row sources for repetition and bulk import.
//
// A locator is `file|sheet`. The CSV reader maps a sheet onto
// `<file>/<sheet>.csv` when `file` is a directory; otherwise the file is
// read directly and the sheet name is only a label.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::debug;

use crate::error::CoreError;
use crate::expr::Value;

/// One table row: header → typed cell.
pub type Row = IndexMap<String, Value>;

/// Where a table lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLocator {
    pub file: PathBuf,
    pub sheet: String,
}

impl SheetLocator {
    pub fn parse(config: &str) -> Result<Self, CoreError> {
        let parts: Vec<&str> = config.split('|').collect();
        let [file, sheet] = parts.as_slice() else {
            return Err(CoreError::configuration(format!(
                "table config should be in the form 'filename|Sheetname', got '{config}'"
            )));
        };
        Ok(Self {
            file: PathBuf::from(file.trim()),
            sheet: sheet.trim().to_owned(),
        })
    }
}

/// Reads the rows of a table.
pub trait TableReader: Send + Sync {
    fn read(&self, locator: &SheetLocator) -> Result<Vec<Row>, CoreError>;
}

/// Reads CSV files, resolving relative paths against `base_dir`.
#[derive(Debug, Clone, Default)]
pub struct CsvTableReader {
    base_dir: Option<PathBuf>,
}

impl CsvTableReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative locators against `dir` (usually the directory of
    /// the configuration file).
    pub fn with_base_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(dir.into()),
        }
    }

    fn resolve(&self, locator: &SheetLocator) -> PathBuf {
        let file = match &self.base_dir {
            Some(base) if locator.file.is_relative() => base.join(&locator.file),
            _ => locator.file.clone(),
        };
        if file.is_dir() {
            file.join(format!("{}.csv", locator.sheet))
        } else {
            file
        }
    }
}

impl TableReader for CsvTableReader {
    fn read(&self, locator: &SheetLocator) -> Result<Vec<Row>, CoreError> {
        let path = self.resolve(locator);
        if !path.exists() {
            return Err(CoreError::configuration(format!(
                "table file could not be found: '{}'",
                path.display()
            )));
        }
        debug!(path = %path.display(), sheet = %locator.sheet, "reading table");
        read_csv(&path)
    }
}

fn read_csv(path: &Path) -> Result<Vec<Row>, CoreError> {
    let csv_error = |e: csv::Error| {
        CoreError::configuration(format!("could not read '{}': {e}", path.display()))
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;
    let headers = reader.headers().map_err(csv_error)?.clone();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        if record.iter().all(str::is_empty) {
            return Err(CoreError::configuration(format!(
                "'{}' has an empty row at line {}",
                path.display(),
                index + 2
            )));
        }
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(header, cell)| (header.to_owned(), parse_cell(cell)))
                .collect(),
        );
    }
    Ok(rows)
}

/// Type a cell the way a spreadsheet would: booleans, integers, floats,
/// empty as null, anything else as text.
pub fn parse_cell(cell: &str) -> Value {
    if cell.is_empty() {
        Value::Null
    } else if cell.eq_ignore_ascii_case("true") {
        Value::Bool(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Value::Bool(false)
    } else if let Ok(n) = cell.parse::<i64>() {
        Value::Int(n)
    } else if let Some(x) = cell.parse::<f64>().ok().filter(|x| x.is_finite()) {
        Value::Float(x)
    } else {
        Value::Str(cell.to_owned())
    }
}

/// `"collector id"` → `"CollectorId"`: capitalise each space-separated
/// word and join.
pub fn pascal_case(header: &str) -> String {
    header
        .split(' ')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn locator_needs_exactly_one_separator() {
        let locator = SheetLocator::parse("customers.csv|Sheet1").unwrap();
        assert_eq!(locator.file, PathBuf::from("customers.csv"));
        assert_eq!(locator.sheet, "Sheet1");
        assert!(SheetLocator::parse("customers.csv").is_err());
        assert!(SheetLocator::parse("a|b|c").is_err());
    }

    #[test]
    fn cells_are_typed() {
        assert_eq!(parse_cell(""), Value::Null);
        assert_eq!(parse_cell("TRUE"), Value::Bool(true));
        assert_eq!(parse_cell("12"), Value::Int(12));
        assert_eq!(parse_cell("1.5"), Value::Float(1.5));
        assert_eq!(parse_cell("10.0.0.0/24"), Value::from("10.0.0.0/24"));
    }

    #[test]
    fn non_finite_numbers_stay_text() {
        assert_eq!(parse_cell("Infinity"), Value::from("Infinity"));
        assert_eq!(parse_cell("inf"), Value::from("inf"));
        assert_eq!(parse_cell("NaN"), Value::from("NaN"));
    }

    #[test]
    fn headers_become_pascal_case() {
        assert_eq!(pascal_case("collector id"), "CollectorId");
        assert_eq!(pascal_case("Is Enabled"), "IsEnabled");
        assert_eq!(pascal_case("IsEnabled"), "IsEnabled");
    }

    #[test]
    fn reads_sheet_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Customers.csv"),
            "id,name,is enabled\n42,Acme,TRUE\n43,Globex,false\n",
        )
        .unwrap();

        let reader = CsvTableReader::with_base_dir(dir.path());
        let rows = reader
            .read(&SheetLocator::parse(".|Customers").unwrap())
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], Value::Int(42));
        assert_eq!(rows[1]["is enabled"], Value::Bool(false));
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let reader = CsvTableReader::new();
        let err = reader
            .read(&SheetLocator::parse("/definitely/not/here.csv|x").unwrap())
            .unwrap_err();
        assert!(matches!(err, CoreError::Configuration { .. }));
    }
}
