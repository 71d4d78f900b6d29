//! Raw dataset readers. Every format is flattened into JSON objects so the
//! typed row structs can deserialize them the same way.

use calamine::{open_workbook_auto, DataType, Reader};
use flate2::read::GzDecoder;
use serde_json::{Map, Number, Value};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

const BOM: char = '\u{FEFF}';

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("cannot read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },
    #[error("{path} does not contain an array of rows")]
    NotAnArray { path: PathBuf },
    #[error("unsupported file type: {path}")]
    Unsupported { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, FormatError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    JsonGz,
    Csv,
    Xlsx,
}

impl SourceFormat {
    /// Extensions in lookup preference order.
    pub const EXTENSIONS: [(&'static str, SourceFormat); 4] = [
        ("json", SourceFormat::Json),
        ("json.gz", SourceFormat::JsonGz),
        ("csv", SourceFormat::Csv),
        ("xlsx", SourceFormat::Xlsx),
    ];

    pub fn from_path(path: &Path) -> Option<SourceFormat> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        Self::EXTENSIONS
            .iter()
            .rev()
            .find(|(ext, _)| name.ends_with(&format!(".{}", ext)))
            .map(|(_, format)| *format)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> FormatError + '_ {
    move |source| FormatError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Raw file contents, used for fingerprinting.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(io_error(path))
}

/// Read every row of a dataset file as a JSON object.
pub fn read_rows(path: &Path) -> Result<Vec<Value>> {
    match SourceFormat::from_path(path) {
        Some(SourceFormat::Json) => {
            let text = std::fs::read_to_string(path).map_err(io_error(path))?;
            parse_json_rows(path, &text)
        }
        Some(SourceFormat::JsonGz) => {
            let file = File::open(path).map_err(io_error(path))?;
            let mut text = String::new();
            GzDecoder::new(file)
                .read_to_string(&mut text)
                .map_err(io_error(path))?;
            parse_json_rows(path, &text)
        }
        Some(SourceFormat::Csv) => read_csv(path),
        Some(SourceFormat::Xlsx) => read_xlsx(path),
        None => Err(FormatError::Unsupported {
            path: path.to_path_buf(),
        }),
    }
}

/// Accepts a top-level array, or an object wrapping the array under a
/// `data`, `results` or `items` key.
fn parse_json_rows(path: &Path, text: &str) -> Result<Vec<Value>> {
    let value: Value =
        serde_json::from_str(text.trim_start_matches(BOM)).map_err(|source| FormatError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    match value {
        Value::Array(rows) => Ok(rows),
        Value::Object(mut object) => ["data", "results", "items"]
            .iter()
            .find_map(|key| match object.remove(*key) {
                Some(Value::Array(rows)) => Some(rows),
                _ => None,
            })
            .ok_or_else(|| FormatError::NotAnArray {
                path: path.to_path_buf(),
            }),
        _ => Err(FormatError::NotAnArray {
            path: path.to_path_buf(),
        }),
    }
}

fn read_csv(path: &Path) -> Result<Vec<Value>> {
    let csv_error = |source| FormatError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim_start_matches(BOM).trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let row: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| {
                let cell = cell.trim();
                let value = if cell.is_empty() {
                    Value::Null
                } else {
                    Value::String(cell.to_string())
                };
                (header.clone(), value)
            })
            .collect();
        rows.push(Value::Object(row));
    }
    Ok(rows)
}

fn cell_value(cell: &DataType) -> Value {
    match cell {
        DataType::Int(i) => Value::from(*i),
        DataType::Float(f) if f.fract() == 0.0 && f.is_finite() => Value::from(*f as i64),
        DataType::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        DataType::String(s) if s.trim().is_empty() => Value::Null,
        DataType::String(s) => Value::String(s.clone()),
        DataType::Bool(b) => Value::Bool(*b),
        _ => Value::Null,
    }
}

/// First sheet, first row as the header.
fn read_xlsx(path: &Path) -> Result<Vec<Value>> {
    let workbook_error = |message: String| FormatError::Workbook {
        path: path.to_path_buf(),
        message,
    };
    let mut workbook = open_workbook_auto(path).map_err(|e| workbook_error(e.to_string()))?;
    let first_sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| workbook_error("workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&first_sheet)
        .ok_or_else(|| workbook_error(format!("sheet {} is missing", first_sheet)))?
        .map_err(|e| workbook_error(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect(),
        None => return Ok(Vec::new()),
    };

    Ok(rows
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .map(|row| {
            let object: Map<String, Value> = headers
                .iter()
                .zip(row.iter())
                .filter(|(header, _)| !header.is_empty())
                .map(|(header, cell)| (header.clone(), cell_value(cell)))
                .collect();
            Value::Object(object)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn detects_format_from_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("a/states.json")), Some(SourceFormat::Json));
        assert_eq!(
            SourceFormat::from_path(Path::new("a/parliament_members.json.gz")),
            Some(SourceFormat::JsonGz)
        );
        assert_eq!(SourceFormat::from_path(Path::new("b.CSV")), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::from_path(Path::new("b.txt")), None);
    }

    #[test]
    fn reads_json_with_bom_and_wrapper() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("states.json");
        std::fs::write(&path, "\u{FEFF}{\"data\": [{\"id\": 1, \"name\": \"कोशी\"}]}").unwrap();
        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "कोशी");
    }

    #[test]
    fn reads_gzip_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("districts.json.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"[{\"id\": 4}, {\"id\": 5}]").unwrap();
        encoder.finish().unwrap();
        assert_eq!(read_rows(&path).unwrap().len(), 2);
    }

    #[test]
    fn reads_csv_blank_cells_as_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("political_families.csv");
        std::fs::write(&path, "candidate_name,relation,relative_name\nक ख,spouse,\n").unwrap();
        let rows = read_rows(&path).unwrap();
        assert_eq!(rows[0]["relation"], "spouse");
        assert_eq!(rows[0]["relative_name"], Value::Null);
    }

    #[test]
    fn scalar_json_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.json");
        std::fs::write(&path, "42").unwrap();
        assert!(matches!(read_rows(&path), Err(FormatError::NotAnArray { .. })));
    }
}
