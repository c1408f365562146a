//! Parsing raw upload bytes into a [`Dataset`].

use super::{Dataset, IngestError};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use datafusion::arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray,
};
use datafusion::arrow::compute::concat_batches;
use datafusion::arrow::csv::{reader::Format, ReaderBuilder};
use datafusion::arrow::datatypes::{Field, Schema};
use datafusion::arrow::record_batch::RecordBatch;
use regex::Regex;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

const CSV_BATCH_SIZE: usize = 8192;

/// Cell contents read as missing, matching the usual spreadsheet/pandas NA markers.
const CSV_NULL_PATTERN: &str = r"^(|#N/A|#N/A N/A|#NA|-1\.#IND|-1\.#QNAN|-NaN|-nan|1\.#IND|1\.#QNAN|<NA>|N/A|NA|NULL|NaN|None|n/a|nan|null)$";

/// Upload formats accepted for ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Comma-delimited text with a header row.
    Csv,
    /// Excel or OpenDocument workbook; the first worksheet is read.
    Spreadsheet,
}

impl FileFormat {
    /// Pick the format from a filename's extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Result<Self, IngestError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "xls" | "xlsm" | "ods" => Ok(Self::Spreadsheet),
            "" => Err(IngestError::UnsupportedFormat("(none)".to_string())),
            other => Err(IngestError::UnsupportedFormat(format!(".{}", other))),
        }
    }
}

/// Parse an upload into a dataset.
pub fn parse_dataset(data: &[u8], format: FileFormat) -> Result<Dataset, IngestError> {
    let batch = match format {
        FileFormat::Csv => parse_csv(data)?,
        FileFormat::Spreadsheet => parse_spreadsheet(data)?,
    };
    Dataset::try_new(batch)
}

fn parse_csv(data: &[u8]) -> Result<RecordBatch, IngestError> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);

    let null_regex = Regex::new(CSV_NULL_PATTERN)
        .map_err(|e| IngestError::Unexpected(format!("Invalid null pattern: {}", e)))?;
    // Short rows are padded with nulls; rows with extra fields still fail
    let format = Format::default()
        .with_header(true)
        .with_null_regex(null_regex)
        .with_truncated_rows(true);

    // Infer over every row so late outliers (e.g. a decimal in an int column) widen the type
    let mut cursor = Cursor::new(data);
    let (inferred, _) = format.infer_schema(&mut cursor, None)?;

    if inferred.fields().is_empty() {
        return Err(no_columns());
    }

    let names = unique_column_names(inferred.fields().iter().map(|f| f.name().clone()));
    let schema = Arc::new(Schema::new(
        inferred
            .fields()
            .iter()
            .zip(names)
            .map(|(field, name)| Field::new(name, field.data_type().clone(), true))
            .collect::<Vec<_>>(),
    ));

    let csv_reader = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .with_batch_size(CSV_BATCH_SIZE)
        .build(Cursor::new(data))?;

    let batches = csv_reader.collect::<Result<Vec<_>, _>>()?;
    Ok(concat_batches(&schema, &batches)?)
}

fn parse_spreadsheet(data: &[u8]) -> Result<RecordBatch, IngestError> {
    static EMPTY_CELL: Data = Data::Empty;

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::ParseFailure("Workbook contains no worksheets".to_string()))??;

    let mut rows = range.rows();
    let header = rows.next().ok_or_else(no_columns)?;
    let names = unique_column_names(header.iter().map(|cell| match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }));
    let body: Vec<&[Data]> = rows.collect();

    let mut fields = Vec::with_capacity(names.len());
    let mut arrays = Vec::with_capacity(names.len());
    for (idx, name) in names.into_iter().enumerate() {
        let cells: Vec<&Data> = body
            .iter()
            .map(|row| row.get(idx).unwrap_or(&EMPTY_CELL))
            .collect();
        let array = spreadsheet_column(&cells);
        fields.push(Field::new(name, array.data_type().clone(), true));
        arrays.push(array);
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Type a worksheet column by its non-empty cells and build the matching array.
fn spreadsheet_column(cells: &[&Data]) -> ArrayRef {
    let mut any = false;
    let mut ints = true;
    let mut floats = true;
    let mut bools = true;
    let mut datetimes = true;

    for cell in cells {
        match cell {
            Data::Empty | Data::Error(_) => continue,
            Data::Int(_) => {
                bools = false;
                datetimes = false;
            }
            // Workbooks store most numbers as floats; integral ones still type as Int64
            Data::Float(f) => {
                ints &= is_integral(*f);
                bools = false;
                datetimes = false;
            }
            Data::Bool(_) => {
                ints = false;
                floats = false;
                datetimes = false;
            }
            Data::DateTime(_) | Data::DateTimeIso(_) => {
                ints = false;
                floats = false;
                bools = false;
            }
            _ => {
                ints = false;
                floats = false;
                bools = false;
                datetimes = false;
            }
        }
        any = true;
    }

    if !any {
        return Arc::new(Float64Array::from(vec![None::<f64>; cells.len()]));
    }

    if ints {
        Arc::new(
            cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(i) => Some(*i),
                    Data::Float(f) => Some(*f as i64),
                    _ => None,
                })
                .collect::<Int64Array>(),
        )
    } else if floats {
        Arc::new(
            cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(i) => Some(*i as f64),
                    Data::Float(f) => Some(*f),
                    _ => None,
                })
                .collect::<Float64Array>(),
        )
    } else if bools {
        Arc::new(
            cells
                .iter()
                .map(|cell| match cell {
                    Data::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<BooleanArray>(),
        )
    } else if datetimes {
        Arc::new(
            cells
                .iter()
                .map(|cell| {
                    calamine::DataType::as_datetime(*cell).map(|dt| dt.and_utc().timestamp_micros())
                })
                .collect::<TimestampMicrosecondArray>(),
        )
    } else {
        Arc::new(
            cells
                .iter()
                .map(|cell| match cell {
                    Data::Empty | Data::Error(_) => None,
                    other => Some(other.to_string()),
                })
                .collect::<StringArray>(),
        )
    }
}

fn is_integral(f: f64) -> bool {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    f.fract() == 0.0 && f.abs() <= MAX_EXACT
}

fn no_columns() -> IngestError {
    IngestError::ParseFailure("No columns to parse from file".to_string())
}

/// Make header names unique: blanks become `Unnamed: {idx}`, repeats get `.1`, `.2`, ...
pub(crate) fn unique_column_names(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let names: Vec<String> = names
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                trimmed.to_string()
            }
        })
        .collect();

    let mut taken: HashSet<String> = HashSet::with_capacity(names.len());
    let mut result = Vec::with_capacity(names.len());
    for name in names {
        let mut candidate = name.clone();
        let mut suffix = 1;
        while taken.contains(&candidate) {
            candidate = format!("{}.{}", name, suffix);
            suffix += 1;
        }
        taken.insert(candidate.clone());
        result.push(candidate);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::ColumnKind;
    use datafusion::arrow::datatypes::DataType;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_filename("a.csv").unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_filename("A.CSV").unwrap(), FileFormat::Csv);
        assert_eq!(
            FileFormat::from_filename("book.xlsx").unwrap(),
            FileFormat::Spreadsheet
        );
        assert_eq!(
            FileFormat::from_filename("old.xls").unwrap(),
            FileFormat::Spreadsheet
        );
    }

    #[test]
    fn test_format_rejects_unknown_extension() {
        assert!(matches!(
            FileFormat::from_filename("notes.txt"),
            Err(IngestError::UnsupportedFormat(ext)) if ext == ".txt"
        ));
        assert!(matches!(
            FileFormat::from_filename("README"),
            Err(IngestError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_parse_csv_infers_types() {
        let csv = b"a,b,c\n1,x,1.5\n2,y,\n3,z,2.5\n";
        let ds = parse_dataset(csv, FileFormat::Csv).unwrap();

        assert_eq!(ds.num_rows(), 3);
        assert_eq!(ds.column_names(), vec!["a", "b", "c"]);
        assert_eq!(ds.column("a").unwrap().data_type(), &DataType::Int64);
        assert_eq!(ds.column_kind("b"), Some(ColumnKind::Text));
        assert_eq!(ds.column_kind("c"), Some(ColumnKind::Numeric));
        assert_eq!(ds.missing_counts().get("c"), Some(&1));
    }

    #[test]
    fn test_parse_csv_header_only() {
        let ds = parse_dataset(b"a,b\n", FileFormat::Csv).unwrap();
        assert_eq!(ds.num_rows(), 0);
        assert_eq!(ds.num_columns(), 2);
    }

    #[test]
    fn test_parse_csv_strips_bom() {
        let ds = parse_dataset(b"\xEF\xBB\xBFid,v\n1,2\n", FileFormat::Csv).unwrap();
        assert_eq!(ds.column_names(), vec!["id", "v"]);
    }

    #[test]
    fn test_parse_empty_csv_fails() {
        assert!(matches!(
            parse_dataset(b"", FileFormat::Csv),
            Err(IngestError::ParseFailure(msg)) if msg.contains("No columns")
        ));
    }

    #[test]
    fn test_parse_csv_extra_fields_fail() {
        let result = parse_dataset(b"a,b\n1,2\n3,4,5\n", FileFormat::Csv);
        assert!(matches!(result, Err(IngestError::ParseFailure(_))));
    }

    #[test]
    fn test_parse_csv_pads_short_rows() {
        let ds = parse_dataset(b"a,b\n1,2\n3\n", FileFormat::Csv).unwrap();
        assert_eq!(ds.num_rows(), 2);
        assert_eq!(ds.column_kind("b"), Some(ColumnKind::Numeric));
        assert_eq!(ds.missing_counts().get("b"), Some(&1));
        assert_eq!(ds.missing_counts().get("a"), Some(&0));
    }

    #[test]
    fn test_parse_csv_na_markers_are_missing() {
        let ds = parse_dataset(b"a\n1\nNA\n3\n", FileFormat::Csv).unwrap();
        assert_eq!(ds.column_kind("a"), Some(ColumnKind::Numeric));
        assert_eq!(ds.missing_counts().get("a"), Some(&1));

        let csv = b"a,b,c\n1,x,N/A\nNULL,y,2.5\n#N/A,null,nan\n4,z,1.5\n";
        let ds = parse_dataset(csv, FileFormat::Csv).unwrap();
        assert_eq!(ds.column("a").unwrap().data_type(), &DataType::Int64);
        assert_eq!(ds.column_kind("b"), Some(ColumnKind::Text));
        assert_eq!(ds.column("c").unwrap().data_type(), &DataType::Float64);
        assert_eq!(ds.missing_counts().get("a"), Some(&2));
        assert_eq!(ds.missing_counts().get("b"), Some(&1));
        assert_eq!(ds.missing_counts().get("c"), Some(&2));
    }

    #[test]
    fn test_parse_csv_keeps_text_that_merely_contains_na() {
        let ds = parse_dataset(b"name\nNATO\nnana\n", FileFormat::Csv).unwrap();
        assert_eq!(ds.missing_counts().get("name"), Some(&0));
    }

    #[test]
    fn test_parse_garbage_spreadsheet_fails() {
        let result = parse_dataset(b"definitely not a zip archive", FileFormat::Spreadsheet);
        assert!(matches!(result, Err(IngestError::ParseFailure(_))));
    }

    #[test]
    fn test_duplicate_headers_are_renamed() {
        let ds = parse_dataset(b"x,x,,x\n1,2,3,4\n", FileFormat::Csv).unwrap();
        assert_eq!(ds.column_names(), vec!["x", "x.1", "Unnamed: 2", "x.2"]);
    }

    #[test]
    fn test_parse_xlsx_workbook() {
        let bytes = include_bytes!("../../tests/fixtures/sales.xlsx");
        let ds = parse_dataset(bytes, FileFormat::Spreadsheet).unwrap();

        assert_eq!(ds.num_rows(), 3);
        assert_eq!(
            ds.column_names(),
            vec!["region", "sales", "units", "Unnamed: 3", "region.1", "flag"]
        );
        assert_eq!(ds.column_kind("region"), Some(ColumnKind::Text));
        assert_eq!(ds.column("sales").unwrap().data_type(), &DataType::Float64);
        assert_eq!(ds.column("units").unwrap().data_type(), &DataType::Int64);
        assert_eq!(ds.column("flag").unwrap().data_type(), &DataType::Boolean);
        assert_eq!(ds.missing_counts().get("sales"), Some(&1));
        assert_eq!(ds.missing_counts().get("units"), Some(&1));
        assert_eq!(ds.missing_counts().get("region"), Some(&0));
    }

    #[test]
    fn test_spreadsheet_column_typing() {
        let ints = [Data::Float(1.0), Data::Empty, Data::Int(3)];
        let refs: Vec<&Data> = ints.iter().collect();
        assert_eq!(spreadsheet_column(&refs).data_type(), &DataType::Int64);

        let floats = [Data::Float(1.5), Data::Int(2)];
        let refs: Vec<&Data> = floats.iter().collect();
        assert_eq!(spreadsheet_column(&refs).data_type(), &DataType::Float64);

        let bools = [Data::Bool(true), Data::Empty];
        let refs: Vec<&Data> = bools.iter().collect();
        assert_eq!(spreadsheet_column(&refs).data_type(), &DataType::Boolean);

        let mixed = [Data::String("a".to_string()), Data::Float(2.0)];
        let refs: Vec<&Data> = mixed.iter().collect();
        assert_eq!(spreadsheet_column(&refs).data_type(), &DataType::Utf8);

        let empty = [Data::Empty, Data::Empty];
        let refs: Vec<&Data> = empty.iter().collect();
        let array = spreadsheet_column(&refs);
        assert_eq!(array.data_type(), &DataType::Float64);
        assert_eq!(array.null_count(), 2);
    }
}
