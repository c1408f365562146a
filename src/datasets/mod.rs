//! In-memory tabular datasets and their ingestion.

pub mod error;
pub mod ingest;
pub mod profile;

pub use error::IngestError;
pub use ingest::{parse_dataset, FileFormat};
pub use profile::{Profile, ProfileStats};

use datafusion::arrow::array::{Array, ArrayRef, AsArray};
use datafusion::arrow::compute::cast;
use datafusion::arrow::datatypes::{DataType, Float64Type, SchemaRef};
use datafusion::arrow::error::ArrowError;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::arrow::util::display::{ArrayFormatter, FormatOptions};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashSet;

/// Semantic type of a column, derived from its Arrow type at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Text,
    Temporal,
    Boolean,
    Other,
}

impl ColumnKind {
    pub fn of(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Decimal128(_, _)
            | DataType::Decimal256(_, _) => Self::Numeric,
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => Self::Text,
            DataType::Date32
            | DataType::Date64
            | DataType::Timestamp(_, _)
            | DataType::Time32(_)
            | DataType::Time64(_)
            | DataType::Duration(_)
            | DataType::Interval(_) => Self::Temporal,
            DataType::Boolean => Self::Boolean,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Temporal => "temporal",
            Self::Boolean => "boolean",
            Self::Other => "other",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric)
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One parsed upload: named, positionally aligned columns held in a single batch.
///
/// Column names are unique. A dataset is never mutated after ingestion; the
/// store hands out shared references and every analysis reads it in place.
#[derive(Debug, Clone)]
pub struct Dataset {
    batch: RecordBatch,
}

impl Dataset {
    /// Wrap a record batch, rejecting duplicate column names.
    pub fn try_new(batch: RecordBatch) -> Result<Self, IngestError> {
        let mut seen = HashSet::new();
        for field in batch.schema().fields() {
            if !seen.insert(field.name().clone()) {
                return Err(IngestError::ParseFailure(format!(
                    "Duplicate column name '{}'",
                    field.name()
                )));
            }
        }
        Ok(Self { batch })
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.batch.schema().index_of(name).is_ok()
    }

    pub fn column(&self, name: &str) -> Option<&ArrayRef> {
        self.batch.column_by_name(name)
    }

    pub fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        self.column(name).map(|array| ColumnKind::of(array.data_type()))
    }

    /// Names of all numeric columns, in dataset order.
    pub fn numeric_column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .filter(|f| ColumnKind::of(f.data_type()).is_numeric())
            .map(|f| f.name().clone())
            .collect()
    }

    /// Per-column count of missing cells (nulls, plus NaN in float columns).
    pub fn missing_counts(&self) -> ColumnMap<usize> {
        self.batch
            .schema()
            .fields()
            .iter()
            .zip(self.batch.columns())
            .map(|(field, array)| (field.name().clone(), missing_count(array)))
            .collect()
    }
}

/// Read a numeric array as `f64` values; nulls and NaN become `None`.
pub fn float_values(array: &ArrayRef) -> Result<Vec<Option<f64>>, ArrowError> {
    let floats = cast(array.as_ref(), &DataType::Float64)?;
    Ok(floats
        .as_primitive::<Float64Type>()
        .iter()
        .map(|v| v.filter(|f| !f.is_nan()))
        .collect())
}

/// Render every cell of an array as display text; nulls become `None`.
pub fn display_values(array: &ArrayRef) -> Result<Vec<Option<String>>, ArrowError> {
    let formatter = ArrayFormatter::try_new(array.as_ref(), &FormatOptions::default())?;
    Ok((0..array.len())
        .map(|i| {
            if array.is_null(i) {
                None
            } else {
                Some(formatter.value(i).to_string())
            }
        })
        .collect())
}

fn missing_count(array: &ArrayRef) -> usize {
    let nan_count = match array.data_type() {
        DataType::Float32 => array
            .as_primitive::<datafusion::arrow::datatypes::Float32Type>()
            .iter()
            .filter(|v| v.is_some_and(f32::is_nan))
            .count(),
        DataType::Float64 => array
            .as_primitive::<Float64Type>()
            .iter()
            .filter(|v| v.is_some_and(f64::is_nan))
            .count(),
        _ => 0,
    };
    array.null_count() + nan_count
}

/// An insertion-ordered mapping keyed by column name.
///
/// Serializes as a JSON object whose keys keep dataset column order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> ColumnMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: V) {
        self.entries.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for ColumnMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for ColumnMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<V: Serialize> Serialize for ColumnMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafusion::arrow::array::{BooleanArray, Float64Array, Int64Array, StringArray};
    use datafusion::arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    fn sample() -> Dataset {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, true),
            Field::new("score", DataType::Float64, true),
            Field::new("name", DataType::Utf8, true),
            Field::new("active", DataType::Boolean, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![Some(1), None, Some(3)])),
                Arc::new(Float64Array::from(vec![Some(1.5), Some(f64::NAN), None])),
                Arc::new(StringArray::from(vec![Some("a"), Some("b"), None])),
                Arc::new(BooleanArray::from(vec![true, false, true])),
            ],
        )
        .unwrap();
        Dataset::try_new(batch).unwrap()
    }

    #[test]
    fn test_column_kinds() {
        let ds = sample();
        assert_eq!(ds.column_kind("id"), Some(ColumnKind::Numeric));
        assert_eq!(ds.column_kind("score"), Some(ColumnKind::Numeric));
        assert_eq!(ds.column_kind("name"), Some(ColumnKind::Text));
        assert_eq!(ds.column_kind("active"), Some(ColumnKind::Boolean));
        assert_eq!(ds.column_kind("missing"), None);
    }

    #[test]
    fn test_numeric_column_names_keep_order() {
        assert_eq!(sample().numeric_column_names(), vec!["id", "score"]);
    }

    #[test]
    fn test_missing_counts_include_nan() {
        let counts = sample().missing_counts();
        assert_eq!(counts.get("id"), Some(&1));
        assert_eq!(counts.get("score"), Some(&2));
        assert_eq!(counts.get("name"), Some(&1));
        assert_eq!(counts.get("active"), Some(&0));
    }

    #[test]
    fn test_float_values_treat_nan_as_missing() {
        let ds = sample();
        let values = float_values(ds.column("score").unwrap()).unwrap();
        assert_eq!(values, vec![Some(1.5), None, None]);

        let ints = float_values(ds.column("id").unwrap()).unwrap();
        assert_eq!(ints, vec![Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("a", DataType::Int64, true),
            Field::new("a", DataType::Int64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1])),
                Arc::new(Int64Array::from(vec![2])),
            ],
        )
        .unwrap();
        assert!(matches!(
            Dataset::try_new(batch),
            Err(IngestError::ParseFailure(_))
        ));
    }

    #[test]
    fn test_column_map_serializes_in_insertion_order() {
        let map: ColumnMap<usize> = vec![("z", 1), ("a", 2)].into_iter().collect();
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"z":1,"a":2}"#);
    }
}
