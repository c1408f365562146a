//! The profile returned to the caller after a successful upload.

use super::{ColumnKind, ColumnMap, Dataset, IngestError};
use serde::Serialize;

/// Number of leading rows included in a profile preview.
pub const PREVIEW_ROWS: usize = 5;

/// Shape and content overview of a freshly ingested dataset.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub session_id: String,
    pub filename: String,
    pub columns: Vec<String>,
    /// Arrow type name per column, e.g. `Int64` or `Utf8`.
    pub dtypes: ColumnMap<String>,
    pub kinds: ColumnMap<ColumnKind>,
    /// First rows as objects keyed by column name; nulls are explicit.
    pub preview: Vec<serde_json::Map<String, serde_json::Value>>,
    pub stats: ProfileStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileStats {
    pub rows: usize,
    pub columns: usize,
    pub missing_values: ColumnMap<usize>,
}

impl Profile {
    pub fn build(session_id: &str, filename: &str, dataset: &Dataset) -> Result<Self, IngestError> {
        let schema = dataset.schema();
        let dtypes = schema
            .fields()
            .iter()
            .map(|f| (f.name().clone(), f.data_type().to_string()))
            .collect();
        let kinds = schema
            .fields()
            .iter()
            .map(|f| (f.name().clone(), ColumnKind::of(f.data_type())))
            .collect();

        Ok(Self {
            session_id: session_id.to_string(),
            filename: filename.to_string(),
            columns: dataset.column_names(),
            dtypes,
            kinds,
            preview: preview_rows(dataset, PREVIEW_ROWS)?,
            stats: ProfileStats {
                rows: dataset.num_rows(),
                columns: dataset.num_columns(),
                missing_values: dataset.missing_counts(),
            },
        })
    }
}

/// Encode up to `limit` leading rows as JSON objects in column order.
fn preview_rows(
    dataset: &Dataset,
    limit: usize,
) -> Result<Vec<serde_json::Map<String, serde_json::Value>>, IngestError> {
    let len = dataset.num_rows().min(limit);
    if len == 0 {
        return Ok(Vec::new());
    }

    let head = dataset.batch().slice(0, len);
    let mut writer = arrow_json::WriterBuilder::new()
        .with_explicit_nulls(true)
        .build::<_, arrow_json::writer::JsonArray>(Vec::new());
    writer
        .write(&head)
        .map_err(|e| IngestError::Unexpected(format!("Failed to encode preview: {}", e)))?;
    writer
        .finish()
        .map_err(|e| IngestError::Unexpected(format!("Failed to encode preview: {}", e)))?;

    serde_json::from_slice(&writer.into_inner())
        .map_err(|e| IngestError::Unexpected(format!("Failed to decode preview: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::{parse_dataset, FileFormat};
    use serde_json::json;

    #[test]
    fn test_profile_of_small_csv() {
        let csv = b"a,b\n1,x\n2,y\n3,\n4,w\n5,v\n6,u\n";
        let ds = parse_dataset(csv, FileFormat::Csv).unwrap();
        let profile = Profile::build("sess123", "data.csv", &ds).unwrap();

        assert_eq!(profile.columns, vec!["a", "b"]);
        assert_eq!(profile.stats.rows, 6);
        assert_eq!(profile.stats.columns, 2);
        assert_eq!(profile.stats.missing_values.get("b"), Some(&1));
        assert_eq!(profile.dtypes.get("a").map(String::as_str), Some("Int64"));
        assert_eq!(profile.kinds.get("b"), Some(&ColumnKind::Text));

        assert_eq!(profile.preview.len(), PREVIEW_ROWS);
        assert_eq!(profile.preview[0]["a"], json!(1));
        assert_eq!(profile.preview[0]["b"], json!("x"));
        assert_eq!(profile.preview[2]["b"], serde_json::Value::Null);
    }

    #[test]
    fn test_preview_keeps_column_order() {
        let ds = parse_dataset(b"z,a,m\n1,2,3\n", FileFormat::Csv).unwrap();
        let profile = Profile::build("s", "f.csv", &ds).unwrap();

        let keys: Vec<&String> = profile.preview[0].keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_preview_of_empty_dataset() {
        let ds = parse_dataset(b"a,b\n", FileFormat::Csv).unwrap();
        let profile = Profile::build("s", "f.csv", &ds).unwrap();

        assert!(profile.preview.is_empty());
        assert_eq!(profile.stats.rows, 0);
    }
}
