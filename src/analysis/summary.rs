use super::stats::{describe, Describe};
use super::{numeric_values, AnalysisError};
use crate::datasets::{ColumnMap, Dataset};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryResult {
    /// Statistics per numeric column, in dataset order.
    pub summary: ColumnMap<Describe>,
}

/// Describe every numeric column. A dataset without numeric columns yields an
/// empty mapping rather than an error.
pub fn run(dataset: &Dataset) -> Result<SummaryResult, AnalysisError> {
    let mut summary = ColumnMap::new();
    for column in dataset.numeric_column_names() {
        let values = numeric_values(dataset, &column, "summary")?;
        summary.insert(column, describe(&values));
    }
    Ok(SummaryResult { summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::csv;

    #[test]
    fn test_summary_covers_numeric_columns_only() {
        let ds = csv("name,age,score,active\nann,30,1.5,true\nbob,40,,false\ncy,50,2.5,true\n");
        let result = run(&ds).unwrap();

        let keys: Vec<&str> = result.summary.keys().collect();
        assert_eq!(keys, vec!["age", "score"]);

        let age = result.summary.get("age").unwrap();
        assert_eq!(age.count, 3);
        assert_eq!(age.mean, Some(40.0));
        assert_eq!(age.q50, Some(40.0));

        let score = result.summary.get("score").unwrap();
        assert_eq!(score.count, 2);
        assert_eq!(score.min, Some(1.5));
        assert_eq!(score.max, Some(2.5));
    }

    #[test]
    fn test_summary_without_numeric_columns_is_empty() {
        let ds = csv("name,city\nann,paris\n");
        let result = run(&ds).unwrap();
        assert!(result.summary.is_empty());
        assert_eq!(serde_json::to_string(&result).unwrap(), r#"{"summary":{}}"#);
    }

    #[test]
    fn test_summary_is_repeatable() {
        let ds = csv("a,b\n1,2\n3,5\n8,13\n");
        assert_eq!(run(&ds).unwrap(), run(&ds).unwrap());
    }
}
