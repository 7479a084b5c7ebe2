//! Detection of boolean-like (yes/no) columns.

use crate::table::Table;
use crate::table::Value;
use std::collections::BTreeSet;
use thiserror::Error;

/// Textual values (trimmed, lowercased) accepted in a boolean-like column
pub const BOOLEAN_VOCABULARY: [&str; 8] = ["yes", "no", "y", "n", "1", "0", "true", "false"];

/// Textual values (trimmed, lowercased) counted as `Yes`
pub const YES_VALUES: [&str; 4] = ["yes", "y", "1", "true"];

/// Why a column was left out of boolean inference
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColumnInferenceSkip {
    #[error("column '{0}' has no non-blank values")]
    Empty(String),

    #[error("column '{column}' contains the error value '{value}'")]
    ErrorCell { column: String, value: String },
}

/// Options for boolean-column inference
#[derive(Clone, Debug, Default)]
pub struct InferenceOptions {
    /// Treat columns without any non-blank value as boolean-like
    pub include_empty_columns: bool,
}

/// Trimmed, lowercased textual form used for vocabulary checks
pub fn canonical_text(value: &Value) -> String {
    value.text().trim().to_lowercase()
}

/// Returns true if the value counts as `Yes`
pub fn is_yes(value: &Value) -> bool {
    YES_VALUES.contains(&canonical_text(value).as_str())
}

/// Decides whether one column is boolean-like.
///
/// A column is boolean-like when the distinct canonical forms of its
/// non-blank values are a subset of the yes/no vocabulary.
///
/// # Returns
/// `Ok(true)` or `Ok(false)`, or the reason the column was skipped
pub fn infer_boolean_column(table: &Table, key: &str, options: &InferenceOptions) -> Result<bool, ColumnInferenceSkip> {
    let mut distinct = BTreeSet::<String>::new();
    for value in table.column_values(key) {
        match value {
            Value::Blank => (),
            Value::Error(error) => Err(ColumnInferenceSkip::ErrorCell {
                column: key.to_owned(),
                value: error.to_owned(),
            })?,
            value => {
                distinct.insert(canonical_text(value));
            }
        }
    }

    if distinct.is_empty() {
        return if options.include_empty_columns {
            Ok(true)
        } else {
            Err(ColumnInferenceSkip::Empty(key.to_owned()))
        };
    }
    Ok(distinct.iter().all(|value| BOOLEAN_VOCABULARY.contains(&value.as_str())))
}

/// Collects the keys of all boolean-like columns, in table order.
/// Skipped columns are logged and excluded.
pub fn infer_boolean_columns(table: &Table, options: &InferenceOptions) -> Vec<String> {
    table
        .keys()
        .filter(|key| match infer_boolean_column(table, key, options) {
            Ok(is_boolean) => is_boolean,
            Err(skip) => {
                log::debug!("Boolean inference skipped: {}", skip);
                false
            }
        })
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use pretty_assertions::assert_eq;

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
        Table {
            columns: columns
                .iter()
                .map(|key| Column { key: key.to_string(), label: key.to_string() })
                .collect(),
            rows,
        }
    }

    fn text(value: &str) -> Value {
        Value::Text(value.to_owned())
    }

    #[test]
    fn yes_values() {
        for value in [text("Yes"), text(" yes "), text("Y"), text("1"), text("true"), text("TRUE"), Value::Bool(true), Value::Number(1.0)] {
            assert!(is_yes(&value), "{value:?}");
        }
        for value in [text("No"), text("maybe"), Value::Blank, Value::Number(0.0), Value::Number(1.5), Value::Bool(false)] {
            assert!(!is_yes(&value), "{value:?}");
        }
    }

    #[test]
    fn vocabulary_subset() {
        let table = table(&["ehr", "portal", "name", "mixed"], vec![
            vec![text("Yes"), Value::Number(1.0), text("Acme"), text("yes")],
            vec![text(" n "), Value::Number(0.0), text("Globex"), text("2")],
            vec![Value::Blank, Value::Bool(true), text("Initech"), text("no")],
        ]);
        let options = InferenceOptions::default();
        assert_eq!(infer_boolean_column(&table, "ehr", &options), Ok(true));
        assert_eq!(infer_boolean_column(&table, "portal", &options), Ok(true));
        assert_eq!(infer_boolean_column(&table, "name", &options), Ok(false));
        assert_eq!(infer_boolean_column(&table, "mixed", &options), Ok(false));
        assert_eq!(infer_boolean_columns(&table, &options), vec!["ehr", "portal"]);
    }

    #[test]
    fn decimal_text_is_not_boolean() {
        let table = table(&["flag"], vec![vec![text("1.0")], vec![text("0")]]);
        assert_eq!(infer_boolean_column(&table, "flag", &InferenceOptions::default()), Ok(false));
    }

    #[test]
    fn skips() {
        let table = table(&["empty", "broken", "flag"], vec![
            vec![Value::Blank, text("yes"), text("no")],
            vec![Value::Blank, Value::Error("#N/A".to_owned()), text("yes")],
        ]);
        let options = InferenceOptions::default();
        assert_eq!(
            infer_boolean_column(&table, "empty", &options),
            Err(ColumnInferenceSkip::Empty("empty".to_owned()))
        );
        assert_eq!(
            infer_boolean_column(&table, "broken", &options),
            Err(ColumnInferenceSkip::ErrorCell { column: "broken".to_owned(), value: "#N/A".to_owned() })
        );
        assert_eq!(infer_boolean_columns(&table, &options), vec!["flag"]);

        let options = InferenceOptions { include_empty_columns: true };
        assert_eq!(infer_boolean_columns(&table, &options), vec!["empty", "flag"]);
    }
}
