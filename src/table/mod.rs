//! # Tabular Data Module
//!
//! Generic row/column tables built from uploads: the cell `Value` model, the
//! byte-level loader (workbook or delimited text), column key normalization
//! and boolean-column inference.

pub mod column;
pub(crate) mod delimited;
pub mod loader;
pub mod normalize;

use serde::Serialize;

/// One cell of an uploaded table
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing value (empty cell or configured null literal)
    Blank,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Spreadsheet error cell such as `#N/A` or `#DIV/0!`
    Error(String),
}

impl Value {
    /// Returns true for missing values.
    pub fn is_blank(&self) -> bool {
        matches!(self, Value::Blank)
    }

    /// Textual form of the value.
    ///
    /// Integral numbers are rendered without a fractional part (`1`, not `1.0`),
    /// booleans as `true`/`false` and blanks as the empty string.
    pub fn text(&self) -> String {
        match self {
            Value::Blank => String::new(),
            Value::Text(text) | Value::Error(text) => text.to_owned(),
            Value::Number(number) if number.is_finite() && number.fract() == 0.0 && number.abs() < 1e15 => {
                format!("{}", *number as i64)
            }
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
        }
    }
}

/// A column of a normalized table
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Column {
    /// Canonical key: trimmed, lowercased, spaces replaced by underscores
    pub key: String,
    /// Header as it appeared in the upload
    pub label: String,
}

/// An ordered set of columns with rows of values aligned to them.
/// Column keys are unique.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the column with the given key
    pub fn column_index(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.key == key)
    }

    /// Original label of the column with the given key
    pub fn label(&self, key: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|column| column.key == key)
            .map(|column| column.label.as_str())
    }

    /// Column keys in table order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.key.as_str())
    }

    /// Values of one column, top to bottom; empty if the key is unknown.
    pub fn column_values<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a Value> + 'a {
        let index = self.column_index(key);
        self.rows
            .iter()
            .filter_map(move |row| index.and_then(|index| row.get(index)))
    }

    /// Value at `row` in the column with the given key
    pub fn value(&self, row: usize, key: &str) -> Option<&Value> {
        let index = self.column_index(key)?;
        self.rows.get(row)?.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table() -> Table {
        Table {
            columns: vec![
                Column { key: "agency_name".to_owned(), label: "Agency Name".to_owned() },
                Column { key: "has_ehr".to_owned(), label: "Has EHR".to_owned() },
            ],
            rows: vec![
                vec![Value::Text("Acme".to_owned()), Value::Bool(true)],
                vec![Value::Text("Globex".to_owned()), Value::Blank],
            ],
        }
    }

    #[test]
    fn value_text() {
        assert_eq!(Value::Blank.text(), "");
        assert_eq!(Value::Number(1.0).text(), "1");
        assert_eq!(Value::Number(-3.0).text(), "-3");
        assert_eq!(Value::Number(2.5).text(), "2.5");
        assert_eq!(Value::Number(f64::NAN).text(), "NaN");
        assert_eq!(Value::Bool(false).text(), "false");
        assert_eq!(Value::Error("#N/A".to_owned()).text(), "#N/A");
    }

    #[test]
    fn value_serialization() {
        let values = vec![Value::Blank, Value::Text("Yes".to_owned()), Value::Number(3.0), Value::Bool(true)];
        assert_eq!(serde_json::to_string(&values).unwrap(), r#"[null,"Yes",3.0,true]"#);
    }

    #[test]
    fn table_lookup() {
        let table = table();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_index("has_ehr"), Some(1));
        assert_eq!(table.label("agency_name"), Some("Agency Name"));
        assert_eq!(table.label("missing"), None);
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["agency_name", "has_ehr"]);
        assert_eq!(table.column_values("has_ehr").collect::<Vec<_>>(), vec![&Value::Bool(true), &Value::Blank]);
        assert_eq!(table.column_values("missing").count(), 0);
        assert_eq!(table.value(1, "agency_name"), Some(&Value::Text("Globex".to_owned())));
        assert_eq!(table.value(5, "agency_name"), None);
    }
}
