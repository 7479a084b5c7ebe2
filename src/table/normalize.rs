//! Canonical column keys for loaded tables.

use crate::table::loader::RawTable;
use crate::table::Column;
use crate::table::Table;
use crate::table::Value;
use std::collections::HashMap;

/// Canonical key of a header: trimmed, lowercased, spaces replaced by underscores.
/// `"  Agency Name "` becomes `"agency_name"`.
pub fn normalize_key(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "_")
}

/// Assigns canonical keys to the columns of a loaded table.
///
/// When two headers normalize to the same key the later column wins: the
/// earlier one is dropped with its values, the later one keeps its position,
/// and a warning is logged. Original headers are kept as display labels.
pub fn normalize_columns(raw: RawTable) -> Table {
    let keys: Vec<String> = raw.labels.iter().map(|label| normalize_key(label)).collect();

    let mut last_position = HashMap::<&str, usize>::new();
    for (index, key) in keys.iter().enumerate() {
        if let Some(previous) = last_position.insert(key, index) {
            log::warn!(
                "Columns '{}' and '{}' share the key '{}'; keeping the later one",
                raw.labels[previous],
                raw.labels[index],
                key
            );
        }
    }
    let kept: Vec<usize> = (0..keys.len())
        .filter(|index| last_position.get(keys[*index].as_str()) == Some(index))
        .collect();

    let columns = kept
        .iter()
        .map(|index| Column {
            key: keys[*index].to_owned(),
            label: raw.labels[*index].to_owned(),
        })
        .collect();
    let rows = raw.rows
        .into_iter()
        .map(|mut row| {
            row.resize(keys.len(), Value::Blank);
            kept.iter().map(|index| std::mem::replace(&mut row[*index], Value::Blank)).collect()
        })
        .collect();

    Table { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw(labels: &[&str], rows: Vec<Vec<Value>>) -> RawTable {
        RawTable {
            labels: labels.iter().map(|label| label.to_string()).collect(),
            rows,
            ..RawTable::default()
        }
    }

    fn text(value: &str) -> Value {
        Value::Text(value.to_owned())
    }

    #[test]
    fn keys() {
        assert_eq!(normalize_key("  Agency Name "), "agency_name");
        assert_eq!(normalize_key("Sales Stage (Subscription)"), "sales_stage_(subscription)");
        assert_eq!(normalize_key("HAS_EHR"), "has_ehr");
        assert_eq!(normalize_key("Ünïcode Spaß"), "ünïcode_spaß");
        assert_eq!(normalize_key(""), "");
    }

    #[test]
    fn labels_are_retained() {
        let table = normalize_columns(raw(&["Agency Name", " Stage"], vec![vec![text("Acme"), text("Full")]]));
        assert_eq!(table.columns, vec![
            Column { key: "agency_name".to_owned(), label: "Agency Name".to_owned() },
            Column { key: "stage".to_owned(), label: " Stage".to_owned() },
        ]);
        assert_eq!(table.rows, vec![vec![text("Acme"), text("Full")]]);
    }

    #[test]
    fn collisions_keep_the_later_column() {
        let table = normalize_columns(raw(
            &["Region", "agency name", "Has EHR", "Agency Name"],
            vec![
                vec![text("north"), text("first"), text("yes"), text("second")],
                vec![text("south"), text("third"), text("no"), text("fourth")],
            ],
        ));
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["region", "has_ehr", "agency_name"]);
        assert_eq!(table.label("agency_name"), Some("Agency Name"));
        assert_eq!(table.rows[0], vec![text("north"), text("yes"), text("second")]);
        assert_eq!(table.rows[1], vec![text("south"), text("no"), text("fourth")]);
    }
}
