//! Click-through details of a selected record.

use crate::matrix::engagement::engagement_label;
use crate::matrix::Quadrant;
use crate::matrix::Snapshot;
use crate::matrix::YES;
use crate::session::controls::Selection;
use crate::session::view::record_label;
use crate::table::Value;
use serde::Serialize;
use thiserror::Error;

/// The selected record is not among the visible records
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetailLookupFailure {
    #[error("Could not load details: row {0} is not visible")]
    RowNotVisible(usize),

    #[error("Could not load details: '{0}' is not visible")]
    LabelNotVisible(String),
}

/// One original field with its display label
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetailField {
    pub key: String,
    pub label: String,
    pub value: Value,
}

/// Adoption state of one feature
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeatureAdoption {
    pub key: String,
    pub label: String,
    pub adopted: bool,
    /// `Adopted` or `Not Adopted`
    pub status: &'static str,
}

/// Everything shown for a selected record
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecordDetail {
    /// Row index in the snapshot
    pub row: usize,
    pub label: String,
    pub group: Option<String>,
    /// Original fields in table order
    pub fields: Vec<DetailField>,
    pub features: Vec<FeatureAdoption>,
    pub value_score: usize,
    pub max_score: usize,
    /// Score as `value/max`
    pub score_text: String,
    pub engagement_level: u8,
    pub engagement_label: &'static str,
    pub quadrant: Quadrant,
    pub quadrant_color: &'static str,
    pub size: f64,
}

/// Finds the selected record among the visible rows.
/// A label selects the first visible record with that agency.
pub fn resolve_selection(snapshot: &Snapshot, visible: &[usize], selection: &Selection) -> Result<usize, DetailLookupFailure> {
    match selection {
        Selection::Row(row) => visible
            .iter()
            .copied()
            .find(|candidate| candidate == row)
            .ok_or(DetailLookupFailure::RowNotVisible(*row)),
        Selection::Label(label) => visible
            .iter()
            .copied()
            .find(|row| snapshot.agency_of(*row).as_deref() == Some(label.as_str()))
            .ok_or_else(|| DetailLookupFailure::LabelNotVisible(label.to_owned())),
    }
}

/// Builds the detail payload of one row
pub fn record_detail(snapshot: &Snapshot, row: usize) -> RecordDetail {
    let record = snapshot.records[row];
    let fields = snapshot.table.columns
        .iter()
        .map(|column| DetailField {
            key: column.key.to_owned(),
            label: column.label.to_owned(),
            value: snapshot.table.value(row, &column.key).cloned().unwrap_or(Value::Blank),
        })
        .collect();
    let features = snapshot.boolean_columns
        .iter()
        .map(|key| {
            let adopted = snapshot.text(row, key) == YES;
            FeatureAdoption {
                key: key.to_owned(),
                label: snapshot.display_name(key),
                adopted,
                status: if adopted { "Adopted" } else { "Not Adopted" },
            }
        })
        .collect();

    RecordDetail {
        row,
        label: record_label(snapshot, row),
        group: snapshot.group_of(row),
        fields,
        features,
        value_score: record.value_score,
        max_score: snapshot.max_score,
        score_text: format!("{}/{}", record.value_score, snapshot.max_score),
        engagement_level: record.engagement_level,
        engagement_label: engagement_label(record.engagement_level),
        quadrant: record.quadrant,
        quadrant_color: record.quadrant.color(),
        size: record.size,
    }
}
