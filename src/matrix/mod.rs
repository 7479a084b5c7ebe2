//! # Value/Engagement Matrix
//!
//! Scores each record by the number of adopted features (boolean-like
//! columns set to `Yes`), maps its sales stage to an engagement level and
//! places it in one of four quadrants. The result of one upload is an
//! immutable [`Snapshot`].

pub mod engagement;
pub mod roles;

use crate::matrix::engagement::engagement_level;
use crate::matrix::roles::ColumnRoles;
use crate::matrix::roles::Role;
use crate::table::column::is_yes;
use crate::table::loader::TableSource;
use crate::table::Table;
use crate::table::Value;
use serde::Serialize;

/// Canonical boolean values after classification
pub const YES: &str = "Yes";
pub const NO: &str = "No";

/// Display labels of the derived fields
pub const DERIVED_FIELDS: [(&str, &str); 4] = [
    ("value_score", "Value Score"),
    ("engagement_level", "Engagement Level"),
    ("quadrant", "Quadrant"),
    ("size", "Size"),
];

/// Classification bucket of a record
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Quadrant {
    #[serde(rename = "Strategic Partners")]
    StrategicPartners,
    #[serde(rename = "Growth Opportunities")]
    GrowthOpportunities,
    #[serde(rename = "High Value Prospects")]
    HighValueProspects,
    #[serde(rename = "Basic Users")]
    BasicUsers,
    /// Fallback when no threshold comparison holds
    Unclassified,
}

impl Quadrant {
    /// The four regular quadrants, in zone drawing order
    pub const ZONES: [Quadrant; 4] = [
        Quadrant::StrategicPartners,
        Quadrant::GrowthOpportunities,
        Quadrant::HighValueProspects,
        Quadrant::BasicUsers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quadrant::StrategicPartners => "Strategic Partners",
            Quadrant::GrowthOpportunities => "Growth Opportunities",
            Quadrant::HighValueProspects => "High Value Prospects",
            Quadrant::BasicUsers => "Basic Users",
            Quadrant::Unclassified => "Unclassified",
        }
    }

    /// Display colour as a hex RGB string
    pub fn color(&self) -> &'static str {
        match self {
            Quadrant::StrategicPartners => "#4C72B0",
            Quadrant::GrowthOpportunities => "#55A868",
            Quadrant::HighValueProspects => "#DD8452",
            Quadrant::BasicUsers => "#C44E52",
            Quadrant::Unclassified => "#777777",
        }
    }
}

impl std::fmt::Display for Quadrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification thresholds
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct ClassifierOptions {
    /// Share of the maximum score a record needs to count as high value
    pub value_threshold_ratio: f64,
    /// Engagement level a record needs to count as engaged
    pub engagement_threshold: f64,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            value_threshold_ratio: 0.65,
            engagement_threshold: 2.0,
        }
    }
}

/// Derived fields of one record
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct ClassifiedRecord {
    /// Number of boolean columns set to `Yes`
    pub value_score: usize,
    /// Engagement level in `0..=4`
    pub engagement_level: u8,
    pub quadrant: Quadrant,
    /// Display magnitude in `[20, 60]`
    pub size: f64,
}

/// The classified table of one upload. Never mutated after creation.
#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    /// Name of the uploaded file
    pub file_name: String,
    /// How the upload was read
    pub source: Option<TableSource>,
    /// Normalized table; boolean columns hold `Yes`/`No`
    pub table: Table,
    /// Keys of the boolean-like columns, in table order
    pub boolean_columns: Vec<String>,
    pub roles: ColumnRoles,
    /// Number of boolean columns, or 1 when there are none
    pub max_score: usize,
    pub value_threshold: f64,
    pub engagement_threshold: f64,
    /// Derived fields, aligned with `table.rows`
    pub records: Vec<ClassifiedRecord>,
}

impl Snapshot {
    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Display name of a column key: the original header for table columns,
    /// fixed labels for derived fields, a title-cased key otherwise.
    /// An uploaded column keeps its header even when its key matches a derived field.
    pub fn display_name(&self, key: &str) -> String {
        if let Some(label) = self.table.label(key) {
            return label.to_owned();
        }
        match DERIVED_FIELDS.iter().find(|(field, _)| *field == key) {
            Some((_, label)) => label.to_string(),
            None => title_case(key),
        }
    }

    /// Key to display name mapping for table columns followed by the derived
    /// fields whose keys no table column already uses
    pub fn display_names(&self) -> Vec<(String, String)> {
        let derived = DERIVED_FIELDS
            .iter()
            .map(|(field, _)| *field)
            .filter(|field| self.table.column_index(field).is_none());
        self.table
            .keys()
            .chain(derived)
            .map(|key| (key.to_owned(), self.display_name(key)))
            .collect()
    }

    /// Textual value of `key` in record `row`, empty for blanks or unknown keys
    pub fn text(&self, row: usize, key: &str) -> String {
        self.table.value(row, key).map(Value::text).unwrap_or_default()
    }

    /// Group label of a record, when a group column exists
    pub fn group_of(&self, row: usize) -> Option<String> {
        self.roles.get(Role::Group).map(|key| self.text(row, key))
    }

    /// Agency label of a record, when an agency column exists
    pub fn agency_of(&self, row: usize) -> Option<String> {
        self.roles.get(Role::Agency).map(|key| self.text(row, key))
    }
}

/// `physician_group` becomes `Physician Group`
fn title_case(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut characters = word.chars();
            match characters.next() {
                Some(first) => first.to_uppercase().chain(characters.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Largest possible value score; never zero.
pub fn max_score(boolean_column_count: usize) -> usize {
    boolean_column_count.max(1)
}

/// Assigns the quadrant from thresholded score and engagement.
/// Falls back to `Unclassified` only when no comparison holds (non-finite input).
pub fn quadrant(value_score: f64, engagement_level: f64, value_threshold: f64, engagement_threshold: f64) -> Quadrant {
    let high_value = value_score >= value_threshold;
    let low_value = value_score < value_threshold;
    let engaged = engagement_level >= engagement_threshold;
    let unengaged = engagement_level < engagement_threshold;
    if high_value && engaged {
        Quadrant::StrategicPartners
    } else if low_value && engaged {
        Quadrant::GrowthOpportunities
    } else if high_value && unengaged {
        Quadrant::HighValueProspects
    } else if low_value && unengaged {
        Quadrant::BasicUsers
    } else {
        Quadrant::Unclassified
    }
}

/// Bubble size for a value score, clamped to `[20, 60]`
pub fn bubble_size(value_score: usize) -> f64 {
    (value_score as f64 * 12.0 + 25.0).clamp(20.0, 60.0)
}

/// Rewrites the boolean columns to `Yes`/`No`; blanks and unknown values become `No`.
pub fn normalize_boolean_values(table: &mut Table, boolean_columns: &[String]) {
    let indexes: Vec<usize> = boolean_columns
        .iter()
        .filter_map(|key| table.column_index(key))
        .collect();
    for row in table.rows.iter_mut() {
        for index in &indexes {
            if let Some(value) = row.get_mut(*index) {
                let canonical = if is_yes(value) { YES } else { NO };
                *value = Value::Text(canonical.to_owned());
            }
        }
    }
}

/// Derives score, engagement, quadrant and size for every row
pub fn classify_records(table: &Table, boolean_columns: &[String], roles: &ColumnRoles, options: &ClassifierOptions) -> Vec<ClassifiedRecord> {
    let max_score = max_score(boolean_columns.len());
    let value_threshold = max_score as f64 * options.value_threshold_ratio;
    let boolean_indexes: Vec<usize> = boolean_columns
        .iter()
        .filter_map(|key| table.column_index(key))
        .collect();
    let stage_index = roles.get(Role::Stage).and_then(|key| table.column_index(key));

    table.rows
        .iter()
        .map(|row| {
            let value_score = boolean_indexes
                .iter()
                .filter(|index| row.get(**index).map(is_yes).unwrap_or(false))
                .count();
            let engagement_level = stage_index
                .and_then(|index| row.get(index))
                .map(|value| engagement_level(&value.text()))
                .unwrap_or(0);
            ClassifiedRecord {
                value_score,
                engagement_level,
                quadrant: quadrant(
                    value_score as f64,
                    engagement_level as f64,
                    value_threshold,
                    options.engagement_threshold,
                ),
                size: bubble_size(value_score),
            }
        })
        .collect()
}

/// Builds the snapshot of one upload from its normalized table.
///
/// # Arguments
/// * `table` - Normalized table
/// * `boolean_columns` - Keys of the boolean-like columns
/// * `file_name` - Name of the uploaded file
/// * `options` - Classification thresholds
pub fn classify(mut table: Table, boolean_columns: Vec<String>, file_name: &str, options: &ClassifierOptions) -> Snapshot {
    normalize_boolean_values(&mut table, &boolean_columns);
    let roles = ColumnRoles::discover(table.keys());
    let records = classify_records(&table, &boolean_columns, &roles, options);
    let max_score = max_score(boolean_columns.len());
    log::debug!("Column roles: {:?}", roles);

    Snapshot {
        file_name: file_name.to_owned(),
        source: None,
        table,
        boolean_columns,
        roles,
        max_score,
        value_threshold: max_score as f64 * options.value_threshold_ratio,
        engagement_threshold: options.engagement_threshold,
        records,
    }
}
