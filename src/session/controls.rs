//! UI control state of a session.

use crate::matrix::Snapshot;
use serde::Serialize;
use std::collections::HashSet;
use std::str::FromStr;

/// Which projection is rendered
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Value/engagement scatter with quadrant zones
    #[default]
    Quadrant,
    /// Feature adoption matrix
    Heatmap,
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "quadrant" => Ok(ViewMode::Quadrant),
            "heatmap" => Ok(ViewMode::Heatmap),
            other => Err(format!("unknown view mode '{other}'")),
        }
    }
}

/// The record whose details are requested
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Row index in the snapshot
    Row(usize),
    /// Agency label, matched against the visible records
    Label(String),
}

/// Filter and display controls. Empty filter lists mean no filtering.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Controls {
    /// Visible group values
    pub groups: Vec<String>,
    /// Visible agency values
    pub agencies: Vec<String>,
    pub view: ViewMode,
    /// Draw the quadrant zones in the quadrant view
    pub show_zones: bool,
    pub selection: Option<Selection>,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            agencies: Vec::new(),
            view: ViewMode::default(),
            show_zones: true,
            selection: None,
        }
    }
}

impl Controls {
    /// Initial controls after an upload: every group selected, no agency filter
    pub fn for_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            groups: FilterOptions::from_snapshot(snapshot).groups,
            ..Controls::default()
        }
    }
}

/// Values offered by the group and agency filters
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    /// Distinct group values in first appearance order
    pub groups: Vec<String>,
    /// Distinct agency values in first appearance order
    pub agencies: Vec<String>,
}

impl FilterOptions {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let rows = 0..snapshot.len();
        Self {
            groups: distinct(rows.clone().filter_map(|row| snapshot.group_of(row))),
            agencies: distinct(rows.filter_map(|row| snapshot.agency_of(row))),
        }
    }
}

fn distinct<I: Iterator<Item = String>>(values: I) -> Vec<String> {
    let mut seen = HashSet::<String>::new();
    values.filter(|value| seen.insert(value.to_owned())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_modes() {
        assert_eq!("quadrant".parse::<ViewMode>(), Ok(ViewMode::Quadrant));
        assert_eq!(" Heatmap ".parse::<ViewMode>(), Ok(ViewMode::Heatmap));
        assert!("pie".parse::<ViewMode>().is_err());
    }

    #[test]
    fn default_controls() {
        let controls = Controls::default();
        assert_eq!(controls.view, ViewMode::Quadrant);
        assert!(controls.show_zones);
        assert!(controls.groups.is_empty());
        assert_eq!(controls.selection, None);
    }

    #[test]
    fn distinct_keeps_first_appearance() {
        let values = ["b", "a", "b", "c", "a"].into_iter().map(str::to_owned);
        assert_eq!(distinct(values), vec!["b", "a", "c"]);
    }
}
