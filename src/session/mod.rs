//! # Session
//!
//! Explicit context of one interactive user: the snapshot of the last
//! successful upload plus the control state. Every interaction is a method
//! call; rendering is a read-only projection over the snapshot.

pub mod controls;
pub mod detail;
pub mod view;

use crate::matrix::Snapshot;
use crate::pipeline::build_snapshot;
use crate::pipeline::PipelineOptions;
use crate::session::controls::Controls;
use crate::session::controls::FilterOptions;
use crate::session::controls::Selection;
use crate::session::controls::ViewMode;
use crate::session::detail::record_detail;
use crate::session::detail::resolve_selection;
use crate::session::detail::DetailLookupFailure;
use crate::session::detail::RecordDetail;
use crate::session::view::heatmap_view;
use crate::session::view::quadrant_view;
use crate::session::view::View;
use crate::table::loader::LoadError;
use crate::table::loader::TableSource;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Outcome of a successful upload
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UploadSummary {
    pub file_name: String,
    pub record_count: usize,
    pub boolean_column_count: usize,
    pub boolean_columns: Vec<String>,
    pub source: Option<TableSource>,
}

impl fmt::Display for UploadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Successfully processed: {} ({} agencies, {} feature columns)",
            self.file_name, self.record_count, self.boolean_column_count
        )
    }
}

/// Everything the host needs to draw the current state
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Rendering {
    pub file_name: String,
    pub controls: Controls,
    pub filter_options: FilterOptions,
    /// Key to display name mapping, derived fields included
    pub display_names: Vec<(String, String)>,
    pub view: View,
    /// Details of the selected record, if one is selected and visible
    pub detail: Option<RecordDetail>,
    /// Inline notice when the selected record is not visible
    pub notice: Option<String>,
}

/// State of one interactive session
#[derive(Debug, Default)]
pub struct Session {
    options: PipelineOptions,
    snapshot: Option<Arc<Snapshot>>,
    controls: Controls,
}

impl Session {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            snapshot: None,
            controls: Controls::default(),
        }
    }

    /// Snapshot of the last successful upload
    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        self.snapshot.as_ref()
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    /// Runs the pipeline over an upload.
    ///
    /// On success the snapshot is replaced wholesale and the controls are
    /// reset for it. On failure the previous snapshot and controls are kept.
    pub fn upload(&mut self, bytes: &[u8], file_name: Option<&str>) -> Result<UploadSummary, LoadError> {
        let snapshot = Arc::new(build_snapshot(bytes, file_name, &self.options)?);
        let summary = UploadSummary {
            file_name: snapshot.file_name.to_owned(),
            record_count: snapshot.len(),
            boolean_column_count: snapshot.boolean_columns.len(),
            boolean_columns: snapshot.boolean_columns.to_owned(),
            source: snapshot.source.to_owned(),
        };
        self.controls = Controls::for_snapshot(&snapshot);
        self.snapshot = Some(snapshot);
        log::info!("{}", summary);
        Ok(summary)
    }

    /// Restricts the visible groups; an empty list shows every group
    pub fn set_groups(&mut self, groups: Vec<String>) {
        self.controls.groups = groups;
    }

    /// Restricts the visible agencies; an empty list shows every agency
    pub fn set_agencies(&mut self, agencies: Vec<String>) {
        self.controls.agencies = agencies;
    }

    pub fn set_view(&mut self, view: ViewMode) {
        self.controls.view = view;
    }

    pub fn set_show_zones(&mut self, show_zones: bool) {
        self.controls.show_zones = show_zones;
    }

    pub fn select(&mut self, selection: Option<Selection>) {
        self.controls.selection = selection;
    }

    /// Restores the controls chosen right after the upload
    pub fn reset_controls(&mut self) {
        self.controls = match &self.snapshot {
            Some(snapshot) => Controls::for_snapshot(snapshot),
            None => Controls::default(),
        };
    }

    /// Values offered by the filters; empty before the first upload
    pub fn filter_options(&self) -> FilterOptions {
        self.snapshot
            .as_deref()
            .map(FilterOptions::from_snapshot)
            .unwrap_or_default()
    }

    /// Rows passing the group and agency filters, in table order.
    /// A filter is ignored when its column does not exist or its list is empty.
    pub fn visible_rows(&self) -> Vec<usize> {
        let Some(snapshot) = self.snapshot.as_deref() else {
            return Vec::new();
        };
        (0..snapshot.len())
            .filter(|row| accepts(&self.controls.groups, snapshot.group_of(*row)))
            .filter(|row| accepts(&self.controls.agencies, snapshot.agency_of(*row)))
            .collect()
    }

    /// Details of the selected record.
    ///
    /// # Returns
    /// `Ok(None)` when nothing is selected, or a `DetailLookupFailure` when
    /// the selection is hidden by the filters
    pub fn detail(&self) -> Result<Option<RecordDetail>, DetailLookupFailure> {
        let (Some(snapshot), Some(selection)) = (self.snapshot.as_deref(), &self.controls.selection) else {
            return Ok(None);
        };
        let row = resolve_selection(snapshot, &self.visible_rows(), selection)?;
        Ok(Some(record_detail(snapshot, row)))
    }

    /// Projects the snapshot through the controls; `None` before the first upload
    pub fn render(&self) -> Option<Rendering> {
        let snapshot = self.snapshot.as_deref()?;
        let visible = self.visible_rows();
        let view = match self.controls.view {
            ViewMode::Quadrant => View::Quadrant(quadrant_view(snapshot, &visible, self.controls.show_zones)),
            ViewMode::Heatmap => View::Heatmap(heatmap_view(snapshot, &visible)),
        };
        let (detail, notice) = match self.detail() {
            Ok(detail) => (detail, None),
            Err(failure) => {
                log::warn!("{}", failure);
                (None, Some(failure.to_string()))
            }
        };

        Some(Rendering {
            file_name: snapshot.file_name.to_owned(),
            controls: self.controls.to_owned(),
            filter_options: FilterOptions::from_snapshot(snapshot),
            display_names: snapshot.display_names(),
            view,
            detail,
            notice,
        })
    }
}

fn accepts(filter: &[String], value: Option<String>) -> bool {
    match value {
        Some(value) if !filter.is_empty() => filter.contains(&value),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    const AGENCIES: &str = indoc! {"
        Agency Name,Physician Group,Has EHR,Uses Portal,Sales Stage
        Acme,North,Yes,yes,Orders 360 Full
        Globex,South,No,no,Freemium
        Initech,North,yes,no,DA-Direct
    "};

    fn session() -> Session {
        let mut session = Session::default();
        session.upload(AGENCIES.as_bytes(), Some("agencies.csv")).unwrap();
        session
    }

    #[test]
    fn upload_summary() {
        let mut session = Session::default();
        let summary = session.upload(AGENCIES.as_bytes(), Some("agencies.csv")).unwrap();
        assert_eq!(summary.record_count, 3);
        assert_eq!(summary.boolean_column_count, 2);
        assert_eq!(summary.to_string(), "Successfully processed: agencies.csv (3 agencies, 2 feature columns)");
        assert_eq!(session.controls().groups, vec!["North", "South"]);
        assert_eq!(session.filter_options().agencies, vec!["Acme", "Globex", "Initech"]);
    }

    #[test]
    fn failed_upload_keeps_snapshot() {
        let mut session = session();
        session.set_view(ViewMode::Heatmap);
        let error = session.upload(b"Agency Name,Has EHR\n", Some("empty.csv")).unwrap_err();
        assert!(matches!(error, LoadError::NoRows(_)));
        assert_eq!(session.snapshot().map(|snapshot| snapshot.file_name.as_str()), Some("agencies.csv"));
        assert_eq!(session.controls().view, ViewMode::Heatmap);
    }

    #[test]
    fn filters() {
        let mut session = session();
        assert_eq!(session.visible_rows(), vec![0, 1, 2]);
        session.set_groups(vec!["North".to_owned()]);
        assert_eq!(session.visible_rows(), vec![0, 2]);
        session.set_agencies(vec!["Initech".to_owned(), "Globex".to_owned()]);
        assert_eq!(session.visible_rows(), vec![2]);
        session.set_groups(Vec::new());
        assert_eq!(session.visible_rows(), vec![1, 2]);
        session.reset_controls();
        assert_eq!(session.visible_rows(), vec![0, 1, 2]);
    }

    #[test]
    fn hidden_selection_is_a_lookup_failure() {
        let mut session = session();
        session.select(Some(Selection::Label("Globex".to_owned())));
        assert_eq!(session.detail().unwrap().map(|detail| detail.row), Some(1));

        session.set_groups(vec!["North".to_owned()]);
        assert_eq!(session.detail(), Err(DetailLookupFailure::LabelNotVisible("Globex".to_owned())));

        let rendering = session.render().unwrap();
        assert_eq!(rendering.detail, None);
        assert_eq!(rendering.notice.as_deref(), Some("Could not load details: 'Globex' is not visible"));
    }

    #[test]
    fn render_views() {
        let mut session = session();
        session.select(Some(Selection::Row(0)));
        let rendering = session.render().unwrap();
        assert!(matches!(rendering.view, View::Quadrant(_)));
        assert_eq!(rendering.detail.map(|detail| detail.label), Some("Acme".to_owned()));
        assert_eq!(rendering.notice, None);

        session.set_view(ViewMode::Heatmap);
        match session.render().unwrap().view {
            View::Heatmap(heatmap) => assert_eq!(heatmap.records[0].label, "Acme"),
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn nothing_to_render_before_upload() {
        let session = Session::default();
        assert!(session.render().is_none());
        assert_eq!(session.detail(), Ok(None));
        assert!(session.visible_rows().is_empty());
        assert_eq!(session.filter_options(), FilterOptions::default());
    }
}
