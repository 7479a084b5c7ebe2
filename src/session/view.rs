//! Chart-ready projections of the visible records.

use crate::matrix::engagement::ENGAGEMENT_LABELS;
use crate::matrix::engagement::MAX_ENGAGEMENT_LEVEL;
use crate::matrix::Quadrant;
use crate::matrix::Snapshot;
use crate::matrix::YES;
use serde::Serialize;

/// Top edge of the quadrant zones on the engagement axis
pub const ZONE_TOP: f64 = 4.5;

/// Fill opacity of the quadrant zones
pub const ZONE_OPACITY: f64 = 0.08;

/// Padding around the value axis
const VALUE_AXIS_PADDING: f64 = 0.5;

/// Fixed range of the engagement axis
const ENGAGEMENT_AXIS_RANGE: [f64; 2] = [-0.2, 4.7];

/// One chart axis
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Axis {
    pub title: &'static str,
    pub range: [f64; 2],
    /// Labelled tick positions; empty for automatic ticks
    pub ticks: Vec<Tick>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Tick {
    pub value: f64,
    pub label: &'static str,
}

/// One record in the scatter plot
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Point {
    /// Row index in the snapshot
    pub row: usize,
    pub label: String,
    pub group: Option<String>,
    /// Value score
    pub x: usize,
    /// Engagement level
    pub y: u8,
    pub size: f64,
    pub quadrant: Quadrant,
    pub color: &'static str,
    /// Multi-line hover text
    pub hover: String,
}

/// Points of one group; unnamed when the table has no group column
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PointSeries {
    pub name: Option<String>,
    pub points: Vec<Point>,
}

/// Background rectangle of a quadrant with its label anchor
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Zone {
    pub quadrant: Quadrant,
    pub color: &'static str,
    pub opacity: f64,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub label_x: f64,
    pub label_y: f64,
}

/// Dashed threshold line between zones
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Line {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

/// Value/engagement scatter plot
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuadrantView {
    pub series: Vec<PointSeries>,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub zones: Vec<Zone>,
    pub threshold_lines: Vec<Line>,
    /// Shown when more than one group is visible
    pub show_legend: bool,
    pub max_score: usize,
}

/// One record column of the heatmap
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HeatmapRecord {
    pub row: usize,
    pub label: String,
    pub value_score: usize,
}

/// One feature row of the heatmap
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HeatmapFeature {
    pub key: String,
    pub label: String,
}

/// Feature adoption matrix
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HeatmapView {
    /// Visible records by descending value score
    pub records: Vec<HeatmapRecord>,
    pub features: Vec<HeatmapFeature>,
    /// `adoption[feature][record]`
    pub adoption: Vec<Vec<bool>>,
}

/// Rendered projection of the current view mode
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    Quadrant(QuadrantView),
    Heatmap(HeatmapView),
}

/// Label of a record: its agency, or its 1-based row number without an agency column
pub(crate) fn record_label(snapshot: &Snapshot, row: usize) -> String {
    snapshot
        .agency_of(row)
        .unwrap_or_else(|| format!("Record {}", row + 1))
}

/// Builds the scatter plot of the visible rows
pub fn quadrant_view(snapshot: &Snapshot, visible: &[usize], show_zones: bool) -> QuadrantView {
    let mut series = Vec::<PointSeries>::new();
    for row in visible {
        let record = &snapshot.records[*row];
        let label = record_label(snapshot, *row);
        let group = snapshot.group_of(*row);
        let mut hover = label.to_owned();
        if let Some(group) = &group {
            hover.push_str(&format!("\nGroup: {group}"));
        }
        hover.push_str(&format!(
            "\nValue Score: {}/{}\nQuadrant: {}",
            record.value_score, snapshot.max_score, record.quadrant
        ));

        let point = Point {
            row: *row,
            label,
            group: group.to_owned(),
            x: record.value_score,
            y: record.engagement_level,
            size: record.size,
            quadrant: record.quadrant,
            color: record.quadrant.color(),
            hover,
        };
        match series.iter_mut().find(|series| series.name == group) {
            Some(series) => series.points.push(point),
            None => series.push(PointSeries {
                name: group,
                points: vec![point],
            }),
        }
    }

    let max_score = snapshot.max_score as f64;
    let (zones, threshold_lines) = if show_zones && snapshot.max_score > 0 {
        (
            zones(snapshot.value_threshold, snapshot.engagement_threshold, max_score),
            threshold_lines(snapshot.value_threshold, snapshot.engagement_threshold, max_score),
        )
    } else {
        (Vec::new(), Vec::new())
    };

    QuadrantView {
        show_legend: snapshot.roles.group.is_some() && series.len() > 1,
        series,
        x_axis: Axis {
            title: "Value Adoption Score",
            range: [-VALUE_AXIS_PADDING, max_score + VALUE_AXIS_PADDING],
            ticks: Vec::new(),
        },
        y_axis: Axis {
            title: "Engagement Level",
            range: ENGAGEMENT_AXIS_RANGE,
            ticks: (0..=MAX_ENGAGEMENT_LEVEL)
                .map(|level| Tick {
                    value: level as f64,
                    label: ENGAGEMENT_LABELS[level as usize],
                })
                .collect(),
        },
        zones,
        threshold_lines,
        max_score: snapshot.max_score,
    }
}

/// The four quadrant rectangles, labels centred in each
fn zones(value_threshold: f64, engagement_threshold: f64, max_score: f64) -> Vec<Zone> {
    Quadrant::ZONES
        .iter()
        .map(|quadrant| {
            let (x0, x1) = match quadrant {
                Quadrant::StrategicPartners | Quadrant::HighValueProspects => (value_threshold, max_score),
                _ => (0.0, value_threshold),
            };
            let (y0, y1) = match quadrant {
                Quadrant::StrategicPartners | Quadrant::GrowthOpportunities => (engagement_threshold, ZONE_TOP),
                _ => (0.0, engagement_threshold),
            };
            Zone {
                quadrant: *quadrant,
                color: quadrant.color(),
                opacity: ZONE_OPACITY,
                x0,
                y0,
                x1,
                y1,
                label_x: x0 + (x1 - x0) / 2.0,
                label_y: y0 + (y1 - y0) / 2.0,
            }
        })
        .collect()
}

fn threshold_lines(value_threshold: f64, engagement_threshold: f64, max_score: f64) -> Vec<Line> {
    vec![
        Line { x0: value_threshold, y0: 0.0, x1: value_threshold, y1: ZONE_TOP },
        Line { x0: 0.0, y0: engagement_threshold, x1: max_score, y1: engagement_threshold },
    ]
}

/// Builds the adoption matrix of the visible rows, highest score first
pub fn heatmap_view(snapshot: &Snapshot, visible: &[usize]) -> HeatmapView {
    let mut rows = visible.to_vec();
    rows.sort_by(|a, b| snapshot.records[*b].value_score.cmp(&snapshot.records[*a].value_score));

    let records = rows
        .iter()
        .map(|row| HeatmapRecord {
            row: *row,
            label: record_label(snapshot, *row),
            value_score: snapshot.records[*row].value_score,
        })
        .collect();
    let features = snapshot.boolean_columns
        .iter()
        .map(|key| HeatmapFeature {
            key: key.to_owned(),
            label: snapshot.display_name(key),
        })
        .collect();
    let adoption = snapshot.boolean_columns
        .iter()
        .map(|key| rows.iter().map(|row| snapshot.text(*row, key) == YES).collect())
        .collect();

    HeatmapView {
        records,
        features,
        adoption,
    }
}
