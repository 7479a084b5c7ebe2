//! Sales stage to engagement level mapping.

/// Highest engagement level
pub const MAX_ENGAGEMENT_LEVEL: u8 = 4;

/// Axis labels of the engagement levels, indexed by level
pub const ENGAGEMENT_LABELS: [&str; 5] = [
    "Untouched",
    "Freemium",
    "DA-Direct",
    "Orders 360 Lite",
    "Orders 360 Full",
];

/// Ordered substring tests; the first match decides the level.
const STAGE_MARKERS: [(&[&str], u8); 5] = [
    (&["untouch"], 0),
    (&["free"], 1),
    (&["direct", "da-d"], 2),
    (&["lite"], 3),
    (&["full"], 4),
];

/// Maps a sales stage to an engagement level in `0..=4`.
///
/// The stage is trimmed and lowercased, then tested against the markers in
/// order, so `"free untouched"` is level 0. Unknown stages are level 0.
pub fn engagement_level(stage: &str) -> u8 {
    let stage = stage.trim().to_lowercase();
    STAGE_MARKERS
        .iter()
        .find(|(markers, _)| markers.iter().any(|marker| stage.contains(marker)))
        .map(|(_, level)| *level)
        .unwrap_or(0)
}

/// Axis label of an engagement level
pub fn engagement_label(level: u8) -> &'static str {
    ENGAGEMENT_LABELS
        .get(level as usize)
        .copied()
        .unwrap_or(ENGAGEMENT_LABELS[0])
}
