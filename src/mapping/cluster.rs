//! Urban cluster chords and highlight colours

use super::chord::chord_of;

const CLUSTER_CHORDS: [[&str; 3]; 7] = [
    ["C4", "E4", "G4"],
    ["D4", "F4", "A4"],
    ["E4", "G4", "B4"],
    ["F4", "A4", "C5"],
    ["G4", "B4", "D5"],
    ["A4", "C5", "E5"],
    ["B4", "D5", "F5"],
];

const CLUSTER_COLORS: [&str; 6] = [
    "#1f77b4", "#9cba7f", "#e2c572", "#f28e2c", "#b276c8", "#d62728",
];

/// Highlight colour for a cluster without its own entry
pub const FALLBACK_CLUSTER_COLOR: &str = "#808080";

fn cluster_index(id: &str) -> Option<usize> {
    id.trim().parse::<usize>().ok()
}

/// Triad for cluster `id`; unknown ids use cluster `"0"`
pub fn cluster_chord(id: &str) -> Vec<String> {
    let chord = cluster_index(id)
        .and_then(|i| CLUSTER_CHORDS.get(i))
        .unwrap_or(&CLUSTER_CHORDS[0]);
    chord_of(chord)
}

/// Block highlight fill used in identify-clusters mode
pub fn cluster_color(id: &str) -> &'static str {
    cluster_index(id)
        .and_then(|i| CLUSTER_COLORS.get(i))
        .copied()
        .unwrap_or(FALLBACK_CLUSTER_COLOR)
}
