// SpanMark - ui/theme.rs
//
// Label colour palette, highlight colours, and layout constants.
// No dependencies on app state or business logic.

use egui::Color32;

/// Highlight background for a label name.
///
/// The default clinical labels have fixed pastel hues; user-defined labels
/// are assigned a stable colour from the extra palette by name hash, so the
/// same label always gets the same colour within and across sessions.
pub fn label_colour(name: &str) -> Color32 {
    match name {
        "Diagnosis" => Color32::from_rgb(0xcf, 0xe8, 0xff),
        "Symptom" => Color32::from_rgb(0xd7, 0xf9, 0xe9),
        "Medication" => Color32::from_rgb(0xfd, 0xe7, 0xc8),
        "Procedure" => Color32::from_rgb(0xff, 0xe0, 0xe6),
        "Test" => Color32::from_rgb(0xea, 0xdc, 0xff),
        "Other" => Color32::from_rgb(0xf0, 0xf0, 0xf0),
        other => EXTRA_PALETTE[name_hash(other) % EXTRA_PALETTE.len()],
    }
}

/// Pastel fallback palette for user-defined labels.
const EXTRA_PALETTE: [Color32; 6] = [
    Color32::from_rgb(0xff, 0xf3, 0xc4), // pale yellow
    Color32::from_rgb(0xc8, 0xf4, 0xf9), // pale cyan
    Color32::from_rgb(0xe4, 0xf7, 0xc5), // pale green
    Color32::from_rgb(0xff, 0xd9, 0xc9), // pale coral
    Color32::from_rgb(0xdb, 0xe4, 0xff), // pale periwinkle
    Color32::from_rgb(0xf6, 0xd9, 0xf2), // pale orchid
];

fn name_hash(name: &str) -> usize {
    // FNV-1a, stable across runs (unlike DefaultHasher with random keys).
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in name.bytes() {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash as usize
}

/// Text colour drawn on top of pastel label highlights.
pub const HIGHLIGHT_TEXT: Color32 = Color32::from_rgb(31, 41, 55); // Gray 800

/// Background for the focused search match (amber, wins over label hues).
pub const SEARCH_MATCH_BG: Color32 = Color32::from_rgb(251, 191, 36); // Amber 400

/// Background for non-focused search matches.
pub const SEARCH_MATCH_DIM_BG: Color32 = Color32::from_rgb(253, 230, 138); // Amber 200

/// Layout constants.
pub const SIDEBAR_WIDTH: f32 = 260.0;
pub const ANNOTATE_PANEL_WIDTH: f32 = 300.0;
pub const ANNOTATIONS_PANE_HEIGHT: f32 = 180.0;
pub const ROW_HEIGHT: f32 = 20.0;

/// Apply the configured theme and base font size to the whole UI.
pub fn apply(ctx: &egui::Context, dark_mode: bool, font_size: f32) {
    if dark_mode {
        ctx.set_visuals(egui::Visuals::dark());
    } else {
        ctx.set_visuals(egui::Visuals::light());
    }
    ctx.style_mut(|style| {
        for (_, font_id) in style.text_styles.iter_mut() {
            font_id.size = font_size;
        }
    });
}
