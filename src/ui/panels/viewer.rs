// SpanMark - ui/panels/viewer.rs
//
// Central document viewer. Renders the selected document's text with
// annotation spans highlighted in their label colours and search matches
// overlaid in amber (the focused match brighter than the rest).
//
// Highlighting is done with a single LayoutJob: the text is cut at every
// span boundary and each resulting segment gets the style of the topmost
// thing covering it (focused match > other matches > annotations). Spans
// arrive as character offsets and are converted to byte ranges here, once,
// at render time.

use crate::app::state::AppState;
use crate::core::model::byte_range;
use crate::ui::theme;
use egui::text::{LayoutJob, TextFormat};
use egui::Color32;
use std::ops::Range;

/// One highlight interval in byte offsets, in priority order: higher kind
/// wins where intervals overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Highlight {
    range: Range<usize>,
    kind: HighlightKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum HighlightKind {
    Annotation(Color32AsOrd),
    Match,
    FocusedMatch,
}

/// Color32 wrapper so HighlightKind can derive Ord (egui's Color32 cannot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Color32AsOrd([u8; 4]);

impl From<Color32> for Color32AsOrd {
    fn from(c: Color32) -> Self {
        Self(c.to_array())
    }
}

impl Color32AsOrd {
    fn colour(self) -> Color32 {
        let [r, g, b, a] = self.0;
        Color32::from_rgba_premultiplied(r, g, b, a)
    }
}

/// Render the viewer panel (central area).
pub fn render(ui: &mut egui::Ui, state: &AppState) {
    let Some(doc) = state.selected_document() else {
        ui.centered_and_justified(|ui| {
            if state.store.is_empty() {
                ui.label(
                    "No documents loaded.\nOpen a folder via File \u{2192} Open Folder\u{2026}, \
                     add files, or paste text.",
                );
            } else {
                ui.label("Select a document from the list to view it.");
            }
        });
        return;
    };

    ui.horizontal(|ui| {
        ui.heading(&doc.id);
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(format!(
                "{} characters \u{2022} {} annotation(s)",
                doc.char_len(),
                state.ledger.annotations_for(&doc.id).count()
            ));
        });
    });
    ui.separator();

    let highlights = collect_highlights(state, &doc.id, &doc.text);
    let body_colour = ui.style().visuals.text_color();
    let font = egui::TextStyle::Monospace.resolve(ui.style());
    let job = build_layout(&doc.text, &highlights, body_colour, font);

    egui::ScrollArea::vertical()
        .id_salt("viewer_text")
        .auto_shrink([false; 2])
        .show(ui, |ui| {
            ui.add(egui::Label::new(job).wrap());
        });
}

/// Gather the byte-range highlights for one document.
fn collect_highlights(state: &AppState, doc_id: &str, text: &str) -> Vec<Highlight> {
    let mut highlights = Vec::new();

    for ann in state.ledger.annotations_for(doc_id) {
        if let Some(range) = byte_range(text, ann.start, ann.end) {
            // The first label in set order decides the hue for multi-label
            // spans; the annotations pane lists the full set.
            let colour = ann
                .labels
                .iter()
                .next()
                .map(|l| theme::label_colour(l))
                .unwrap_or(Color32::GRAY);
            highlights.push(Highlight {
                range,
                kind: HighlightKind::Annotation(colour.into()),
            });
        }
    }

    let focused = state.search.current;
    for (idx, m) in state.search.results.matches.iter().enumerate() {
        if m.doc_id != doc_id {
            continue;
        }
        if let Some(range) = byte_range(text, m.start, m.end) {
            let kind = if focused == Some(idx) {
                HighlightKind::FocusedMatch
            } else {
                HighlightKind::Match
            };
            highlights.push(Highlight { range, kind });
        }
    }

    highlights
}

/// Cut `text` at every highlight boundary and style each segment by the
/// topmost covering highlight.
fn build_layout(
    text: &str,
    highlights: &[Highlight],
    body_colour: Color32,
    font: egui::FontId,
) -> LayoutJob {
    let mut bounds: Vec<usize> = vec![0, text.len()];
    for h in highlights {
        bounds.push(h.range.start);
        bounds.push(h.range.end);
    }
    bounds.sort_unstable();
    bounds.dedup();

    let mut job = LayoutJob::default();
    for pair in bounds.windows(2) {
        let (seg_start, seg_end) = (pair[0], pair[1]);
        if seg_start == seg_end {
            continue;
        }
        let top = highlights
            .iter()
            .filter(|h| h.range.start <= seg_start && h.range.end >= seg_end)
            .map(|h| h.kind)
            .max();

        let format = match top {
            Some(HighlightKind::FocusedMatch) => TextFormat {
                font_id: font.clone(),
                color: theme::HIGHLIGHT_TEXT,
                background: theme::SEARCH_MATCH_BG,
                ..Default::default()
            },
            Some(HighlightKind::Match) => TextFormat {
                font_id: font.clone(),
                color: theme::HIGHLIGHT_TEXT,
                background: theme::SEARCH_MATCH_DIM_BG,
                ..Default::default()
            },
            Some(HighlightKind::Annotation(colour)) => TextFormat {
                font_id: font.clone(),
                color: theme::HIGHLIGHT_TEXT,
                background: colour.colour(),
                ..Default::default()
            },
            None => TextFormat {
                font_id: font.clone(),
                color: body_colour,
                ..Default::default()
            },
        };
        job.append(&text[seg_start..seg_end], 0.0, format);
    }
    job
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn segment_texts(job: &LayoutJob) -> Vec<String> {
        job.sections
            .iter()
            .map(|s| job.text[s.byte_range.clone()].to_string())
            .collect()
    }

    #[test]
    fn test_layout_cuts_at_span_boundaries() {
        let text = "Patient has diabetes.";
        let highlights = vec![Highlight {
            range: 12..20,
            kind: HighlightKind::Annotation(Color32::LIGHT_BLUE.into()),
        }];
        let job = build_layout(
            text,
            &highlights,
            Color32::WHITE,
            egui::FontId::monospace(12.0),
        );
        assert_eq!(
            segment_texts(&job),
            vec!["Patient has ", "diabetes", "."]
        );
        assert_eq!(job.text, text);
    }

    #[test]
    fn test_focused_match_wins_over_annotation() {
        let text = "aspirin";
        let highlights = vec![
            Highlight {
                range: 0..7,
                kind: HighlightKind::Annotation(Color32::LIGHT_BLUE.into()),
            },
            Highlight {
                range: 0..7,
                kind: HighlightKind::FocusedMatch,
            },
        ];
        let job = build_layout(
            text,
            &highlights,
            Color32::WHITE,
            egui::FontId::monospace(12.0),
        );
        assert_eq!(job.sections.len(), 1);
        assert_eq!(
            job.sections[0].format.background,
            theme::SEARCH_MATCH_BG
        );
    }

    #[test]
    fn test_overlapping_annotations_still_cover_all_text() {
        let text = "abcdefgh";
        let highlights = vec![
            Highlight {
                range: 0..5,
                kind: HighlightKind::Annotation(Color32::LIGHT_BLUE.into()),
            },
            Highlight {
                range: 3..8,
                kind: HighlightKind::Annotation(Color32::LIGHT_GREEN.into()),
            },
        ];
        let job = build_layout(
            text,
            &highlights,
            Color32::WHITE,
            egui::FontId::monospace(12.0),
        );
        let joined: String = segment_texts(&job).concat();
        assert_eq!(joined, text, "no text may be lost at overlap boundaries");
    }
}
