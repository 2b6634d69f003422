// SpanMark - ui/panels/annotations.rs
//
// Bottom pane: the annotation ledger as a table, followed by the relation
// list. Shows either the selected document's records or the whole ledger,
// with per-row delete.

use crate::app::state::AppState;
use crate::core::model::span_text;
use crate::ui::theme;
use crate::util::constants;

/// Per-frame view options kept in egui memory rather than AppState, since
/// they are pure presentation.
const SHOW_ALL_ID: &str = "annotations_show_all";

/// Render the annotations pane (bottom).
pub fn render(ui: &mut egui::Ui, state: &mut AppState) {
    let mut show_all = ui
        .ctx()
        .data_mut(|d| *d.get_temp_mut_or(egui::Id::new(SHOW_ALL_ID), false));

    ui.horizontal(|ui| {
        ui.heading("Annotations");
        ui.label(format!("({} total)", state.ledger.len()));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.checkbox(&mut show_all, "all documents").changed() {
                ui.ctx()
                    .data_mut(|d| d.insert_temp(egui::Id::new(SHOW_ALL_ID), show_all));
            }
        });
    });
    ui.separator();

    let selected = state.selected_doc.clone();
    let rows: Vec<RowData> = state
        .ledger
        .annotations()
        .filter(|a| show_all || selected.as_deref() == Some(a.doc_id.as_str()))
        .map(|a| {
            let preview = state
                .store
                .get(&a.doc_id)
                .ok()
                .and_then(|doc| span_text(&doc.text, a.start, a.end))
                .map(truncate_preview)
                .unwrap_or_default();
            RowData {
                id: a.id,
                doc_id: a.doc_id.clone(),
                start: a.start,
                end: a.end,
                preview,
                labels: a.labels.iter().cloned().collect(),
            }
        })
        .collect();

    if rows.is_empty() {
        ui.label(if show_all {
            "No annotations yet."
        } else {
            "No annotations on this document yet."
        });
        relation_table(ui, state, show_all, &selected);
        return;
    }

    let mut delete: Option<u64> = None;
    egui::ScrollArea::vertical()
        .id_salt("annotation_table")
        .auto_shrink([false; 2])
        .show(ui, |ui| {
            egui::Grid::new("annotation_grid")
                .striped(true)
                .num_columns(6)
                .show(ui, |ui| {
                    ui.strong("id");
                    ui.strong("document");
                    ui.strong("span");
                    ui.strong("text");
                    ui.strong("labels");
                    ui.strong("");
                    ui.end_row();

                    for row in &rows {
                        ui.label(row.id.to_string());
                        ui.label(&row.doc_id);
                        ui.label(format!("[{}, {})", row.start, row.end));
                        ui.label(egui::RichText::new(&row.preview).monospace());
                        ui.horizontal(|ui| {
                            for label in &row.labels {
                                ui.label(
                                    egui::RichText::new(label)
                                        .background_color(theme::label_colour(label))
                                        .color(theme::HIGHLIGHT_TEXT),
                                );
                            }
                        });
                        if ui.small_button("\u{2715}").on_hover_text("Remove").clicked() {
                            delete = Some(row.id);
                        }
                        ui.end_row();
                    }
                });
        });

    if let Some(id) = delete {
        state.remove_annotation(id);
    }

    relation_table(ui, state, show_all, &selected);
}

fn relation_table(
    ui: &mut egui::Ui,
    state: &mut AppState,
    show_all: bool,
    selected: &Option<String>,
) {
    let rows: Vec<(u64, String, u64, u64, String)> = state
        .ledger
        .relations()
        .filter(|r| show_all || selected.as_deref() == Some(r.doc_id.as_str()))
        .map(|r| (r.id, r.doc_id.clone(), r.head, r.tail, r.label.clone()))
        .collect();
    if rows.is_empty() {
        return;
    }

    ui.separator();
    ui.horizontal(|ui| {
        ui.heading("Relations");
        ui.label(format!("({} total)", state.ledger.relations().count()));
    });

    let mut delete: Option<u64> = None;
    egui::ScrollArea::vertical()
        .id_salt("relation_table")
        .auto_shrink([false; 2])
        .max_height(120.0)
        .show(ui, |ui| {
            egui::Grid::new("relation_grid")
                .striped(true)
                .num_columns(5)
                .show(ui, |ui| {
                    ui.strong("id");
                    ui.strong("document");
                    ui.strong("link");
                    ui.strong("label");
                    ui.strong("");
                    ui.end_row();

                    for (id, doc_id, head, tail, label) in &rows {
                        ui.label(id.to_string());
                        ui.label(doc_id);
                        ui.label(format!("{head} \u{2192} {tail}"));
                        ui.label(
                            egui::RichText::new(label)
                                .background_color(theme::label_colour(label))
                                .color(theme::HIGHLIGHT_TEXT),
                        );
                        if ui.small_button("\u{2715}").on_hover_text("Remove").clicked() {
                            delete = Some(*id);
                        }
                        ui.end_row();
                    }
                });
        });

    if let Some(id) = delete {
        state.remove_relation(id);
    }
}

struct RowData {
    id: u64,
    doc_id: String,
    start: usize,
    end: usize,
    preview: String,
    labels: Vec<String>,
}

fn truncate_preview(s: &str) -> String {
    let mut chars = s.chars();
    let head: String = chars.by_ref().take(constants::SPAN_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}\u{2026}")
    } else {
        head
    }
}
