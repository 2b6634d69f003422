// SpanMark - ui/panels/annotate.rs
//
// Right-hand annotation panel: span draft (character offsets + live
// preview), label picker, new-label entry, relation draft, and the search
// quick-add controls.

use crate::app::state::AppState;
use crate::core::model::span_text;
use crate::ui::theme;
use crate::util::constants;

/// Render the annotate panel (right side).
pub fn render(ui: &mut egui::Ui, state: &mut AppState) {
    ui.heading("Annotate");
    ui.separator();

    span_section(ui, state);
    ui.separator();
    label_section(ui, state);
    ui.separator();
    relation_section(ui, state);
    ui.separator();
    search_section(ui, state);
}

// -----------------------------------------------------------------------------
// Span draft
// -----------------------------------------------------------------------------

fn span_section(ui: &mut egui::Ui, state: &mut AppState) {
    ui.label("Span (character offsets)");
    ui.horizontal(|ui| {
        ui.label("start");
        ui.add(
            egui::TextEdit::singleline(&mut state.draft.start_input).desired_width(60.0),
        );
        ui.label("end");
        ui.add(egui::TextEdit::singleline(&mut state.draft.end_input).desired_width(60.0));
    });

    // Live preview of the drafted span so off-by-one offsets are visible
    // before the annotation is committed.
    let preview = state.selected_document().and_then(|doc| {
        let start = state.draft.start_input.trim().parse::<usize>().ok()?;
        let end = state.draft.end_input.trim().parse::<usize>().ok()?;
        span_text(&doc.text, start, end).map(|s| truncate_preview(s))
    });
    match preview {
        Some(text) => {
            ui.label(
                egui::RichText::new(format!("\u{201c}{text}\u{201d}"))
                    .monospace()
                    .background_color(theme::SEARCH_MATCH_DIM_BG)
                    .color(theme::HIGHLIGHT_TEXT),
            );
        }
        None => {
            ui.label(egui::RichText::new("no valid span").weak().italics());
        }
    }

    let can_add = state.selected_doc.is_some() && !state.draft.selected_labels.is_empty();
    ui.add_enabled_ui(can_add, |ui| {
        if ui.button("Add annotation").clicked() {
            state.add_annotation_from_draft();
        }
    });
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

// -----------------------------------------------------------------------------
// Labels
// -----------------------------------------------------------------------------

fn label_section(ui: &mut egui::Ui, state: &mut AppState) {
    ui.label("Labels");

    // Checkbox list in frequency-first order with colour swatches.
    let names = state.ledger.label_names();
    egui::ScrollArea::vertical()
        .id_salt("label_picker")
        .max_height(160.0)
        .show(ui, |ui| {
            for name in names {
                let mut ticked = state.draft.selected_labels.contains(&name);
                ui.horizontal(|ui| {
                    let (rect, _) = ui.allocate_exact_size(
                        egui::vec2(10.0, 10.0),
                        egui::Sense::hover(),
                    );
                    ui.painter()
                        .rect_filled(rect, 2.0, theme::label_colour(&name));
                    if ui.checkbox(&mut ticked, &name).changed() {
                        if ticked {
                            state.draft.selected_labels.insert(name.clone());
                        } else {
                            state.draft.selected_labels.remove(&name);
                        }
                    }
                });
            }
        });

    ui.horizontal(|ui| {
        let field = ui.add(
            egui::TextEdit::singleline(&mut state.draft.new_label_input)
                .hint_text("new label")
                .desired_width(140.0),
        );
        let submitted =
            field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if (ui.button("Add label").clicked() || submitted)
            && !state.draft.new_label_input.trim().is_empty()
        {
            state.add_label_from_draft();
        }
    });
}

// -----------------------------------------------------------------------------
// Relations
// -----------------------------------------------------------------------------

fn relation_section(ui: &mut egui::Ui, state: &mut AppState) {
    ui.label("Relation (annotation ids)");
    ui.horizontal(|ui| {
        ui.label("head");
        ui.add(
            egui::TextEdit::singleline(&mut state.relation_draft.head_input)
                .desired_width(50.0),
        );
        ui.label("tail");
        ui.add(
            egui::TextEdit::singleline(&mut state.relation_draft.tail_input)
                .desired_width(50.0),
        );
    });
    ui.add(
        egui::TextEdit::singleline(&mut state.relation_draft.label_input)
            .hint_text(constants::DEFAULT_RELATION_LABEL)
            .desired_width(140.0),
    );

    // Needs at least two spans before a link can exist.
    let can_link = state.ledger.len() >= 2;
    ui.add_enabled_ui(can_link, |ui| {
        if ui.button("Add relation").clicked() {
            state.add_relation_from_draft();
        }
    });
    if !can_link {
        ui.label(
            egui::RichText::new("add two annotations to link them")
                .weak()
                .small(),
        );
    }
}

// -----------------------------------------------------------------------------
// Search
// -----------------------------------------------------------------------------

fn search_section(ui: &mut egui::Ui, state: &mut AppState) {
    ui.label("Search");
    ui.horizontal(|ui| {
        let field = ui.add(
            egui::TextEdit::singleline(&mut state.search.query)
                .hint_text("find in all documents")
                .desired_width(160.0),
        );
        let submitted =
            field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.button("Search").clicked() || submitted {
            state.run_search();
        }
    });

    let n = state.search.results.matches.len();
    if n == 0 {
        ui.label(egui::RichText::new("no matches").weak());
        return;
    }

    ui.horizontal(|ui| {
        if ui.button("\u{25c0}").clicked() {
            state.step_match(-1);
        }
        let current = state.search.current.map(|i| i + 1).unwrap_or(0);
        let capped = if state.search.results.truncated { "+" } else { "" };
        ui.label(format!("{current} / {n}{capped}"));
        if ui.button("\u{25b6}").clicked() {
            state.step_match(1);
        }
    });

    let has_labels = !state.draft.selected_labels.is_empty();
    ui.add_enabled_ui(has_labels, |ui| {
        if ui.button("Annotate match").clicked() {
            state.annotate_current_match();
        }
        if ui
            .button(format!("Annotate all {n} matches"))
            .clicked()
        {
            state.annotate_all_matches();
        }
    });
    if !has_labels {
        ui.label(
            egui::RichText::new("tick at least one label to annotate")
                .weak()
                .small(),
        );
    }
}
