// SpanMark - ui/panels/documents.rs
//
// Sidebar document list: one row per loaded document with its annotation
// count; clicking a row opens it in the viewer.

use crate::app::state::AppState;
use crate::ui::theme;

/// Render the document list (sidebar).
pub fn render(ui: &mut egui::Ui, state: &mut AppState) {
    ui.heading("Documents");
    ui.separator();

    if state.store.is_empty() {
        ui.label("No documents loaded.\nUse File \u{2192} Open Folder\u{2026} to begin.");
        return;
    }

    let total = state.store.len();
    ui.label(format!("{total} document(s)"));
    ui.add_space(4.0);

    // Clicks are collected and applied after the loop so the row iteration
    // does not hold an immutable borrow of `state` while selecting.
    let mut clicked: Option<String> = None;

    egui::ScrollArea::vertical()
        .id_salt("document_list")
        .auto_shrink([false; 2])
        .show(ui, |ui| {
            for doc in state.store.documents() {
                let count = state.ledger.annotations_for(&doc.id).count();
                let is_selected = state.selected_doc.as_deref() == Some(doc.id.as_str());
                let label = if count > 0 {
                    format!("{}  ({count})", doc.id)
                } else {
                    doc.id.clone()
                };
                let response = ui
                    .add_sized(
                        [ui.available_width(), theme::ROW_HEIGHT],
                        egui::SelectableLabel::new(is_selected, label),
                    )
                    .on_hover_text(format!("{} characters", doc.char_len()));
                if response.clicked() {
                    clicked = Some(doc.id.clone());
                }
            }
        });

    if let Some(id) = clicked {
        state.select_document(&id);
    }

    ui.separator();
    let has_selection = state.selected_doc.is_some();
    ui.add_enabled_ui(has_selection, |ui| {
        if ui.button("Remove selected document").clicked() {
            state.remove_selected_document();
        }
    });
}
