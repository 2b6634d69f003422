// SpanMark - ui/panels/labels.rs
//
// Sidebar label registry: every known label with its colour swatch and
// usage count, in the same frequency-first order the picker uses.

use crate::app::state::AppState;
use crate::ui::theme;

/// Render the label registry (sidebar, below the document list).
pub fn render(ui: &mut egui::Ui, state: &AppState) {
    ui.heading("Labels");
    ui.separator();

    for entry in state.ledger.labels() {
        ui.horizontal(|ui| {
            let (rect, _) =
                ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
            ui.painter()
                .rect_filled(rect, 2.0, theme::label_colour(&entry.name));
            ui.label(&entry.name);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(
                    egui::RichText::new(format!("{}", entry.uses))
                        .weak()
                        .monospace(),
                );
            });
        });
    }
}
