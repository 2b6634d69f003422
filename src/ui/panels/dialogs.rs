// SpanMark - ui/panels/dialogs.rs
//
// Floating windows: paste-text entry, ingest summary, warnings, and About.

use crate::app::state::AppState;
use crate::util::constants;

/// Render the paste-text dialog.
pub fn paste(ctx: &egui::Context, state: &mut AppState) {
    if !state.show_paste_dialog {
        return;
    }
    let mut open = true;
    let mut submit = false;
    egui::Window::new("Paste text")
        .open(&mut open)
        .resizable(true)
        .default_width(420.0)
        .show(ctx, |ui| {
            ui.label("One document per blank-line separated block.");
            egui::ScrollArea::vertical().max_height(240.0).show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut state.paste_input)
                        .desired_rows(10)
                        .desired_width(f32::INFINITY),
                );
            });
            ui.horizontal(|ui| {
                if ui.button("Add documents").clicked() {
                    submit = true;
                }
                if ui.button("Clear").clicked() {
                    state.paste_input.clear();
                }
            });
        });
    if submit {
        state.ingest_pasted();
    }
    if !open {
        state.show_paste_dialog = false;
    }
}

/// Render the ingest summary dialog.
pub fn summary(ctx: &egui::Context, state: &mut AppState) {
    let Some(summary) = state.last_summary.clone() else {
        return;
    };
    let mut open = true;
    egui::Window::new("Ingest summary")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            egui::Grid::new("ingest_summary_grid").show(ui, |ui| {
                ui.label("Files seen:");
                ui.label(summary.files_seen.to_string());
                ui.end_row();
                ui.label("Files loaded:");
                ui.label(summary.files_loaded.to_string());
                ui.end_row();
                ui.label("Files skipped:");
                ui.label(summary.files_skipped.to_string());
                ui.end_row();
                ui.label("Documents added:");
                ui.label(summary.documents_added.to_string());
                ui.end_row();
            });
            if !state.warnings.is_empty() {
                ui.separator();
                if ui
                    .button(format!("View {} warning(s)", state.warnings.len()))
                    .clicked()
                {
                    state.show_warnings = true;
                }
            }
        });
    if !open {
        state.last_summary = None;
    }
}

/// Render the warnings dialog.
pub fn warnings(ctx: &egui::Context, state: &mut AppState) {
    if !state.show_warnings {
        return;
    }
    let mut open = true;
    egui::Window::new("Warnings")
        .open(&mut open)
        .resizable(true)
        .default_width(480.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().max_height(300.0).show(ui, |ui| {
                for w in &state.warnings {
                    ui.label(w);
                    ui.separator();
                }
            });
            if ui.button("Clear warnings").clicked() {
                state.warnings.clear();
            }
        });
    if !open {
        state.show_warnings = false;
    }
}

/// Per-frame flag for the About window, kept in egui memory.
const ABOUT_ID: &str = "show_about";

/// Request the About window to open.
pub fn open_about(ctx: &egui::Context) {
    ctx.data_mut(|d| d.insert_temp(egui::Id::new(ABOUT_ID), true));
}

/// Render the About window.
pub fn about(ctx: &egui::Context) {
    let mut open = ctx.data_mut(|d| *d.get_temp_mut_or(egui::Id::new(ABOUT_ID), false));
    if !open {
        return;
    }
    egui::Window::new("About")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.heading(constants::APP_NAME);
            ui.label(format!("Version {}", constants::APP_VERSION));
            ui.add_space(6.0);
            ui.label("Span annotation for medical text.");
            ui.label("Load .txt, .csv, or .pdf sources, mark labelled spans,");
            ui.label("and export the ledger as JSON or CSV.");
        });
    ctx.data_mut(|d| d.insert_temp(egui::Id::new(ABOUT_ID), open));
}
