// SpanMark - gui.rs
//
// Top-level eframe::App implementation.
// Wires together all UI panels and the file dialogs.

use crate::app::state::AppState;
use crate::ui;

/// The SpanMark application.
pub struct SpanMarkApp {
    pub state: AppState,
}

impl SpanMarkApp {
    /// Create a new application instance with the given state.
    pub fn new(cc: &eframe::CreationContext<'_>, state: AppState) -> Self {
        ui::theme::apply(&cc.egui_ctx, state.config.dark_mode, state.config.font_size);
        Self { state }
    }
}

impl eframe::App for SpanMarkApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Folder\u{2026}").clicked() {
                        if let Some(path) = rfd::FileDialog::new().pick_folder() {
                            self.state.ingest_folder(&path);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Add File(s)\u{2026}").clicked() {
                        if let Some(files) = rfd::FileDialog::new()
                            .add_filter("Documents", &["txt", "csv", "pdf", "zip"])
                            .pick_files()
                        {
                            self.state.ingest_files(&files);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Paste Text\u{2026}").clicked() {
                        self.state.show_paste_dialog = true;
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Save Workspace\u{2026}").clicked() {
                        if let Some(dest) = rfd::FileDialog::new()
                            .add_filter("Workspace", &["json"])
                            .set_file_name(crate::util::constants::WORKSPACE_FILE_NAME)
                            .save_file()
                        {
                            self.state.save_workspace(&dest);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Load Workspace\u{2026}").clicked() {
                        if let Some(src) = rfd::FileDialog::new()
                            .add_filter("Workspace", &["json"])
                            .pick_file()
                        {
                            self.state.load_workspace(&src);
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.menu_button("Annotations", |ui| {
                    let has_annotations = !self.state.ledger.is_empty();
                    ui.add_enabled_ui(has_annotations, |ui| {
                        if ui.button("Export JSON\u{2026}").clicked() {
                            if let Some(dest) = rfd::FileDialog::new()
                                .add_filter("JSON", &["json"])
                                .set_file_name("annotations.json")
                                .save_file()
                            {
                                self.state.export_annotations(&dest);
                            }
                            ui.close_menu();
                        }
                        if ui.button("Export CSV\u{2026}").clicked() {
                            if let Some(dest) = rfd::FileDialog::new()
                                .add_filter("CSV", &["csv"])
                                .set_file_name("annotations.csv")
                                .save_file()
                            {
                                self.state.export_annotations(&dest);
                            }
                            ui.close_menu();
                        }
                    });
                    let has_documents = !self.state.store.is_empty();
                    ui.add_enabled_ui(has_documents, |ui| {
                        if ui.button("Import\u{2026}").clicked() {
                            if let Some(src) = rfd::FileDialog::new()
                                .add_filter("Annotations", &["json", "csv"])
                                .pick_file()
                            {
                                self.state.import_annotations(&src);
                            }
                            ui.close_menu();
                        }
                    });
                });
                ui.menu_button("View", |ui| {
                    let has_warnings = !self.state.warnings.is_empty();
                    ui.add_enabled_ui(has_warnings, |ui| {
                        let label = format!("Warnings ({})", self.state.warnings.len());
                        if ui.button(label).clicked() {
                            self.state.show_warnings = true;
                            ui.close_menu();
                        }
                    });
                    if ui.button("About").clicked() {
                        ui::panels::dialogs::open_about(ctx);
                        ui.close_menu();
                    }
                });
            });
        });

        // Status bar
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.state.status_message);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let docs = self.state.store.len();
                    let anns = self.state.ledger.len();
                    if docs > 0 {
                        ui.label(format!("{docs} doc(s) \u{2022} {anns} annotation(s)"));
                    }
                    if !self.state.warnings.is_empty() {
                        let badge = format!("\u{26a0} {}", self.state.warnings.len());
                        if ui.small_button(badge).clicked() {
                            self.state.show_warnings = true;
                        }
                    }
                });
            });
        });

        // Annotations pane (bottom)
        egui::TopBottomPanel::bottom("annotations_pane")
            .resizable(true)
            .default_height(ui::theme::ANNOTATIONS_PANE_HEIGHT)
            .show(ctx, |ui| {
                ui::panels::annotations::render(ui, &mut self.state);
            });

        // Left sidebar: documents on top, label registry below.
        egui::SidePanel::left("sidebar")
            .default_width(ui::theme::SIDEBAR_WIDTH)
            .resizable(true)
            .show(ctx, |ui| {
                let available = ui.available_height();
                egui::ScrollArea::vertical()
                    .id_salt("sidebar_documents")
                    .max_height(available * 0.6)
                    .show(ui, |ui| {
                        ui::panels::documents::render(ui, &mut self.state);
                    });

                ui.separator();

                egui::ScrollArea::vertical()
                    .id_salt("sidebar_labels")
                    .auto_shrink([false; 2])
                    .show(ui, |ui| {
                        ui::panels::labels::render(ui, &self.state);
                    });
            });

        // Right panel: annotation draft and search.
        egui::SidePanel::right("annotate_panel")
            .default_width(ui::theme::ANNOTATE_PANEL_WIDTH)
            .resizable(true)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("annotate_scroll")
                    .auto_shrink([false; 2])
                    .show(ui, |ui| {
                        ui::panels::annotate::render(ui, &mut self.state);
                    });
            });

        // Central panel (document viewer)
        egui::CentralPanel::default().show(ctx, |ui| {
            ui::panels::viewer::render(ui, &self.state);
        });

        // Floating dialogs
        ui::panels::dialogs::paste(ctx, &mut self.state);
        ui::panels::dialogs::summary(ctx, &mut self.state);
        ui::panels::dialogs::warnings(ctx, &mut self.state);
        ui::panels::dialogs::about(ctx);
    }
}
