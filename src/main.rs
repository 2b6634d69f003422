// SpanMark - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Config loading and logging initialisation (debug mode support)
// 3. eframe GUI launch

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod gui;

// Re-export modules from the library crate so that `gui.rs` and other
// binary-side code can still use `crate::app::...`, `crate::core::...` etc.
pub use spanmark::app;
pub use spanmark::core;
pub use spanmark::platform;
pub use spanmark::ui;
pub use spanmark::util;

use clap::Parser;
use std::path::PathBuf;

/// SpanMark - Span annotation for medical text.
///
/// Load clinical notes from text, CSV, or PDF sources, mark labelled spans,
/// and export the annotation ledger as JSON or CSV.
#[derive(Parser, Debug)]
#[command(name = "SpanMark", version, about)]
struct Cli {
    /// Folder of documents to ingest at startup.
    path: Option<PathBuf>,

    /// Override the configuration directory (default: platform config dir).
    #[arg(short = 'c', long = "config-dir")]
    config_dir: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    // Resolve platform paths and load config before logging init so the
    // configured level can take effect; config problems are re-surfaced as
    // warnings in the UI below.
    let platform_paths = platform::config::PlatformPaths::resolve();
    let config_dir = cli
        .config_dir
        .as_deref()
        .unwrap_or(&platform_paths.config_dir);
    let (config, config_warnings) = platform::config::load_config(config_dir);

    util::logging::init(cli.debug, config.log_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "SpanMark starting"
    );
    for w in &config_warnings {
        tracing::warn!("{}", w);
    }

    // Create application state
    let mut state = app::state::AppState::new(config, cli.debug);
    for w in config_warnings {
        state.push_warning(w);
    }

    // If a folder was provided on the CLI, ingest it before the first frame.
    if let Some(ref path) = cli.path {
        state.ingest_folder(path);
    }

    // Launch the GUI
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!(
                "{} v{}",
                util::constants::APP_NAME,
                util::constants::APP_VERSION
            ))
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([900.0, 560.0]),
        ..Default::default()
    };

    let result = eframe::run_native(
        util::constants::APP_NAME,
        native_options,
        Box::new(move |cc| Ok(Box::new(gui::SpanMarkApp::new(cc, state)))),
    );

    if let Err(e) = result {
        tracing::error!(error = %e, "Failed to launch GUI");
        eprintln!("Error: Failed to launch SpanMark GUI: {e}");
        std::process::exit(1);
    }
}
