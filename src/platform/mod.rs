// SpanMark - platform/mod.rs
//
// Platform layer: OS path resolution, config.toml loading, and external
// process integration (pdftotext).

pub mod config;
pub mod pdf;
