// SpanMark - app/mod.rs
//
// Application layer: state, folder ingestion, search, and workspace
// persistence. Sits between the core and the UI.

pub mod ingest;
pub mod search;
pub mod state;
pub mod workspace;
