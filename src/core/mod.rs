// SpanMark - core/mod.rs
//
// Core layer: data model, document store, annotation ledger, ingestion,
// and serialisation. No UI, no dialogs, no platform paths.

pub mod export;
pub mod ingest;
pub mod ledger;
pub mod model;
pub mod store;
