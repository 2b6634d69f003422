// SpanMark - ui/panels/mod.rs

pub mod annotate;
pub mod annotations;
pub mod dialogs;
pub mod documents;
pub mod labels;
pub mod viewer;
