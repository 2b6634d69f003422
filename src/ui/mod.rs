// SpanMark - ui/mod.rs
//
// UI layer: egui panels and theme. Rendering only; all state mutations go
// through `app::state::AppState` methods.

pub mod panels;
pub mod theme;
