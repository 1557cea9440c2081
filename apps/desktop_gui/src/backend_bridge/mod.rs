//! Bridge between the egui thread and the tokio-backed session worker.

pub mod commands;
pub mod runtime;
