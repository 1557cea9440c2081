//! UI layer: the two-panel app shell.

pub mod app;

pub use app::TodoApp;
