//! Full-screen editor built on Ratatui.

pub mod app;
pub mod events;
pub mod handler;
pub mod text_area;
pub mod ui;

pub use handler::run_editor;
