//! flexcode: a small text editor that runs FLEX programs through an external
//! interpreter reached over a local gateway connection.

pub mod cli;
pub mod config;
pub mod execution;
pub mod gateway;
pub mod handlers;
pub mod logging;
pub mod printer;
pub mod shell;
pub mod store;
pub mod tui;
