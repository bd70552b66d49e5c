//! Editor shell commands: Run, Open and Save on top of [`App`] state.
//!
//! Each command reports failure in the status bar; none of them aborts the
//! editor. A `None` path means the file prompt was cancelled.

use std::path::PathBuf;

use log::{info, warn};

use crate::execution;
use crate::gateway::RemoteExecution;
use crate::store::BufferStore;
use crate::tui::app::App;

/// Submit the program returned by [`App::begin_run`] and display the reply.
pub async fn complete_run<R: RemoteExecution>(app: &mut App, remote: &mut R, program: &str) {
    match execution::execute(remote, program).await {
        Ok(result) => {
            info!("run ok: {} bytes of output", result.output.len());
            app.finish_run(result);
        }
        Err(e) => {
            warn!("run failed: {e}");
            app.fail_run(&e);
        }
    }
}

pub async fn run_program<R: RemoteExecution>(app: &mut App, remote: &mut R) {
    let program = app.begin_run();
    complete_run(app, remote, &program).await;
}

pub fn open_file(app: &mut App, store: &BufferStore, path: Option<PathBuf>) {
    let Some(path) = path else {
        app.set_info("Open cancelled");
        return;
    };
    match store.open(&path) {
        Ok(text) => app.load_text(&path, &text),
        Err(e) => {
            warn!("{e}");
            app.set_error(e.to_string());
        }
    }
}

pub fn save_file(app: &mut App, store: &BufferStore, path: Option<PathBuf>) {
    let Some(path) = path else {
        app.set_info("Save cancelled");
        return;
    };
    match store.save(&path, &app.input.text()) {
        Ok(saved) => app.mark_saved(saved),
        Err(e) => {
            warn!("{e}");
            app.set_error(e.to_string());
        }
    }
}
