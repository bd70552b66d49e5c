//! Editor application state.

use std::cell::Cell;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ratatui::layout::Rect;

use super::text_area::TextArea;
use crate::execution::{self, ExecutionResult};

const DOUBLE_CTRL_C_TIMEOUT: Duration = Duration::from_millis(500);

/// The three buttons of the button column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Run,
    Save,
    Open,
}

impl Command {
    pub const ALL: [Command; 3] = [Command::Run, Command::Save, Command::Open];

    pub fn label(self) -> &'static str {
        match self {
            Command::Run => "Run",
            Command::Save => "Save",
            Command::Open => "Open",
        }
    }

    pub fn shortcut(self) -> &'static str {
        match self {
            Command::Run => "F5",
            Command::Save => "^S",
            Command::Open => "^O",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Output,
}

/// Run progress; Displaying is the instant between reply and Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Open,
    Save,
}

/// Path prompt standing in for a native file picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDialog {
    pub kind: DialogKind,
    pub path: String,
    /// Cursor in chars.
    pub cursor: usize,
}

impl FileDialog {
    pub fn new(kind: DialogKind, initial: &str) -> Self {
        Self {
            kind,
            path: initial.to_string(),
            cursor: initial.chars().count(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            DialogKind::Open => "Open file",
            DialogKind::Save => "Save as",
        }
    }

    fn byte_index(&self, col: usize) -> usize {
        self.path
            .char_indices()
            .nth(col)
            .map(|(i, _)| i)
            .unwrap_or(self.path.len())
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.path.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let at = self.byte_index(self.cursor - 1);
            self.path.remove(at);
            self.cursor -= 1;
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.path.chars().count());
    }

    /// `None` when the prompt holds nothing usable.
    pub fn chosen_path(&self) -> Option<PathBuf> {
        let trimmed = self.path.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(PathBuf::from(trimmed))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

/// Screen areas from the last draw, used for mouse hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Regions {
    pub input: Rect,
    pub output: Rect,
    pub buttons: [Rect; 3],
    pub status: Rect,
}

#[derive(Debug)]
pub struct App {
    pub input: TextArea,
    pub output: TextArea,
    pub focus: Focus,
    pub run_state: RunState,
    pub dialog: Option<FileDialog>,
    /// File last opened or saved.
    pub current_path: Option<PathBuf>,
    pub modified: bool,
    pub status_message: String,
    pub status_kind: StatusKind,
    /// Shown on the right of the status bar.
    pub gateway_label: String,
    pub show_help: bool,
    pub last_ctrl_c_time: Option<Instant>,
    pub regions: Cell<Regions>,
}

impl App {
    pub fn new(gateway_label: String) -> Self {
        Self {
            input: TextArea::new(),
            output: TextArea::new(),
            focus: Focus::Input,
            run_state: RunState::Idle,
            dialog: None,
            current_path: None,
            modified: false,
            status_message: "F5 run | ^S save | ^O open | F1 help".to_string(),
            status_kind: StatusKind::Info,
            gateway_label,
            show_help: false,
            last_ctrl_c_time: None,
            regions: Cell::new(Regions::default()),
        }
    }

    pub fn set_info(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
        self.status_kind = StatusKind::Info;
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
        self.status_kind = StatusKind::Error;
    }

    /// Clear the output region and hand back the program to submit.
    pub fn begin_run(&mut self) -> String {
        self.output.clear();
        self.run_state = RunState::Submitting;
        self.set_info("Running…");
        execution::program_text(&self.input.text())
    }

    pub fn finish_run(&mut self, result: ExecutionResult) {
        self.output.set_text(&result.output);
        self.run_state = RunState::Idle;
        let lines = if result.output.is_empty() {
            0
        } else {
            self.output.lines().len()
        };
        self.set_info(format!("Run finished ({lines} line(s))"));
    }

    /// The output stays empty; the failure goes to the status bar.
    pub fn fail_run(&mut self, err: &dyn Display) {
        self.run_state = RunState::Idle;
        self.set_error(format!("Run failed: {err}"));
    }

    /// Replace the input region with freshly opened text.
    pub fn load_text(&mut self, path: &Path, text: &str) {
        self.input.set_text(text);
        self.current_path = Some(path.to_path_buf());
        self.modified = false;
        self.focus = Focus::Input;
        self.set_info(format!("Opened {}", path.display()));
    }

    pub fn mark_saved(&mut self, path: PathBuf) {
        self.set_info(format!("Saved {}", path.display()));
        self.current_path = Some(path);
        self.modified = false;
    }

    pub fn open_dialog(&mut self, kind: DialogKind) {
        let initial = self
            .current_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        self.dialog = Some(FileDialog::new(kind, &initial));
    }

    pub fn is_dialog_open(&self) -> bool {
        self.dialog.is_some()
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::Output,
            Focus::Output => Focus::Input,
        };
    }

    pub fn focused_area(&mut self) -> &mut TextArea {
        match self.focus {
            Focus::Input => &mut self.input,
            Focus::Output => &mut self.output,
        }
    }

    /// Rows of the focused region from the last draw.
    pub fn page_rows(&self) -> usize {
        let regions = self.regions.get();
        let rect = match self.focus {
            Focus::Input => regions.input,
            Focus::Output => regions.output,
        };
        rect.height.saturating_sub(2).max(1) as usize
    }

    /// Button under a screen cell, if any.
    pub fn button_at(&self, column: u16, row: u16) -> Option<Command> {
        let regions = self.regions.get();
        Command::ALL
            .iter()
            .zip(regions.buttons.iter())
            .find(|(_, rect)| contains(rect, column, row))
            .map(|(cmd, _)| *cmd)
    }

    /// Text region under a screen cell, if any.
    pub fn region_at(&self, column: u16, row: u16) -> Option<Focus> {
        let regions = self.regions.get();
        if contains(&regions.input, column, row) {
            Some(Focus::Input)
        } else if contains(&regions.output, column, row) {
            Some(Focus::Output)
        } else {
            None
        }
    }

    /// Returns true on the second Ctrl+C within the timeout.
    pub fn handle_ctrl_c(&mut self) -> bool {
        let now = Instant::now();

        if let Some(last_time) = self.last_ctrl_c_time {
            if now.duration_since(last_time) <= DOUBLE_CTRL_C_TIMEOUT {
                self.last_ctrl_c_time = None;
                return true;
            }
        }

        self.last_ctrl_c_time = Some(now);
        self.set_info("Press Ctrl+C again to quit");
        false
    }

    pub fn title(&self) -> String {
        let name = self
            .current_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string());
        if self.modified {
            format!("{name} [+]")
        } else {
            name
        }
    }
}

fn contains(rect: &Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && column < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}
