//! Event loop for the editor.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use log::{debug, info};
use ratatui::prelude::*;
use tokio::sync::mpsc;

use super::{
    app::{App, Command, DialogKind, Focus},
    events::{spawn_input_poller, TuiEvent},
    ui::render_ui,
};
use crate::gateway::RemoteExecution;
use crate::shell;
use crate::store::BufferStore;

type Term = Terminal<CrosstermBackend<io::Stdout>>;

/// What the loop should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Execute(Command),
    Quit,
}

/// Run the editor until the user quits.
pub async fn run_editor<R: RemoteExecution>(
    remote: &mut R,
    store: &BufferStore,
    initial_file: Option<PathBuf>,
) -> Result<()> {
    if !io::IsTerminal::is_terminal(&io::stdout()) {
        return Err(anyhow::anyhow!("the editor requires a terminal"));
    }

    let mut app = App::new(remote.describe());
    if let Some(path) = initial_file {
        shell::open_file(&mut app, store, Some(path));
    }

    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = io::stdout();
    let entered = execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)
        .context("entering the alternate screen");
    or_restore(&mut stdout, entered)?;
    let created = Terminal::new(CrosstermBackend::new(io::stdout())).context("creating terminal");
    let mut terminal = or_restore(&mut stdout, created)?;

    let (event_tx, event_rx) = mpsc::unbounded_channel::<TuiEvent>();
    spawn_input_poller(event_tx);

    let result = run_app(&mut terminal, &mut app, remote, store, event_rx).await;

    leave_editor_mode(terminal.backend_mut())?;
    terminal.show_cursor()?;

    result
}

/// Undo raw mode and the alternate screen.
fn leave_editor_mode<W: io::Write>(out: &mut W) -> io::Result<()> {
    let raw = disable_raw_mode();
    execute!(out, LeaveAlternateScreen, DisableMouseCapture, DisableBracketedPaste)?;
    raw
}

/// Pass `result` through, restoring the terminal first if setup failed.
fn or_restore<T, W: io::Write>(out: &mut W, result: Result<T>) -> Result<T> {
    if result.is_err() {
        if let Err(e) = leave_editor_mode(out) {
            debug!("restoring terminal after failed setup: {e}");
        }
    }
    result
}

async fn run_app<R: RemoteExecution>(
    terminal: &mut Term,
    app: &mut App,
    remote: &mut R,
    store: &BufferStore,
    mut event_rx: mpsc::UnboundedReceiver<TuiEvent>,
) -> Result<()> {
    info!("editor started ({})", remote.describe());
    loop {
        terminal.draw(|frame| render_ui(frame, app))?;

        let Some(tui_event) = event_rx.recv().await else {
            break;
        };

        let flow = match tui_event {
            TuiEvent::Key(key) => handle_key_event(app, store, key),
            TuiEvent::Mouse(mouse) => handle_mouse_event(app, mouse),
            TuiEvent::Paste(text) => {
                handle_paste(app, &text);
                Flow::Continue
            }
            TuiEvent::Resize => Flow::Continue,
        };

        match flow {
            Flow::Continue => {}
            Flow::Quit => break,
            Flow::Execute(Command::Run) => {
                let program = app.begin_run();
                // Show the cleared output while the call blocks the loop.
                terminal.draw(|frame| render_ui(frame, app))?;
                shell::complete_run(app, remote, &program).await;
                app.gateway_label = remote.describe();
            }
            Flow::Execute(Command::Save) => app.open_dialog(DialogKind::Save),
            Flow::Execute(Command::Open) => app.open_dialog(DialogKind::Open),
        }
    }

    info!("editor closed");
    Ok(())
}

fn handle_key_event(app: &mut App, store: &BufferStore, key: KeyEvent) -> Flow {
    if app.is_dialog_open() {
        handle_dialog_key(app, store, key);
        return Flow::Continue;
    }

    if app.show_help {
        app.toggle_help();
        return Flow::Continue;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => {
            if app.handle_ctrl_c() {
                return Flow::Quit;
            }
        }
        KeyCode::Char('q') if ctrl => return Flow::Quit,
        KeyCode::Char('r') if ctrl => return Flow::Execute(Command::Run),
        KeyCode::Char('s') if ctrl => return Flow::Execute(Command::Save),
        KeyCode::Char('o') if ctrl => return Flow::Execute(Command::Open),
        KeyCode::F(5) => return Flow::Execute(Command::Run),
        KeyCode::F(1) => app.toggle_help(),
        KeyCode::Tab if app.focus == Focus::Output => app.toggle_focus(),
        KeyCode::BackTab => app.toggle_focus(),
        _ => handle_navigation_or_edit(app, key),
    }
    Flow::Continue
}

fn handle_navigation_or_edit(app: &mut App, key: KeyEvent) {
    let rows = app.page_rows();
    let editable = app.focus == Focus::Input;
    let area = app.focused_area();

    let edited = match key.code {
        KeyCode::Left => {
            area.move_left();
            false
        }
        KeyCode::Right => {
            area.move_right();
            false
        }
        KeyCode::Up => {
            area.move_up();
            false
        }
        KeyCode::Down => {
            area.move_down();
            false
        }
        KeyCode::Home => {
            area.move_home();
            false
        }
        KeyCode::End => {
            area.move_end();
            false
        }
        KeyCode::PageUp => {
            area.page_up(rows);
            false
        }
        KeyCode::PageDown => {
            area.page_down(rows);
            false
        }
        KeyCode::Enter if editable => {
            area.insert_newline();
            true
        }
        KeyCode::Backspace if editable => {
            area.backspace();
            true
        }
        KeyCode::Delete if editable => {
            area.delete();
            true
        }
        KeyCode::Tab if editable => {
            area.insert_tab();
            true
        }
        KeyCode::Char(c)
            if editable && !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            area.insert_char(c);
            true
        }
        _ => false,
    };

    if edited {
        app.modified = true;
    }
}

fn handle_dialog_key(app: &mut App, store: &BufferStore, key: KeyEvent) {
    let Some(dialog) = app.dialog.as_mut() else {
        return;
    };

    match key.code {
        KeyCode::Esc => {
            let kind = dialog.kind;
            app.dialog = None;
            finish_dialog(app, store, kind, None);
        }
        KeyCode::Enter => {
            let kind = dialog.kind;
            let chosen = dialog.chosen_path();
            app.dialog = None;
            finish_dialog(app, store, kind, chosen);
        }
        KeyCode::Backspace => dialog.backspace(),
        KeyCode::Left => dialog.move_left(),
        KeyCode::Right => dialog.move_right(),
        KeyCode::Home => dialog.cursor = 0,
        KeyCode::End => dialog.cursor = dialog.path.chars().count(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            dialog.insert_char(c)
        }
        _ => {}
    }
}

fn finish_dialog(app: &mut App, store: &BufferStore, kind: DialogKind, path: Option<PathBuf>) {
    debug!("{kind:?} dialog closed with {path:?}");
    match kind {
        DialogKind::Open => shell::open_file(app, store, path),
        DialogKind::Save => shell::save_file(app, store, path),
    }
}

fn handle_mouse_event(app: &mut App, mouse: MouseEvent) -> Flow {
    if app.is_dialog_open() {
        return Flow::Continue;
    }
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if app.show_help {
                app.toggle_help();
                return Flow::Continue;
            }
            if let Some(cmd) = app.button_at(mouse.column, mouse.row) {
                return Flow::Execute(cmd);
            }
            if let Some(focus) = app.region_at(mouse.column, mouse.row) {
                app.focus = focus;
            }
        }
        MouseEventKind::ScrollUp => {
            if let Some(focus) = app.region_at(mouse.column, mouse.row) {
                app.focus = focus;
                app.focused_area().move_up();
            }
        }
        MouseEventKind::ScrollDown => {
            if let Some(focus) = app.region_at(mouse.column, mouse.row) {
                app.focus = focus;
                app.focused_area().move_down();
            }
        }
        _ => {}
    }
    Flow::Continue
}

fn handle_paste(app: &mut App, text: &str) {
    if let Some(dialog) = app.dialog.as_mut() {
        // Paths are single-line.
        for c in text.chars().filter(|c| *c != '\n' && *c != '\r') {
            dialog.insert_char(c);
        }
    } else if app.focus == Focus::Input {
        app.input.insert_str(text);
        app.modified = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use ratatui::layout::Rect;
    use std::fs;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..key(KeyCode::Char(c))
        }
    }

    fn type_str(app: &mut App, store: &BufferStore, s: &str) {
        for c in s.chars() {
            handle_key_event(app, store, key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_shortcuts_map_to_commands() {
        let store = BufferStore::default();
        let mut app = App::new(String::new());
        assert_eq!(handle_key_event(&mut app, &store, key(KeyCode::F(5))), Flow::Execute(Command::Run));
        assert_eq!(handle_key_event(&mut app, &store, ctrl('r')), Flow::Execute(Command::Run));
        assert_eq!(handle_key_event(&mut app, &store, ctrl('s')), Flow::Execute(Command::Save));
        assert_eq!(handle_key_event(&mut app, &store, ctrl('o')), Flow::Execute(Command::Open));
        assert_eq!(handle_key_event(&mut app, &store, ctrl('q')), Flow::Quit);
    }

    #[test]
    fn test_typing_edits_input_only() {
        let store = BufferStore::default();
        let mut app = App::new(String::new());
        type_str(&mut app, &store, "1+2");
        handle_key_event(&mut app, &store, key(KeyCode::Enter));
        type_str(&mut app, &store, "x");
        assert_eq!(app.input.text(), "1+2\nx");
        assert!(app.modified);

        app.focus = Focus::Output;
        type_str(&mut app, &store, "zzz");
        assert!(app.output.is_empty());
    }

    #[test]
    fn test_escape_cancels_open_dialog() {
        let store = BufferStore::default();
        let mut app = App::new(String::new());
        app.input.set_text("keep");
        app.open_dialog(DialogKind::Open);
        type_str(&mut app, &store, "whatever.txt");
        handle_key_event(&mut app, &store, key(KeyCode::Esc));

        assert!(!app.is_dialog_open());
        assert_eq!(app.input.text(), "keep");
    }

    #[test]
    fn test_save_dialog_writes_with_default_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = BufferStore::default();
        let mut app = App::new(String::new());
        app.input.set_text("PRINT(1)");
        app.open_dialog(DialogKind::Save);
        let target = dir.path().join("prog");
        type_str(&mut app, &store, &target.display().to_string());
        handle_key_event(&mut app, &store, key(KeyCode::Enter));

        let saved = dir.path().join("prog.txt");
        assert_eq!(fs::read_to_string(&saved).unwrap(), "PRINT(1)");
        assert_eq!(app.current_path, Some(saved));
    }

    #[test]
    fn test_escape_cancels_save_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let store = BufferStore::default();
        let mut app = App::new(String::new());
        app.open_dialog(DialogKind::Save);
        type_str(&mut app, &store, &dir.path().join("never.txt").display().to_string());
        handle_key_event(&mut app, &store, key(KeyCode::Esc));

        assert!(!dir.path().join("never.txt").exists());
    }

    #[test]
    fn test_click_on_button_executes_command() {
        let mut app = App::new(String::new());
        app.regions.set(super::super::ui::layout(Rect::new(0, 0, 100, 30)));
        let click = |column, row| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };

        assert_eq!(handle_mouse_event(&mut app, click(95, 1)), Flow::Execute(Command::Run));
        assert_eq!(handle_mouse_event(&mut app, click(95, 4)), Flow::Execute(Command::Save));
        assert_eq!(handle_mouse_event(&mut app, click(95, 7)), Flow::Execute(Command::Open));
        assert_eq!(handle_mouse_event(&mut app, click(60, 5)), Flow::Continue);
        assert_eq!(app.focus, Focus::Output);
    }

    #[test]
    fn test_paste_into_input() {
        let mut app = App::new(String::new());
        handle_paste(&mut app, "a\r\nb");
        assert_eq!(app.input.text(), "a\nb");
    }

    #[test]
    fn test_failed_setup_restores_terminal() {
        let mut out = Vec::new();
        let failed: Result<()> = Err(anyhow::anyhow!("no terminal"));

        assert!(or_restore(&mut out, failed).is_err());

        let written = String::from_utf8(out).unwrap();
        assert!(written.contains("\x1b[?1049l"), "alternate screen left: {written:?}");
        assert!(written.contains("\x1b[?2004l"), "bracketed paste disabled: {written:?}");
    }

    #[test]
    fn test_successful_setup_leaves_terminal_alone() {
        let mut out = Vec::new();
        assert_eq!(or_restore(&mut out, Ok(7)).unwrap(), 7);
        assert!(out.is_empty());
    }

    #[test]
    fn test_paste_with_bare_carriage_returns() {
        let mut app = App::new(String::new());
        handle_paste(&mut app, "VAR a = 1\rPRINT(a)\r");
        assert_eq!(app.input.text(), "VAR a = 1\nPRINT(a)\n");
        assert_eq!(app.input.lines().len(), 3);
    }
}
