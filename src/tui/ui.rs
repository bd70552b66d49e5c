//! UI layout and rendering logic for the editor.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::app::{App, Command, Focus, Regions, RunState, StatusKind};
use super::text_area::TextArea;

const BUTTON_COLUMN_WIDTH: u16 = 10;
const BUTTON_HEIGHT: u16 = 3;

/// Split the screen: input | output | buttons on top, status bar below.
pub fn layout(area: Rect) -> Regions {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Min(10),
            Constraint::Length(BUTTON_COLUMN_WIDTH),
        ])
        .split(rows[0]);

    let button_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(BUTTON_HEIGHT),
            Constraint::Length(BUTTON_HEIGHT),
            Constraint::Length(BUTTON_HEIGHT),
            Constraint::Min(0),
        ])
        .split(columns[2]);

    Regions {
        input: columns[0],
        output: columns[1],
        buttons: [button_rows[0], button_rows[1], button_rows[2]],
        status: rows[1],
    }
}

/// Render the main UI
pub fn render_ui(frame: &mut Frame, app: &App) {
    let regions = layout(frame.area());
    app.regions.set(regions);

    let input_title = format!(" {} ", app.title());
    render_text_area(
        frame,
        &app.input,
        regions.input,
        &input_title,
        app.focus == Focus::Input && !app.is_dialog_open(),
    );
    render_text_area(
        frame,
        &app.output,
        regions.output,
        " Output ",
        app.focus == Focus::Output && !app.is_dialog_open(),
    );

    for (cmd, rect) in Command::ALL.iter().zip(regions.buttons.iter()) {
        render_button(frame, app, *cmd, *rect);
    }

    render_status_bar(frame, app, regions.status);

    if app.show_help {
        render_help_overlay(frame);
    }

    if app.dialog.is_some() {
        render_file_dialog(frame, app);
    }
}

fn render_text_area(frame: &mut Frame, area_state: &TextArea, area: Rect, title: &str, focused: bool) {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title.to_string());
    let inner = block.inner(area);

    let (top, left) = area_state.viewport(inner.width as usize, inner.height as usize);
    let lines: Vec<Line> = area_state
        .lines()
        .iter()
        .skip(top)
        .take(inner.height as usize)
        .map(|l| Line::from(l.as_str()))
        .collect();

    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .style(Style::default().fg(Color::White))
        .scroll((0, left.min(u16::MAX as usize) as u16));
    frame.render_widget(paragraph, area);

    if focused && inner.width > 0 && inner.height > 0 {
        let cursor = area_state.cursor();
        let x = inner.x as usize + area_state.cursor_display_col().saturating_sub(left);
        let y = inner.y as usize + cursor.row.saturating_sub(top);
        frame.set_cursor_position(Position::new(x as u16, y as u16));
    }
}

fn render_button(frame: &mut Frame, app: &App, cmd: Command, area: Rect) {
    let busy = cmd == Command::Run && app.run_state == RunState::Submitting;
    let style = if busy {
        Style::default().fg(Color::Black).bg(Color::Yellow)
    } else {
        Style::default().fg(Color::Black).bg(Color::Gray)
    };
    let label = Line::from(vec![
        Span::styled(cmd.label(), style.add_modifier(Modifier::BOLD)),
        Span::styled(format!(" {}", cmd.shortcut()), style),
    ]);
    let button = Paragraph::new(label)
        .alignment(Alignment::Center)
        .style(style)
        .block(Block::default().borders(Borders::ALL).border_style(style));
    frame.render_widget(button, area);
}

/// Render the status bar
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let msg_style = match app.status_kind {
        StatusKind::Info => Style::default().bg(Color::DarkGray).fg(Color::White),
        StatusKind::Error => Style::default().bg(Color::Red).fg(Color::White),
    };
    let right = format!(" {} ", app.gateway_label);
    let width = area.width as usize;
    let right_width = UnicodeWidthStr::width(right.as_str()).min(width);
    let left_width = width.saturating_sub(right_width);

    let message = truncate_to_width(&format!(" {}", app.status_message), left_width);
    let pad = left_width.saturating_sub(UnicodeWidthStr::width(message.as_str()));

    let line = Line::from(vec![
        Span::styled(message, msg_style),
        Span::styled(" ".repeat(pad), msg_style),
        Span::styled(right, Style::default().bg(Color::Gray).fg(Color::Black)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Cut `text` to at most `max` columns, marking the cut with `…`.
fn truncate_to_width(text: &str, max: usize) -> String {
    if UnicodeWidthStr::width(text) <= max {
        return text.to_string();
    }
    let budget = max.saturating_sub(1);
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    if max > 0 {
        out.push('…');
    }
    out
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame) {
    let popup_area = centered_rect(60, 60, frame.area());
    frame.render_widget(Clear, popup_area);

    let help_lines = vec![
        Line::from("Commands:"),
        Line::from("  F5 / Ctrl+R   - Run the program"),
        Line::from("  Ctrl+S        - Save input to a file"),
        Line::from("  Ctrl+O        - Open a file into the input"),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  Shift+Tab     - Switch input/output"),
        Line::from("  Tab           - Indent (input) / switch (output)"),
        Line::from("  Arrows, Home, End, PgUp, PgDn"),
        Line::from("  Mouse click   - Press button / focus region"),
        Line::from(""),
        Line::from("  F1            - Toggle this help"),
        Line::from("  Ctrl+Q        - Quit (or Ctrl+C twice)"),
    ];

    let help_paragraph = Paragraph::new(Text::from(help_lines)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Help")
            .title_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
    );
    frame.render_widget(help_paragraph, popup_area);
}

fn render_file_dialog(frame: &mut Frame, app: &App) {
    let Some(dialog) = &app.dialog else {
        return;
    };
    let area = frame.area();
    let width = area.width.saturating_sub(4).min(70);
    let popup_area = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(4) / 2,
        width,
        4.min(area.height),
    );
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", dialog.title()))
        .title_bottom(Line::from(" Enter confirm | Esc cancel ").alignment(Alignment::Right))
        .title_style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        );
    let inner = block.inner(popup_area);

    let before: String = dialog.path.chars().take(dialog.cursor).collect();
    let cursor_col = UnicodeWidthStr::width(before.as_str());
    let scroll = cursor_col.saturating_sub(inner.width.saturating_sub(1) as usize);

    let paragraph = Paragraph::new(dialog.path.as_str())
        .block(block)
        .scroll((0, scroll.min(u16::MAX as usize) as u16));
    frame.render_widget(paragraph, popup_area);

    if inner.width > 0 && inner.height > 0 {
        let x = inner.x as usize + cursor_col - scroll;
        frame.set_cursor_position(Position::new(x as u16, inner.y));
    }
}

/// Helper function to create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_layout_places_buttons_in_right_column() {
        let regions = layout(Rect::new(0, 0, 100, 30));
        assert_eq!(regions.status, Rect::new(0, 29, 100, 1));
        for button in regions.buttons {
            assert_eq!(button.x, 90);
            assert_eq!(button.width, BUTTON_COLUMN_WIDTH);
        }
        assert_eq!(regions.buttons[1].y, BUTTON_HEIGHT);
        assert!(regions.input.right() <= regions.output.x);
    }

    #[test]
    fn test_render_shows_buttons_and_output() {
        let backend = TestBackend::new(80, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut app = App::new("gateway 127.0.0.1:25530".into());
        app.output.set_text("1\n2\n3");

        terminal.draw(|f| render_ui(f, &app)).unwrap();

        let buffer = terminal.backend().buffer().clone();
        let screen: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(screen.contains("Run"));
        assert!(screen.contains("Save"));
        assert!(screen.contains("Open"));
        assert!(screen.contains("Output"));
        assert!(screen.contains("127.0.0.1:25530"));
        assert_ne!(app.regions.get(), Regions::default());
    }

    #[test]
    fn test_truncate_counts_display_columns() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdef", 4), "abc…");
        let cut = truncate_to_width("错误错误错误", 6);
        assert_eq!(cut, "错误…");
        assert!(UnicodeWidthStr::width(cut.as_str()) <= 6);
        assert_eq!(truncate_to_width("错误", 0), "");
    }

    #[test]
    fn test_wide_error_keeps_gateway_label_visible() {
        let backend = TestBackend::new(40, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut app = App::new("gw 25530".into());
        app.set_error("运行失败：无法连接到解释器网关，请检查服务是否启动");

        terminal.draw(|f| render_ui(f, &app)).unwrap();

        let buffer = terminal.backend().buffer().clone();
        let status: String = buffer.content[9 * 40..]
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(status.contains("gw 25530"), "status row: {status:?}");
    }
}
