//! Terminal events forwarded from the input poller to the editor loop.

use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind, MouseEvent};
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum TuiEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Bracketed paste content
    Paste(String),
    Resize,
}

impl TuiEvent {
    fn from_crossterm(ev: Event) -> Option<Self> {
        match ev {
            // Release/repeat events are reported on some platforms.
            Event::Key(key) if key.kind == KeyEventKind::Press => Some(TuiEvent::Key(key)),
            Event::Mouse(mouse) => Some(TuiEvent::Mouse(mouse)),
            Event::Paste(text) => Some(TuiEvent::Paste(text)),
            Event::Resize(_, _) => Some(TuiEvent::Resize),
            _ => None,
        }
    }
}

/// Poll crossterm on a blocking task until the receiver goes away.
pub fn spawn_input_poller(tx: mpsc::UnboundedSender<TuiEvent>) {
    tokio::task::spawn_blocking(move || loop {
        if tx.is_closed() {
            break;
        }
        if event::poll(Duration::from_millis(100)).unwrap_or(false) {
            if let Ok(ev) = event::read() {
                if let Some(tui_event) = TuiEvent::from_crossterm(ev) {
                    if tx.send(tui_event).is_err() {
                        break;
                    }
                }
            }
        }
    });
}
