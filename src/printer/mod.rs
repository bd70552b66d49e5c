//! Terminal output for the headless runner.

use owo_colors::OwoColorize;

pub struct TextPrinter {
    pub color: bool,
}

impl TextPrinter {
    pub fn print(&self, text: &str) {
        if text.ends_with('\n') || text.is_empty() {
            print!("{text}");
        } else {
            println!("{text}");
        }
    }

    pub fn error(&self, text: &str) {
        if self.color {
            eprintln!("{} {}", "error:".red().bold(), text);
        } else {
            eprintln!("error: {text}");
        }
    }

    pub fn info(&self, label: &str, text: &str) {
        if self.color {
            println!("{} {}", label.cyan(), text);
        } else {
            println!("{label} {text}");
        }
    }
}
