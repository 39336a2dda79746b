//! User-facing notifications: the terminal counterpart of message boxes.

use std::io::Write;

/// Blocking notifications shown to the user
pub trait Notifier {
    /// Success or neutral information
    fn info(&mut self, title: &str, message: &str);

    /// Failure; `message` carries the underlying error text verbatim
    fn error(&mut self, title: &str, message: &str);

    /// Show a yes/no question; the answer is read by the caller
    fn prompt(&mut self, question: &str);
}

/// Writes notifications to the terminal
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn info(&mut self, title: &str, message: &str) {
        if message.is_empty() {
            println!("[OK] {}", title);
        } else {
            println!("[OK] {}\n{}", title, message);
        }
    }

    fn error(&mut self, title: &str, message: &str) {
        eprintln!("[ERROR] {}\n{}", title, message);
    }

    fn prompt(&mut self, question: &str) {
        print!("{} [y/N] ", question);
        let _ = std::io::stdout().flush();
    }
}

/// Keeps every notification, for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub infos: Vec<(String, String)>,
    pub errors: Vec<(String, String)>,
    pub prompts: Vec<String>,
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn info(&mut self, title: &str, message: &str) {
        self.infos.push((title.to_string(), message.to_string()));
    }

    fn error(&mut self, title: &str, message: &str) {
        self.errors.push((title.to_string(), message.to_string()));
    }

    fn prompt(&mut self, question: &str) {
        self.prompts.push(question.to_string());
    }
}
