use std::io::{self, BufRead, Write};
use std::sync::Mutex;

/// Blocking user interaction: acknowledgements and yes/no confirmations.
pub trait Prompt: Send + Sync {
    fn alert(&self, message: &str);
    fn confirm(&self, message: &str) -> bool;
}

/// Prompts on stderr, answers from stdin.
pub struct TerminalPrompt {
    assume_yes: bool,
}

impl TerminalPrompt {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Prompt for TerminalPrompt {
    fn alert(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{} [y/N] ", message);
        let _ = io::stderr().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Test double: records alerts and answers confirmations with a fixed reply.
/// Not used by the CLI.
#[derive(Default)]
pub struct RecordingPrompt {
    answer: bool,
    alerts: Mutex<Vec<String>>,
    confirms: Mutex<Vec<String>>,
}

impl RecordingPrompt {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            ..Self::default()
        }
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn confirms(&self) -> Vec<String> {
        self.confirms.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Prompt for RecordingPrompt {
    fn alert(&self, message: &str) {
        if let Ok(mut alerts) = self.alerts.lock() {
            alerts.push(message.to_string());
        }
    }

    fn confirm(&self, message: &str) -> bool {
        if let Ok(mut confirms) = self.confirms.lock() {
            confirms.push(message.to_string());
        }
        self.answer
    }
}
