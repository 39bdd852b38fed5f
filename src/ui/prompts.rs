//! ui::prompts
//!
//! Terminal read/write primitives for interactive input.
//!
//! # Design
//!
//! The engine only ever talks to a [`PromptIo`]: it supplies labels and
//! defaults, the implementation owns the terminal. [`TerminalPrompt`] reads
//! stdin line by line (and masks passwords with `rpassword`);
//! [`ScriptedPrompt`] replays canned answers and records every question, so
//! tests can assert that nothing was asked.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use thiserror::Error;

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt cancelled by user")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(String),
}

/// The prompt primitive the engine is written against.
pub trait PromptIo {
    /// Ask for a line of text. An empty answer returns an empty string; the
    /// caller decides whether that means "use the default".
    fn ask(&mut self, label: &str, default: Option<&str>) -> Result<String, PromptError>;

    /// Ask for text without echoing it.
    fn ask_secret(&mut self, label: &str) -> Result<String, PromptError>;

    /// Ask a yes/no question.
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, PromptError>;

    /// Show informational text (e.g. the choices of a select field).
    fn show(&mut self, text: &str);
}

/// Prompts on the controlling terminal. Questions go to stderr so stdout
/// stays clean for `--json` and friends.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }

    fn read_line(&self) -> Result<String, PromptError> {
        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| PromptError::IoError(e.to_string()))?;
        if read == 0 {
            return Err(PromptError::Cancelled);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl PromptIo for TerminalPrompt {
    fn ask(&mut self, label: &str, default: Option<&str>) -> Result<String, PromptError> {
        match default {
            Some(d) if !d.is_empty() => eprint!("{} [{}]: ", label, d),
            _ => eprint!("{}: ", label),
        }
        io::stderr()
            .flush()
            .map_err(|e| PromptError::IoError(e.to_string()))?;
        self.read_line()
    }

    fn ask_secret(&mut self, label: &str) -> Result<String, PromptError> {
        rpassword::prompt_password(format!("{}: ", label))
            .map_err(|e| PromptError::IoError(e.to_string()))
    }

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, PromptError> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            eprint!("{} ({}) ", message, hint);
            io::stderr()
                .flush()
                .map_err(|e| PromptError::IoError(e.to_string()))?;
            let answer = self.read_line()?;
            match answer.trim().to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => eprintln!("Please answer yes or no."),
            }
        }
    }

    fn show(&mut self, text: &str) {
        eprintln!("{}", text);
    }
}

/// Replays scripted answers, recording every question asked.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    confirms: VecDeque<bool>,
    /// Labels of every `ask`/`ask_secret` call, in order.
    pub asked: Vec<String>,
    /// Messages of every `confirm` call, in order.
    pub confirmed: Vec<String>,
    pub shown: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue answers for `ask`, in order.
    pub fn answers<I, S>(mut self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.answers.extend(answers.into_iter().map(Into::into));
        self
    }

    /// Queue answers for `confirm`, in order.
    pub fn confirms(mut self, confirms: impl IntoIterator<Item = bool>) -> Self {
        self.confirms.extend(confirms);
        self
    }

    /// Total number of questions asked, confirmations included.
    pub fn question_count(&self) -> usize {
        self.asked.len() + self.confirmed.len()
    }
}

impl PromptIo for ScriptedPrompt {
    fn ask(&mut self, label: &str, _default: Option<&str>) -> Result<String, PromptError> {
        self.asked.push(label.to_string());
        self.answers.pop_front().ok_or(PromptError::Cancelled)
    }

    fn ask_secret(&mut self, label: &str) -> Result<String, PromptError> {
        self.ask(label, None)
    }

    fn confirm(&mut self, message: &str, _default: bool) -> Result<bool, PromptError> {
        self.confirmed.push(message.to_string());
        self.confirms.pop_front().ok_or(PromptError::Cancelled)
    }

    fn show(&mut self, text: &str) {
        self.shown.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_replays_in_order() {
        let mut prompt = ScriptedPrompt::new().answers(["a", "b"]).confirms([false]);
        assert_eq!(prompt.ask("First", None).unwrap(), "a");
        assert_eq!(prompt.ask_secret("Second").unwrap(), "b");
        assert!(!prompt.confirm("Sure?", true).unwrap());
        assert_eq!(prompt.asked, vec!["First", "Second"]);
        assert_eq!(prompt.question_count(), 3);
    }

    #[test]
    fn scripted_exhaustion_cancels() {
        let mut prompt = ScriptedPrompt::new();
        assert!(matches!(prompt.ask("x", None), Err(PromptError::Cancelled)));
        assert!(matches!(prompt.confirm("y", true), Err(PromptError::Cancelled)));
    }
}
