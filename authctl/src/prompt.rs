//! Interactive operator input.

use std::collections::VecDeque;
use std::io::{BufRead, ErrorKind, Write};
use std::sync::Mutex;

use auth_core::{AuthError, AuthResult};
use tokio::runtime::RuntimeFlavor;

/// Blocking "show a message, read one line" capability.
pub trait Prompter: Send + Sync {
    /// Show `message` and return the next line with surrounding whitespace
    /// trimmed. End of input yields an empty string.
    fn prompt(&self, message: &str) -> AuthResult<String>;

    /// Ask a yes/no question; only an answer starting with `y` or `Y` affirms.
    fn confirm(&self, message: &str) -> AuthResult<bool> {
        let answer = self.prompt(message)?;
        Ok(is_affirmative(&answer))
    }
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim_start().chars().next(), Some('y') | Some('Y'))
}

/// Reads from stdin and writes prompts to stderr, keeping stdout clean.
#[derive(Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn prompt(&self, message: &str) -> AuthResult<String> {
        let read = || {
            let stdin = std::io::stdin();
            let stderr = std::io::stderr();
            read_answer(&mut stdin.lock(), &mut stderr.lock(), message)
        };
        // Blocking on the terminal must not stall other tasks on a worker thread.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(read)
            }
            _ => read(),
        }
    }
}

/// Write `message` to `output` and read one line from `input`, trimmed.
pub fn read_answer<R: BufRead, W: Write>(input: &mut R, output: &mut W, message: &str) -> AuthResult<String> {
    writeln!(output, "{}", message)
        .and_then(|_| output.flush())
        .map_err(AuthError::Input)?;

    let mut line = String::new();
    input.read_line(&mut line).map_err(AuthError::Input)?;
    Ok(line.trim().to_string())
}

/// Answers prompts from a fixed script and records what was asked.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Prompts shown so far, in order.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

}

impl Prompter for ScriptedPrompter {
    fn prompt(&self, message: &str) -> AuthResult<String> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(message.to_string());
        }
        self.answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
            .map(|answer| answer.trim().to_string())
            .ok_or_else(|| {
                AuthError::Input(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("no scripted answer for prompt: {}", message),
                ))
            })
    }
}
