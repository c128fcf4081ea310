//! Install inputs and interactive collection.

use crate::error::{Error, Result};
use colored::Colorize;
use serde::Serialize;
use std::collections::HashMap;
use std::io::{BufRead, Write};

/// One value the user must supply before a payload can be executed.
/// Unique by id within a single compiled payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallInput {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub password: bool,
}

/// Answer source for input prompts. Tests inject canned answers.
pub trait Prompter {
    /// `None` means the user canceled.
    fn prompt(&mut self, input: &InstallInput) -> Result<Option<String>>;
}

/// Reads answers line-by-line from stdin, prompting on stderr.
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn prompt(&mut self, input: &InstallInput) -> Result<Option<String>> {
        let label = input.description.as_deref().unwrap_or(&input.id);
        let hint = if input.password { " (secret)" } else { "" };
        eprint!("{} {}{}: ", "?".cyan().bold(), label, hint.dimmed());
        std::io::stderr().flush()?;

        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None); // EOF
        }
        let answer = line.trim_end_matches(['\r', '\n']).to_string();
        if answer.is_empty() {
            return Ok(None);
        }
        Ok(Some(answer))
    }
}

/// Collect a value for every input, each id exactly once. A canceled prompt
/// aborts the whole operation with `PlaceholderResolution`.
pub fn collect(
    inputs: &[InstallInput],
    prompter: &mut dyn Prompter,
) -> Result<HashMap<String, String>> {
    let mut values = HashMap::new();
    for input in inputs {
        match prompter.prompt(input)? {
            Some(value) => {
                values.insert(input.id.clone(), value);
            }
            None => {
                return Err(Error::PlaceholderResolution(format!(
                    "no value provided for input '{}'",
                    input.id
                )));
            }
        }
    }
    Ok(values)
}

#[cfg(test)]
pub(crate) struct CannedPrompter {
    pub answers: HashMap<String, String>,
}

#[cfg(test)]
impl Prompter for CannedPrompter {
    fn prompt(&mut self, input: &InstallInput) -> Result<Option<String>> {
        Ok(self.answers.get(&input.id).cloned())
    }
}
