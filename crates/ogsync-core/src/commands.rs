//! Ordered device command sequences

use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered list of CLI commands.
///
/// Order is significant (a list is deleted before it is recreated, the
/// deny-all trailer closes each ACL) and is never changed after generation.
/// Chunking only groups consecutive commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandSequence {
    commands: Vec<String>,
}

impl CommandSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command
    pub fn push(&mut self, command: impl Into<String>) {
        self.commands.push(command.into());
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.commands
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(String::as_str)
    }

    /// Consecutive batches of at most `size` commands.
    ///
    /// A `size` of 0 is treated as 1.
    pub fn chunks(&self, size: usize) -> impl Iterator<Item = &[String]> {
        self.commands.chunks(size.max(1))
    }
}

impl From<Vec<String>> for CommandSequence {
    fn from(commands: Vec<String>) -> Self {
        Self { commands }
    }
}

impl fmt::Display for CommandSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for command in &self.commands {
            writeln!(f, "{command}")?;
        }
        Ok(())
    }
}
