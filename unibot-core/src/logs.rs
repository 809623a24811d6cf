use tracing::debug;

use crate::backend::AgentBackend;
use crate::error::UnibotResult;
use crate::models::SessionToken;

/// Full ordered log history of the current session.
///
/// Never appended to: every sync replaces the whole sequence with what the
/// executor holds, so reordered or re-derived lines are picked up as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogBuffer {
    lines: Vec<String>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, lines: Vec<String>) {
        self.lines = lines;
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Fetches the complete log sequence for a session.
pub struct LogSynchronizer;

impl LogSynchronizer {
    /// Without a token there is nothing to read, so this returns an empty
    /// sequence without touching the backend.
    pub async fn fetch(
        backend: &dyn AgentBackend,
        session: Option<&SessionToken>,
    ) -> UnibotResult<Vec<String>> {
        let Some(token) = session else {
            return Ok(Vec::new());
        };

        let lines = backend.get_logs(token).await?;
        debug!(session = %token, lines = lines.len(), "Fetched agent logs");
        Ok(lines)
    }
}

/// Lines present in `current` that were not in `previous`, assuming the
/// executor only ever grew the sequence. Falls back to the whole of
/// `current` when the history was rewritten.
pub fn new_lines<'a>(previous: &[String], current: &'a [String]) -> &'a [String] {
    if current.len() >= previous.len() && current[..previous.len()] == *previous {
        &current[previous.len()..]
    } else {
        current
    }
}
