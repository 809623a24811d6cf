use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque correlation id for one remote job execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Returns `None` for blank ids, which the executor never issues.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Point-in-time snapshot of the remote job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStatus {
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub current_lesson: Option<String>,
    #[serde(default)]
    pub last_run: Option<String>,
    #[serde(default)]
    pub log_count: u64,
}

impl AgentStatus {
    /// What the UI shows before any status has been fetched. Never used to
    /// decide whether start or stop is allowed.
    pub fn idle() -> Self {
        Self {
            running: false,
            current_lesson: None,
            last_run: None,
            log_count: 0,
        }
    }

    /// Whether the log store is worth reading for this session.
    pub fn has_activity(&self) -> bool {
        self.running || self.log_count > 0
    }
}

/// Account password. Redacted in `Debug` and `Display`, never serialized.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    Single,
    Batch,
}

impl StartMode {
    pub fn label(&self) -> &'static str {
        match self {
            StartMode::Single => "Single lesson",
            StartMode::Batch => "Several lessons",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            StartMode::Single => StartMode::Batch,
            StartMode::Batch => StartMode::Single,
        }
    }
}

/// Input for either start mode. `lessons` is a single id/URL in single mode
/// and a comma-separated list in batch mode.
#[derive(Debug, Clone)]
pub struct StartRequest {
    pub account: String,
    pub secret: Secret,
    pub lessons: String,
    pub skip_video: bool,
}

impl StartRequest {
    pub fn new(account: impl Into<String>, secret: Secret, lessons: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            secret,
            lessons: lessons.into(),
            skip_video: false,
        }
    }

    pub fn with_skip_video(mut self, skip_video: bool) -> Self {
        self.skip_video = skip_video;
        self
    }

    /// All three fields are present. The secret is checked untrimmed since
    /// leading spaces may be part of a password.
    pub fn is_complete(&self) -> bool {
        !self.account.trim().is_empty()
            && !self.secret.is_empty()
            && !self.lessons.trim().is_empty()
    }
}

/// Split a batch lesson field into individual ids, the way the executor
/// reads it.
pub fn split_lessons(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Serialize)]
pub struct StartSingleBody<'a> {
    pub lesson_id: &'a str,
    pub skip_video: bool,
    pub unix_email: &'a str,
    pub unix_password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct StartBatchBody<'a> {
    pub lesson_ids: &'a str,
    pub skip_video: bool,
    pub unix_email: &'a str,
    pub unix_password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct StopBody<'a> {
    pub session_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartResponse {
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub lesson_id: Option<serde_json::Value>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionPage {
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub total: u64,
}

pub const QUESTIONS_PAGE_SIZE: u32 = 20;

impl QuestionPage {
    pub fn page_count(&self) -> u64 {
        self.total.div_ceil(QUESTIONS_PAGE_SIZE as u64).max(1)
    }
}
