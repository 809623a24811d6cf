//! Client for the Uni-Bot agent service.
//!
//! Starts and stops remote lesson jobs, keeps a local view of their status
//! and logs in step with the executor, and remembers the current session
//! across restarts.

pub mod backend;
pub mod client;
pub mod config;
pub mod controller;
pub mod credentials;
pub mod error;
pub mod logs;
pub mod models;
pub mod poller;
pub mod store;
pub mod viewport;

pub use backend::AgentBackend;
pub use client::HttpAgentBackend;
pub use config::{
    get_cache_dir, get_config_dir, get_data_dir, normalize_base_url, ApiConfig, ConfigLoadError,
    CredentialsConfig, LoggingConfig, PollerConfig, StorageConfig, TuiConfig, UnibotConfig,
};
pub use controller::{AgentController, CommandOutcome, SessionSnapshot, SessionState, TickOutcome};
pub use credentials::{CredentialSink, HelperCredentialSink};
pub use error::{UnibotError, UnibotResult};
pub use logs::{new_lines, LogBuffer, LogSynchronizer};
pub use models::{
    split_lessons, AgentStatus, Question, QuestionPage, Secret, SessionToken, StartMode,
    StartRequest, QUESTIONS_PAGE_SIZE,
};
pub use poller::StatusPoller;
pub use store::SessionStore;
pub use viewport::{LogViewport, DEFAULT_FOLLOW_THRESHOLD};
