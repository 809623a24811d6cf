use async_trait::async_trait;

use crate::error::UnibotResult;
use crate::models::{AgentStatus, QuestionPage, SessionToken, StartRequest};

/// The external job executor, as seen by the session client.
///
/// Every method is one request/response round trip. Implementations must not
/// retry on their own: the status poller's timer is the retry mechanism.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Start a job for one lesson id or URL. Returns the new session token.
    async fn start_single(&self, request: &StartRequest) -> UnibotResult<SessionToken>;

    /// Start a job for a comma-separated list of lesson ids.
    async fn start_batch(&self, request: &StartRequest) -> UnibotResult<SessionToken>;

    async fn stop(&self, session: &SessionToken) -> UnibotResult<()>;

    /// `Ok(None)` means the executor answered with an empty (`null`) status,
    /// which is not the same thing as an idle job.
    async fn get_status(&self, session: Option<&SessionToken>)
        -> UnibotResult<Option<AgentStatus>>;

    async fn get_logs(&self, session: &SessionToken) -> UnibotResult<Vec<String>>;

    async fn list_questions(&self, limit: u32, offset: u64) -> UnibotResult<QuestionPage>;
}
