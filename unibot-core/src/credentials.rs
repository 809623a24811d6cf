use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{UnibotError, UnibotResult};
use crate::models::Secret;

/// Optional hand-off of credentials to a platform credential manager, purely
/// so the user does not have to type them again.
///
/// Callers treat this as fire-and-forget: an error here never changes the
/// outcome of the start command that triggered it.
#[async_trait]
pub trait CredentialSink: Send + Sync {
    fn name(&self) -> &str;

    async fn store(&self, account: &str, secret: &Secret) -> UnibotResult<()>;
}

/// Pipes credentials to an external helper command using the
/// `username=`/`password=` line format of git credential helpers.
pub struct HelperCredentialSink {
    program: String,
    args: Vec<String>,
}

impl HelperCredentialSink {
    /// `command` is split on whitespace: the first word is the program.
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[async_trait]
impl CredentialSink for HelperCredentialSink {
    fn name(&self) -> &str {
        &self.program
    }

    async fn store(&self, account: &str, secret: &Secret) -> UnibotResult<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| UnibotError::Credential(format!("{}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            let payload = format!("username={}\npassword={}\n\n", account, secret.expose());
            if let Err(e) = stdin.write_all(payload.as_bytes()).await {
                let _ = child.kill().await;
                return Err(UnibotError::Credential(format!("{}: {}", self.program, e)));
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| UnibotError::Credential(e.to_string()))?;

        if status.success() {
            Ok(())
        } else {
            Err(UnibotError::Credential(format!(
                "{} exited with {}",
                self.program, status
            )))
        }
    }
}
