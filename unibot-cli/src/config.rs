use anyhow::{anyhow, bail, Context, Result};
use dialoguer::{Input, Password};
use std::io::IsTerminal;
use unibot_core::{Secret, UnibotConfig};

pub const DEFAULT_PASSWORD_ENV: &str = "UNIBOT_PASSWORD";

/// Resolved settings for one CLI invocation.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub core: UnibotConfig,
}

impl CliConfig {
    pub fn load() -> Result<Self> {
        let core = UnibotConfig::load().context(
            "Could not load configuration. \n\
             Set UNIBOT_API_URL or create ./unibot.toml with:\n\
             [api]\n\
             base_url = \"http://localhost:8000\"",
        )?;
        Ok(Self { core })
    }

    pub fn log_level(&self) -> &str {
        self.core.log_level()
    }
}

/// Password from `env_var`, or an interactive prompt when attached to a
/// terminal. The value is never echoed or logged.
pub fn read_secret(env_var: &str) -> Result<Secret> {
    if let Ok(value) = std::env::var(env_var) {
        if !value.is_empty() {
            return Ok(Secret::new(value));
        }
    }

    if !std::io::stdin().is_terminal() {
        bail!(
            "No password available. Set {} or run from an interactive terminal.",
            env_var
        );
    }

    let value = Password::new()
        .with_prompt("Uni password")
        .interact()
        .map_err(|e| anyhow!("Failed to read password: {}", e))?;
    Ok(Secret::new(value))
}

/// Account from the flag, else prompt with the last used one as default.
pub fn resolve_account(flag: Option<String>, last: Option<String>) -> Result<String> {
    if let Some(account) = flag.filter(|a| !a.trim().is_empty()) {
        return Ok(account.trim().to_string());
    }

    if !std::io::stdin().is_terminal() {
        return last.ok_or_else(|| anyhow!("No account given. Pass --email <ADDRESS>."));
    }

    let mut prompt = Input::<String>::new().with_prompt("Uni email");
    if let Some(last) = last {
        prompt = prompt.default(last);
    }
    let account = prompt
        .interact_text()
        .map_err(|e| anyhow!("Failed to read email: {}", e))?;
    Ok(account.trim().to_string())
}
