use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use std::time::Duration;
use tracing::debug;
use unibot_core::{
    new_lines, split_lessons, AgentController, AgentStatus, CommandOutcome, SessionSnapshot,
    StartMode, StartRequest, StatusPoller, TickOutcome, DEFAULT_FOLLOW_THRESHOLD,
};

use crate::config::{read_secret, resolve_account, CliConfig, DEFAULT_PASSWORD_ENV};

#[derive(Args, Debug)]
pub struct StartArgs {
    #[arg(short, long, help = "Uni account email (defaults to the last one used)")]
    pub email: Option<String>,

    #[arg(
        long,
        default_value = DEFAULT_PASSWORD_ENV,
        help = "Environment variable holding the password"
    )]
    pub password_env: String,

    #[arg(long, help = "Do not wait for lesson videos")]
    pub skip_video: bool,

    #[arg(short, long, help = "Keep printing logs until the job finishes")]
    pub follow: bool,
}

/// Controller with a reconciled status, ready for commands.
async fn connect(config: &CliConfig) -> Result<AgentController> {
    debug!("Using API at {}", config.core.api.base_url);
    let controller = AgentController::from_config(&config.core, DEFAULT_FOLLOW_THRESHOLD)?;
    if let TickOutcome::Failed(message) = controller.refresh_status().await {
        bail!("{}", message);
    }
    Ok(controller)
}

pub async fn cmd_start(mode: StartMode, lessons: String, args: StartArgs) -> Result<()> {
    let config = CliConfig::load()?;
    let controller = connect(&config).await?;

    if controller.read(|s| s.display_status().running).await {
        bail!("An agent job is already running. Stop it first with 'unibot stop'.");
    }

    if mode == StartMode::Batch && split_lessons(&lessons).is_empty() {
        bail!("No lesson ids given");
    }

    let last_account = controller
        .read(|s| s.last_account().map(str::to_string))
        .await;
    let account = resolve_account(args.email, last_account)?;
    let secret = read_secret(&args.password_env)?;
    let request = StartRequest::new(account, secret, lessons).with_skip_video(args.skip_video);

    if !request.is_complete() {
        bail!("Email, password and lesson are all required");
    }

    println!(
        "  {} Starting {} run...",
        "→".blue(),
        mode.label().to_lowercase()
    );

    match controller.start(mode, request).await {
        CommandOutcome::Completed => {}
        CommandOutcome::Failed(message) => bail!("{}", message),
        CommandOutcome::Skipped => bail!("The agent is busy or already running"),
    }

    let snapshot = controller.snapshot().await;
    if let Some(session) = &snapshot.session {
        println!(
            "{} Agent started (session {})",
            "✓".green().bold(),
            session.to_string().cyan()
        );
    }

    if args.follow {
        follow(&controller, &config, Vec::new()).await?;
    } else {
        println!(
            "  {} Run 'unibot logs --follow' to watch progress",
            "→".blue()
        );
    }

    Ok(())
}

pub async fn cmd_stop() -> Result<()> {
    let config = CliConfig::load()?;
    let controller = connect(&config).await?;

    if !controller.read(|s| s.can_stop()).await {
        println!("{}", "No running job for this session".yellow());
        return Ok(());
    }

    match controller.stop().await {
        CommandOutcome::Completed => {
            println!("{} Stop requested", "✓".green().bold());
            Ok(())
        }
        CommandOutcome::Failed(message) => bail!("{}", message),
        CommandOutcome::Skipped => {
            println!("{}", "No running job for this session".yellow());
            Ok(())
        }
    }
}

pub async fn cmd_status(format: &str) -> Result<()> {
    let config = CliConfig::load()?;
    let controller = connect(&config).await?;
    let snapshot = controller.snapshot().await;

    if format == "json" {
        let output = serde_json::json!({
            "session_id": snapshot.session.as_ref().map(|s| s.as_str()),
            "status": snapshot.display_status,
            "api": config.core.api.base_url,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", "Uni-Bot Agent Status".cyan().bold());
    println!("{}", "═".repeat(40).dimmed());
    println!();
    print_status(&snapshot.display_status);
    println!(
        "    Session:         {}",
        snapshot
            .session
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "—".to_string())
    );
    println!();
    println!("  {} {}", "API:".dimmed(), config.core.api.base_url);
    Ok(())
}

fn print_status(status: &AgentStatus) {
    let state = if status.running {
        "Running".green().bold()
    } else {
        "Idle".yellow()
    };
    println!("    State:           {}", state);
    println!(
        "    Current lesson:  {}",
        status.current_lesson.as_deref().unwrap_or("—")
    );
    println!(
        "    Last run:        {}",
        status.last_run.as_deref().unwrap_or("—")
    );
    println!("    Log lines:       {}", status.log_count);
}

pub async fn cmd_logs(follow_logs: bool) -> Result<()> {
    let config = CliConfig::load()?;
    let controller = connect(&config).await?;
    let snapshot = controller.snapshot().await;

    if snapshot.session.is_none() {
        println!("{}", "No session yet. Start a job first.".yellow());
        return Ok(());
    }

    for line in &snapshot.logs {
        println!("{}", line);
    }

    if follow_logs && snapshot.display_status.running {
        follow(&controller, &config, snapshot.logs).await?;
    }
    Ok(())
}

fn is_settled(snapshot: &SessionSnapshot) -> bool {
    !snapshot.was_running && snapshot.status.as_ref().is_some_and(|s| !s.running)
}

/// Print new log lines as the poller brings them in, until the job stops
/// or the user interrupts. Interrupting leaves the job running.
async fn follow(controller: &AgentController, config: &CliConfig, printed: Vec<String>) -> Result<()> {
    let period = config.core.poll_interval();
    let poller = StatusPoller::spawn(controller.clone(), period);
    let mut render = tokio::time::interval(period.min(Duration::from_millis(500)));
    let mut printed = printed;
    let mut last_error: Option<String> = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                println!("  {} Stopped following; the job keeps running", "→".blue());
                break;
            }
            _ = render.tick() => {
                let snapshot = controller.snapshot().await;
                for line in new_lines(&printed, &snapshot.logs) {
                    println!("{}", line);
                }
                if snapshot.error != last_error {
                    if let Some(message) = &snapshot.error {
                        eprintln!("{} {}", "!".yellow().bold(), message);
                    }
                    last_error = snapshot.error.clone();
                }
                let settled = is_settled(&snapshot);
                printed = snapshot.logs;
                if settled {
                    println!();
                    println!("{} Job finished", "✓".green().bold());
                    break;
                }
            }
        }
    }

    poller.shutdown().await;
    Ok(())
}
