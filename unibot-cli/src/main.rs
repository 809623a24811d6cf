use clap::{Parser, Subcommand};
use colored::Colorize;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use unibot_core::StartMode;

mod commands;
mod config;

use commands::{cmd_logs, cmd_questions, cmd_start, cmd_status, cmd_stop, StartArgs};
use config::CliConfig;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "unibot")]
#[command(version = VERSION)]
#[command(about = "Uni-Bot - start, stop and follow lesson agent jobs")]
#[command(long_about = r#"
Uni-Bot drives a remote agent that works through Uni lessons on your behalf.
This tool starts a run for one lesson or a batch, follows its logs, and stops
it again. The current session is remembered between invocations.

Point it at the backend with UNIBOT_API_URL or ./unibot.toml, then try
'unibot status'.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Start the agent on a single lesson")]
    Start {
        #[arg(short, long, help = "Lesson id or URL")]
        lesson: String,

        #[command(flatten)]
        args: StartArgs,
    },

    #[command(about = "Start the agent on several lessons")]
    Batch {
        #[arg(short, long, help = "Comma-separated lesson ids, e.g. \"9843, 9845\"")]
        lessons: String,

        #[command(flatten)]
        args: StartArgs,
    },

    #[command(about = "Stop the running job")]
    Stop,

    #[command(about = "Show the state of the current job")]
    Status {
        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },

    #[command(about = "Print the logs of the current session")]
    Logs {
        #[arg(short, long, help = "Keep printing new lines while the job runs")]
        follow: bool,
    },

    #[command(about = "List questions answered by the agent")]
    Questions {
        #[arg(short, long, default_value = "1")]
        page: u64,

        #[arg(short, long, default_value = "text", help = "Output format (text, json)")]
        format: String,
    },

    #[command(about = "Show the resolved configuration")]
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Start { lesson, args } => cmd_start(StartMode::Single, lesson, args).await,
        Commands::Batch { lessons, args } => cmd_start(StartMode::Batch, lessons, args).await,
        Commands::Stop => cmd_stop().await,
        Commands::Status { format } => cmd_status(&format).await,
        Commands::Logs { follow } => cmd_logs(follow).await,
        Commands::Questions { page, format } => cmd_questions(page, &format).await,
        Commands::Config => cmd_config(),
    }
}

fn cmd_config() -> anyhow::Result<()> {
    let config = CliConfig::load()?;

    println!("{}", "Uni-Bot Configuration".cyan().bold());
    println!("{}", "═".repeat(40).dimmed());
    println!("  {:<18} {}", "API:".bold(), config.core.api.base_url);
    println!(
        "  {:<18} {} ms",
        "Poll interval:".bold(),
        config.core.poller.interval_ms
    );
    println!("  {:<18} {}", "Log level:".bold(), config.log_level());
    println!(
        "  {:<18} {}",
        "State file:".bold(),
        config
            .core
            .state_file_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(in memory)".to_string())
    );
    println!(
        "  {:<18} {}",
        "Credential helper:".bold(),
        config.core.credential_helper().unwrap_or("(none)")
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_batch() {
        let cli = Cli::try_parse_from([
            "unibot",
            "batch",
            "--lessons",
            "9843, 9845",
            "--email",
            "a@x.com",
            "--skip-video",
        ])
        .unwrap();
        match cli.command {
            Commands::Batch { lessons, args } => {
                assert_eq!(lessons, "9843, 9845");
                assert_eq!(args.email.as_deref(), Some("a@x.com"));
                assert!(args.skip_video);
                assert_eq!(args.password_env, "UNIBOT_PASSWORD");
            }
            _ => panic!("expected batch"),
        }
    }
}
