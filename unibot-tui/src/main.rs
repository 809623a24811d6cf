use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use unibot_core::{get_cache_dir, UnibotConfig};

mod app;
mod events;
mod form;
mod theme;
mod ui;

use app::App;

fn main() -> Result<()> {
    let config = UnibotConfig::load().context("Could not load configuration")?;
    setup_logging(&config);

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &config);
    restore_terminal(&mut terminal)?;

    if let Err(e) = result {
        eprintln!("Application error: {e}");
        return Err(e);
    }

    Ok(())
}

fn log_file_path(config: &UnibotConfig) -> Option<PathBuf> {
    let configured = config.logging.file_path.trim();
    if configured.is_empty() {
        get_cache_dir().map(|dir| dir.join("unibot-tui.log"))
    } else {
        Some(PathBuf::from(configured))
    }
}

/// Logs go to a file; writing to stdout would tear the alternate screen.
fn setup_logging(config: &UnibotConfig) {
    let Some(path) = log_file_path(config) else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Logging disabled, cannot open {}: {}", path.display(), e);
            return;
        }
    };

    let filter = EnvFilter::try_new(config.log_level()).unwrap_or_else(|_| EnvFilter::new("info"));
    let writer = Mutex::new(file);

    if config.logging.json_format {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(writer))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_ansi(false).with_writer(writer))
            .with(filter)
            .init();
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &UnibotConfig,
) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut app = App::new(config).await?;
        app.run(terminal).await
    })
}
