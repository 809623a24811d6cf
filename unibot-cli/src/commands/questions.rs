use anyhow::{bail, Result};
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use serde_json::Value;
use unibot_core::{AgentBackend, HttpAgentBackend, Question, QUESTIONS_PAGE_SIZE};

use crate::config::CliConfig;

pub async fn cmd_questions(page: u64, format: &str) -> Result<()> {
    if page == 0 {
        bail!("Pages start at 1");
    }

    let config = CliConfig::load()?;
    let backend = HttpAgentBackend::from_config(&config.core)?;
    let offset = (page - 1) * QUESTIONS_PAGE_SIZE as u64;
    let result = backend.list_questions(QUESTIONS_PAGE_SIZE, offset).await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.questions.is_empty() {
        println!("{}", "No questions recorded yet".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("ID").fg(Color::Cyan),
            Cell::new("Lesson").fg(Color::Cyan),
            Cell::new("Question").fg(Color::Cyan),
            Cell::new("Answer").fg(Color::Cyan),
            Cell::new("Recorded").fg(Color::Cyan),
        ]);

    for question in &result.questions {
        table.add_row(question_row(question));
    }

    println!("{table}");
    println!(
        "  {} Page {} of {} ({} total)",
        "→".blue(),
        page,
        result.page_count(),
        result.total
    );
    Ok(())
}

fn question_row(question: &Question) -> Vec<Cell> {
    vec![
        Cell::new(id_text(question.id.as_ref())),
        Cell::new(id_text(question.lesson_id.as_ref())),
        Cell::new(truncate(question.question.as_deref().unwrap_or(""), 60)),
        Cell::new(truncate(question.answer.as_deref().unwrap_or(""), 40)).fg(Color::Green),
        Cell::new(question.created_at.as_deref().unwrap_or("—")),
    ]
}

fn id_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "—".to_string(),
        Some(other) => other.to_string(),
    }
}

fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
