//! One-shot commands for scripts and non-interactive shells

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Subcommand;
use std::fmt::Write as _;
use tracing::debug;

use crate::api::Backend;
use crate::controller::{Controller, Outcome};
use crate::history::HistoryStore;
use crate::view::{self, ExecutionView, TranslationView};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Translate a natural language request into a shell command
    Translate {
        /// The request, e.g. "list all files modified today"
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Run a command on the backend and print its output
    Execute {
        /// Working directory on the backend host
        #[arg(short = 'C', long)]
        dir: Option<String>,

        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        command: Vec<String>,
    },

    /// Inspect or edit the saved command history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum HistoryAction {
    /// Print history grouped by day, newest first
    List,
    /// Delete every entry
    Clear,
    /// Mark the newest entry with this command as a favorite
    Favorite {
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,
    },
}

/// Run one CLI command, printing the result to stdout
///
/// # Errors
/// Returns an error when the backend call fails or the command is unknown
pub async fn run(command: Command, backend: &dyn Backend, history: HistoryStore) -> Result<()> {
    match command {
        Command::Translate { query } => translate(&query.join(" "), backend, history).await,
        Command::Execute { dir, command } => {
            let command = command.join(" ");
            let dir = dir.as_deref().map(str::trim).filter(|d| !d.is_empty());
            debug!("Executing {:?} in {:?}", command, dir);
            let result = backend
                .execute(&command, dir)
                .await
                .with_context(|| format!("Failed to execute `{command}`"))?;
            print!("{}", format_execution(&ExecutionView::completed(&result)));
            Ok(())
        }
        Command::History { action } => run_history(action, history),
    }
}

async fn translate(query: &str, backend: &dyn Backend, history: HistoryStore) -> Result<()> {
    let mut controller = Controller::new(history, false);
    controller.set_input(query);

    let outcome = controller.submit(backend).await?;
    if outcome == Outcome::Failed {
        bail!(
            "{}",
            controller.error().unwrap_or("Failed to translate command")
        );
    }

    let view = controller
        .translation_view()
        .context("Backend returned no translation")?;
    print!("{}", format_translation(&view));
    Ok(())
}

fn run_history(action: HistoryAction, mut history: HistoryStore) -> Result<()> {
    match action {
        HistoryAction::List => {
            print!("{}", format_history(&history));
        }
        HistoryAction::Clear => {
            let removed = history.len();
            history.clear();
            println!("Removed {removed} entries");
        }
        HistoryAction::Favorite { command } => {
            let command = command.join(" ");
            if !history.mark_favorite(&command) {
                bail!("No history entry for `{command}`");
            }
            println!("★ {command}");
        }
    }
    Ok(())
}

/// Plain-text rendering of a translation
#[must_use]
pub fn format_translation(view: &TranslationView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "$ {}", view.command.text());
    if let Some((level, severity)) = view.risk {
        let _ = writeln!(out, "Risk: {level} ({})", severity.label());
    }
    if let Some(safety) = &view.safety {
        let _ = writeln!(out, "{} {}", safety.severity.icon(), safety.text);
    }

    let _ = writeln!(out, "\nExplanation:\n  {}", view.explanation);

    out.push_str("\nBreakdown:\n");
    match &view.breakdown {
        Ok(rows) => {
            let width = rows.iter().map(|(c, _)| c.chars().count()).max().unwrap_or(0);
            for (component, explanation) in rows {
                let _ = writeln!(out, "  {component:<width$}  {explanation}");
            }
        }
        Err(placeholder) => {
            let _ = writeln!(out, "  {placeholder}");
        }
    }

    if let Some(simulation) = &view.simulation {
        out.push_str("\nSimulated output:\n");
        for line in simulation.lines() {
            let _ = writeln!(out, "  {line}");
        }
    }
    if let Some(signature) = &view.signature {
        let _ = writeln!(out, "\nSignature: {signature}");
    }
    out
}

/// Plain-text rendering of an execution result
#[must_use]
pub fn format_execution(view: &ExecutionView) -> String {
    let mut out = String::new();
    for line in &view.header {
        let _ = writeln!(out, "{line}");
    }
    let _ = writeln!(out, "{}", view.body.trim_end());
    let _ = write!(out, "\n{} · exit {}", view.status.label(), view.exit_code);
    if let Some(duration) = &view.duration {
        let _ = write!(out, " · {duration}");
    }
    out.push('\n');
    out
}

/// Plain-text rendering of history, grouped by local day
#[must_use]
pub fn format_history(history: &HistoryStore) -> String {
    let groups = history.grouped_by_day();
    if groups.is_empty() {
        return format!("{}\n", view::EMPTY_HISTORY);
    }

    let mut out = String::new();
    for group in groups {
        let _ = writeln!(out, "{}", group.date.format("%A, %B %-d, %Y"));
        for entry in group.entries {
            let star = if entry.is_favorite { " ★" } else { "" };
            let _ = writeln!(
                out,
                "  {}  [risk {}]{}  {}\n         {}",
                entry.timestamp.with_timezone(&Local).format("%H:%M"),
                entry.risk_level,
                star,
                entry.query,
                entry.command
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Breakdown, ExecutionResult, TranslationResult};

    #[test]
    fn test_format_translation_lists_breakdown_in_order() {
        let result = TranslationResult {
            command: "ls -la".to_string(),
            explanation: "Lists files".to_string(),
            breakdown: Breakdown::Structured(vec![
                ("ls".to_string(), "list".to_string()),
                ("-la".to_string(), "long, all".to_string()),
            ]),
            simulation: None,
            safety_warning: None,
            risk_level: Some(0),
            watermark: None,
        };
        let text = format_translation(&TranslationView::new(&result));

        assert!(text.starts_with("$ ls -la\n"));
        let ls = text.find("  ls ").unwrap();
        let la = text.find("  -la").unwrap();
        assert!(ls < la);
        assert!(text.contains("Risk: 0"));
    }

    #[test]
    fn test_format_execution_prefers_stderr() {
        let result = ExecutionResult {
            stdout: "fine".to_string(),
            stderr: "boom".to_string(),
            exit_code: Some(2),
            exit_meaning: None,
            execution_successful: false,
            execution_time: Some(0.5),
            error: None,
            system_info: None,
            working_dir: "/tmp".to_string(),
        };
        let text = format_execution(&ExecutionView::completed(&result));
        assert!(text.contains("boom"));
        assert!(!text.contains("fine"));
        assert!(text.contains("exit 2"));
    }

    #[test]
    fn test_format_empty_history() {
        let history = HistoryStore::in_memory(10);
        assert_eq!(format_history(&history), "No command history yet\n");
    }

    #[test]
    fn test_history_favorite_unknown_command_fails() {
        let history = HistoryStore::in_memory(10);
        let action = HistoryAction::Favorite {
            command: vec!["ls".to_string()],
        };
        assert!(run_history(action, history).is_err());
    }
}
