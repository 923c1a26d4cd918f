//! CLI output formatting utilities.

use crate::orchestrator::{AgentState, AgentStatusSnapshot, OperationOutcome};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print an operation outcome. Returns whether it succeeded.
    pub fn outcome(outcome: &OperationOutcome, done: &str) -> bool {
        match (outcome.payload(), outcome.error()) {
            (Some(payload), _) => {
                Output::success(done);
                if let Some(fields) = payload.as_object() {
                    for (key, value) in fields {
                        match value {
                            serde_json::Value::String(s) => Output::kv(key, &preview(s, 120)),
                            serde_json::Value::Object(_) => {}
                            other => Output::kv(key, &other.to_string()),
                        }
                    }
                }
                if let Some(output) = payload["result"]["output"].as_str() {
                    println!();
                    println!("{}", output);
                }
                true
            }
            (None, error) => {
                Output::error(error.unwrap_or("operation failed"));
                false
            }
        }
    }

    /// Print an agent status snapshot.
    pub fn status(snapshot: &AgentStatusSnapshot) {
        let status = match snapshot.status {
            AgentState::Active => style(snapshot.status.to_string()).green(),
            AgentState::Error => style(snapshot.status.to_string()).red(),
        };
        Output::kv("Status", &status.to_string());
        Output::kv("Tasks completed", &snapshot.tasks_completed.to_string());
        Output::kv("Success rate", &format!("{:.1}%", snapshot.success_rate));
        Output::kv("Queue length", &snapshot.queue_length.to_string());
        Output::kv(
            "Current task",
            snapshot.current_task.as_deref().unwrap_or("none"),
        );
        Output::kv(
            "Last activity",
            &snapshot
                .last_activity
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "never".to_string()),
        );
        if let Some(pages) = &snapshot.pages_count {
            Output::kv("Pages", &preview(pages, 200));
        }
        if let Some(error) = &snapshot.error {
            Output::kv("Error", error);
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(spinner_style);
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Collapse newlines and truncate with ellipsis.
fn preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("a\nb", 10), "a b");
        assert_eq!(preview("שלום עולם", 4), "שלום...");
    }

    #[test]
    fn test_outcome_reports_success() {
        let ok = OperationOutcome::succeeded(serde_json::json!({"content_length": 3}));
        assert!(Output::outcome(&ok, "done"));
        assert!(!Output::outcome(&OperationOutcome::failed("boom"), "done"));
    }
}
