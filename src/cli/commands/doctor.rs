//! Doctor command - verify configuration and credentials.

use crate::agent::check_tool_names;
use crate::backend::BackendCredentials;
use crate::cli::Output;
use crate::config::{AgentMode, Settings};
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Quill Doctor");
    println!();
    println!("Checking configuration and credentials...\n");

    let sections = [
        ("API Configuration", vec![check_openai_api_key()]),
        ("Backend", check_backend(settings)),
        ("Agent", check_agent(settings)),
        (
            "Configuration",
            vec![check_config_file(config_path), check_data_dir(settings)],
        ),
    ];

    let mut checks = Vec::new();
    for (title, results) in sections {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    }

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Quill.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Quill is ready to use.");
    }

    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_openai_api_key() -> CheckResult {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if key.starts_with("sk-") && key.len() > 20 => {
            let masked = format!("{}...{}", &key[..7], &key[key.len() - 4..]);
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", masked))
        }
        Ok(key) if key.is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Ok(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        Err(_) => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// Check the backend URL and credentials.
fn check_backend(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    match url::Url::parse(&settings.backend.base_url) {
        Ok(url) => results.push(CheckResult::ok("Base URL", url.as_str())),
        Err(e) => results.push(CheckResult::error(
            "Base URL",
            &format!("invalid ({})", e),
            "Set with: quill config set backend.base_url https://example.com/wp-json/wp/v2",
        )),
    }

    match BackendCredentials::from_settings(&settings.backend) {
        Some(credentials) => results.push(CheckResult::ok(
            "Credentials",
            &format!("configured (user {})", credentials.username),
        )),
        None => results.push(CheckResult::warning(
            "Credentials",
            "not configured",
            "Set CMS_USERNAME and CMS_PASSWORD, or [backend] username/password",
        )),
    }

    results
}

/// Check agent mode, tools and the homepage ID.
fn check_agent(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let mode = match settings.agent.mode {
        AgentMode::Remote => match url::Url::parse(&settings.agent.endpoint) {
            Ok(_) => CheckResult::ok("Mode", &format!("remote ({})", settings.agent.endpoint)),
            Err(e) => CheckResult::error(
                "Mode",
                &format!("remote endpoint invalid ({})", e),
                "Set with: quill config set agent.endpoint http://localhost:8000/agent",
            ),
        },
        AgentMode::Echo => CheckResult::warning(
            "Mode",
            "echo (dry run, nothing is published)",
            "Set with: quill config set agent.mode local",
        ),
        AgentMode::Local => CheckResult::ok("Mode", "local"),
    };
    results.push(mode);

    match check_tool_names(&settings.agent.tools) {
        Ok(()) => results.push(CheckResult::ok(
            "Tools",
            &format!("{} (max {} steps)", settings.agent.tools.join(", "), settings.agent.max_steps),
        )),
        Err(e) => results.push(CheckResult::error(
            "Tools",
            &e.to_string(),
            "Edit [agent] tools in the config file",
        )),
    }

    match settings.site.homepage_id {
        Some(id) => results.push(CheckResult::ok("Homepage ID", &id.to_string())),
        None => results.push(CheckResult::warning(
            "Homepage ID",
            "not set (update-homepage disabled)",
            "Set with: quill config set site.homepage_id <page id>",
        )),
    }

    results
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: quill init (or quill config edit)",
        )
    }
}

/// Check the data directory.
fn check_data_dir(settings: &Settings) -> CheckResult {
    let data_dir = settings.data_dir();
    if data_dir.exists() {
        CheckResult::ok("Data directory", &format!("{}", data_dir.display()))
    } else {
        CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first use",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_unknown_tool_is_error() {
        let mut settings = Settings::default();
        settings.agent.tools = vec!["create_page".to_string(), "delete_site".to_string()];
        let results = check_agent(&settings);
        assert_eq!(results[1].status, CheckStatus::Error);
    }

    #[test]
    fn test_missing_homepage_is_warning() {
        let settings = Settings::default();
        let results = check_agent(&settings);
        assert_eq!(results[2].status, CheckStatus::Warning);
    }

    #[test]
    fn test_invalid_base_url() {
        let mut settings = Settings::default();
        settings.backend.base_url = "not a url".to_string();
        assert_eq!(check_backend(&settings)[0].status, CheckStatus::Error);
    }
}
