//! Configuration settings for Quill.

use crate::error::{QuillError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub agent: AgentSettings,
    pub backend: BackendSettings,
    pub site: SiteSettings,
    pub server: ServerSettings,
    pub preview: PreviewSettings,
    pub metrics: MetricsSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.quill".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Language model settings used by the content generator and SEO optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Chat model used for generation and optimization.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.7,
        }
    }
}

/// How instructions are delegated to a tool agent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    /// In-process tool-calling loop against the backend gateway.
    #[default]
    Local,
    /// External agent process reached over HTTP.
    Remote,
    /// Echo the instruction back without touching the backend.
    Echo,
}

impl std::str::FromStr for AgentMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(AgentMode::Local),
            "remote" => Ok(AgentMode::Remote),
            "echo" | "dry-run" => Ok(AgentMode::Echo),
            _ => Err(format!("Unknown agent mode: {}", s)),
        }
    }
}

impl std::fmt::Display for AgentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentMode::Local => write!(f, "local"),
            AgentMode::Remote => write!(f, "remote"),
            AgentMode::Echo => write!(f, "echo"),
        }
    }
}

/// Tool agent bridge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Which bridge implementation to use.
    pub mode: AgentMode,
    /// Endpoint of the remote agent (remote mode only).
    pub endpoint: String,
    /// Tools the agent may use, in the order they are advertised.
    pub tools: Vec<String>,
    /// Maximum number of reasoning/tool-call steps per instruction.
    pub max_steps: usize,
    /// Model driving the local tool-calling loop.
    pub model: String,
    /// Request timeout for the remote agent, in seconds.
    pub timeout_seconds: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            mode: AgentMode::Local,
            endpoint: "http://localhost:8000/agent".to_string(),
            tools: vec![
                "create_page".to_string(),
                "update_page".to_string(),
                "upload_media".to_string(),
                "get_pages".to_string(),
            ],
            max_steps: 10,
            model: "gpt-4o".to_string(),
            timeout_seconds: 600,
        }
    }
}

/// Remote CMS REST API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Base URL of the REST API (e.g. `https://example.com/wp-json/wp/v2`).
    pub base_url: String,
    /// API username. Falls back to `CMS_USERNAME`.
    pub username: Option<String>,
    /// API (application) password. Falls back to `CMS_PASSWORD`.
    pub password: Option<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.tax4us.co.il/wp-json/wp/v2".to_string(),
            username: None,
            password: None,
            timeout_seconds: 60,
        }
    }
}

/// Site-specific identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct SiteSettings {
    /// Page ID of the site's homepage, used by the homepage update.
    pub homepage_id: Option<u64>,
}

/// HTTP API server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Largest request body accepted by `/media`, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_upload_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Local static preview server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    /// Directory to serve.
    pub directory: String,
    /// First port to try.
    pub start_port: u16,
    /// How many consecutive ports to try before giving up.
    pub max_attempts: u16,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            directory: "public".to_string(),
            start_port: 3000,
            max_attempts: 100,
        }
    }
}

/// Metrics store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Metrics provider (sqlite, memory).
    pub provider: String,
    /// Path to the SQLite database (sqlite provider).
    pub sqlite_path: String,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.quill/metrics.db".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

impl Default for PromptSettings {
    fn default() -> Self {
        let mut variables = HashMap::new();
        variables.insert("site_name".to_string(), "tax4us.co.il".to_string());
        variables.insert("industry".to_string(), "tax consulting".to_string());
        variables.insert("market".to_string(), "Israeli".to_string());
        Self {
            custom_dir: None,
            variables,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| QuillError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Return a copy of these settings with a dotted key (e.g. `llm.model`) set to `value`.
    ///
    /// The value is parsed as a TOML scalar when possible and kept as a string otherwise.
    pub fn with_value(&self, key: &str, value: &str) -> Result<Self> {
        let mut root = toml::Value::try_from(self).map_err(|e| QuillError::Config(e.to_string()))?;

        let parts: Vec<&str> = key.split('.').collect();
        let (last, parents) = parts
            .split_last()
            .ok_or_else(|| QuillError::Config("Empty configuration key".to_string()))?;

        let mut table = root
            .as_table_mut()
            .ok_or_else(|| QuillError::Config("Settings are not a table".to_string()))?;
        for part in parents {
            table = table
                .get_mut(*part)
                .and_then(|v| v.as_table_mut())
                .ok_or_else(|| QuillError::Config(format!("Unknown configuration section: {}", part)))?;
        }

        let mismatch = |expected: &str| {
            QuillError::Config(format!("{} expects a {}, got '{}'", key, expected, value))
        };
        let parsed = match table.get(*last) {
            Some(existing) if existing.is_str() => toml::Value::String(value.to_string()),
            Some(existing) if existing.is_float() => value
                .parse::<f64>()
                .map(toml::Value::Float)
                .map_err(|_| mismatch("float"))?,
            Some(existing) => {
                let parsed = parse_scalar(value);
                if parsed.type_str() != existing.type_str() {
                    return Err(mismatch(existing.type_str()));
                }
                parsed
            }
            None => parse_scalar(value),
        };
        table.insert(last.to_string(), parsed);

        let settings: Settings = root.try_into()?;
        Ok(settings)
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quill")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded metrics database path.
    pub fn metrics_path(&self) -> PathBuf {
        Self::expand_path(&self.metrics.sqlite_path)
    }

    /// Get the expanded preview directory path.
    pub fn preview_dir(&self) -> PathBuf {
        Self::expand_path(&self.preview.directory)
    }
}

fn parse_scalar(value: &str) -> toml::Value {
    if let Ok(b) = value.parse::<bool>() {
        toml::Value::Boolean(b)
    } else if let Ok(i) = value.parse::<i64>() {
        toml::Value::Integer(i)
    } else if let Ok(f) = value.parse::<f64>() {
        toml::Value::Float(f)
    } else {
        toml::Value::String(value.to_string())
    }
}
