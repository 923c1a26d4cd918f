//! Configuration module for Quill.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, GenerationPrompts, Prompts, SeoPrompts};
pub use settings::{
    AgentMode, AgentSettings, BackendSettings, GeneralSettings, LlmSettings, MetricsSettings,
    PreviewSettings, PromptSettings, ServerSettings, Settings, SiteSettings,
};
