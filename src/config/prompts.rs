//! Prompt templates for Quill.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub generation: GenerationPrompts,
    pub seo: SeoPrompts,
    /// Instructions handed to the tool agent.
    pub agent: AgentPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for page content generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationPrompts {
    pub system: String,
    pub user: String,
}

impl Default for GenerationPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an experienced content writer for {{site_name}}, a {{industry}} website.
You write accurate, well-structured web pages that read naturally and convert visitors into clients.
Return only the page body as HTML, without <html>, <head> or <body> tags and without Markdown fences."#
                .to_string(),

            user: r#"Generate SEO-optimized content about {{topic}} for a {{industry}} website ({{site_name}}).

Requirements:
- Include practical tips and actionable advice
- Optimize for the {{market}} {{industry}} context
- Include relevant keywords naturally
- Make it engaging and professional
- Target length: 800-1200 words
- Include headings and subheadings
- Add a call-to-action for {{industry}} services

Format the content in HTML with proper tags."#
                .to_string(),
        }
    }
}

/// Prompts for SEO optimization of existing content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoPrompts {
    pub system: String,
    pub user: String,
}

impl Default for SeoPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an SEO specialist for {{site_name}}, a {{industry}} website.
Preserve the meaning and facts of the content you are given. Return only HTML, without Markdown fences."#
                .to_string(),

            user: r#"Optimize this content for SEO for a {{industry}} website:

{{content}}

Requirements:
- Add relevant {{industry}} keywords naturally
- Improve meta descriptions
- Optimize headings structure
- Add internal linking suggestions
- Ensure mobile-friendly formatting

Return the optimized content in HTML format."#
                .to_string(),
        }
    }
}

/// Natural-language instructions for the tool agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    /// System prompt for the local tool-calling agent.
    pub system: String,
    pub create_page: String,
    pub find_homepage: String,
    pub update_homepage: String,
    pub page_count: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a content management assistant for {{site_name}}.

You operate the site's CMS through tools. Think about which calls the instruction needs, then make them.

Guidelines:
- Use 'get_pages' to look up existing pages before changing them when you need IDs or counts
- Use 'create_page' to publish new pages; keep the HTML content exactly as given
- Use 'update_page' to change an existing page by its numeric ID
- Use 'upload_media' only for files the instruction names explicitly
- Never delete or unpublish content

When the instruction is complete, reply with a short summary of what changed, including page IDs."#
                .to_string(),
            create_page: "Create a new page titled '{{title}}' with the following content: {{content}}"
                .to_string(),
            find_homepage: "Get all pages and find the homepage (page_id={{page_id}})".to_string(),
            update_homepage: "Update page with ID {{page_id}} with new content: {{content}}"
                .to_string(),
            page_count: "Get count of all pages".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let generation_path = custom_path.join("generation.toml");
            if generation_path.exists() {
                let content = std::fs::read_to_string(&generation_path)?;
                prompts.generation = toml::from_str(&content)?;
            }

            let seo_path = custom_path.join("seo.toml");
            if seo_path.exists() {
                let content = std::fs::read_to_string(&seo_path)?;
                prompts.seo = toml::from_str(&content)?;
            }

            let agent_path = custom_path.join("agent.toml");
            if agent_path.exists() {
                let content = std::fs::read_to_string(&agent_path)?;
                prompts.agent = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is single-pass: placeholders that appear inside substituted
    /// values are left untouched.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let key = &after[..end];
                    match vars.get(key.trim()) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(key);
                            result.push_str("}}");
                        }
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        result.push_str(rest);

        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
