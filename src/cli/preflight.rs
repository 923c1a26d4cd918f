//! Pre-flight checks before operations that call out to services.
//!
//! Validates the API key and backend credentials up front so a run does not
//! fail midway, after content has already been generated.

use crate::backend::BackendCredentials;
use crate::config::{AgentMode, Settings};
use crate::error::{QuillError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Generation requires the API key.
    Generate,
    /// Publishing requires the API key, and backend credentials when the agent runs locally.
    Publish,
    /// Status asks the agent, so it needs the agent's requirements.
    Status,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Generate => check_api_key(),
        Operation::Publish | Operation::Status => {
            match settings.agent.mode {
                AgentMode::Local => {
                    check_api_key()?;
                    check_backend_credentials(settings)?;
                }
                AgentMode::Remote | AgentMode::Echo => {
                    if matches!(operation, Operation::Publish) {
                        check_api_key()?;
                    }
                }
            }
            Ok(())
        }
    }
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(QuillError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(QuillError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check that backend credentials resolve from settings or the environment.
fn check_backend_credentials(settings: &Settings) -> Result<()> {
    BackendCredentials::from_settings(&settings.backend)
        .map(|_| ())
        .ok_or_else(|| {
            QuillError::Config(
                "Backend credentials missing. Set [backend] username/password \
                 or CMS_USERNAME and CMS_PASSWORD"
                    .to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_status_has_no_requirements() {
        let mut settings = Settings::default();
        settings.agent.mode = AgentMode::Echo;
        assert!(check(Operation::Status, &settings).is_ok());
    }

    #[test]
    fn test_backend_credentials_from_settings() {
        let mut settings = Settings::default();
        settings.backend.username = Some("editor".to_string());
        settings.backend.password = Some("s3cret".to_string());
        assert!(check_backend_credentials(&settings).is_ok());
    }
}
