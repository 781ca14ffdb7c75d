use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::sync::Arc;
use log::info;

const DEFAULT_SYSTEM_PROMPT: &str = concat!(
    "You are a helpful wedding assistant. Your task is to provide accurate information about the wedding based on the search results provided to you. ",
    "Always prioritize information from the search results when answering questions. ",
    "If the search results don't contain the answer, politely say you don't have that specific information and offer to help with something else. ",
    "Keep your responses friendly, concise, and accurate. ",
    "Don't make up information that's not in the search results."
);

#[derive(Debug)]
pub enum PromptError {
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::IoError(e) => write!(f, "Prompt file IO error: {}", e),
            PromptError::JsonError(e) => write!(f, "Prompt JSON parsing error: {}", e),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PromptError::IoError(e) => Some(e),
            PromptError::JsonError(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(err: std::io::Error) -> Self {
        PromptError::IoError(err)
    }
}

impl From<serde_json::Error> for PromptError {
    fn from(err: serde_json::Error) -> Self {
        PromptError::JsonError(err)
    }
}

/// Fixed replies sent when a grounded answer cannot be produced.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct FallbackReplies {
    pub no_user_message: String,
    pub blank_message: String,
    pub empty_response: String,
    pub generation_failed: String,
}

impl Default for FallbackReplies {
    fn default() -> Self {
        Self {
            no_user_message: "I couldn't retrieve your last message. Could you please repeat it?".into(),
            blank_message: "Your last message was empty. Could you please ask again?".into(),
            empty_response: "I received an empty response. Could you try asking differently?".into(),
            generation_failed: "I'm having trouble generating a response right now. Please try again in a moment.".into(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PromptConfig {
    pub system_prompt: String,
    pub context_heading: String,
    pub replies: FallbackReplies,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            context_heading: "Relevant Information Found:".to_string(),
            replies: FallbackReplies::default(),
        }
    }
}

pub fn parse_prompts(content: &str) -> Result<PromptConfig, PromptError> {
    Ok(serde_json::from_str(content)?)
}

pub fn load_prompts(path: &str) -> Result<Arc<PromptConfig>, PromptError> {
    let file_content = fs::read_to_string(path)?;
    let config = parse_prompts(&file_content)?;
    info!("Loaded prompt configuration from: {}", path);
    Ok(Arc::new(config))
}

pub fn load_or_default(path: Option<&str>) -> Result<Arc<PromptConfig>, PromptError> {
    match path {
        Some(p) if !p.trim().is_empty() => load_prompts(p),
        _ => {
            info!("No prompts file configured, using built-in prompts.");
            Ok(Arc::new(PromptConfig::default()))
        }
    }
}

/// The system instruction: persona and grounding rules followed by the retrieved context.
pub fn get_system_message(config: &PromptConfig, context: &str) -> String {
    format!("{}\n\n{}\n{}", config.system_prompt, config.context_heading, context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_message_appends_context() {
        let config = PromptConfig {
            system_prompt: "Be helpful.".into(),
            ..PromptConfig::default()
        };
        assert_eq!(
            get_system_message(&config, "Title: Venue\n"),
            "Be helpful.\n\nRelevant Information Found:\nTitle: Venue\n"
        );
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = parse_prompts(r#"{"replies": {"blank_message": "Say again?"}}"#).unwrap();
        assert_eq!(config.replies.blank_message, "Say again?");
        assert_eq!(config.replies.no_user_message, FallbackReplies::default().no_user_message);
        assert!(config.system_prompt.starts_with("You are a helpful wedding assistant."));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(load_prompts("/nonexistent/prompts.json"), Err(PromptError::IoError(_))));
    }

    #[test]
    fn no_path_uses_defaults() {
        let config = load_or_default(None).unwrap();
        assert_eq!(config.context_heading, "Relevant Information Found:");
    }
}
