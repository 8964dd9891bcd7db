//! Decision oracle.
//!
//! Every relevance judgment of the retrieval pipeline is delegated to a
//! [`DecisionOracle`]. The shipped implementation, [`LlmOracle`], phrases
//! each decision as a prompt for a [`ChatModel`] and re-asks with a
//! diagnostic until the reply is well-formed and passes the caller's check.
//! When the rounds run out, each call returns its benign default.

pub mod answer;
pub mod error;
pub mod llm;
pub mod model;
pub mod openai;
pub mod prompts;
pub mod rounds;

pub use answer::{
    Check, ChooseAnswer, Decision, FileNamesAnswer, JudgeAnswer, NextFileAnswer, ScoreAnswer, SnippetAnswer,
    Violation, accept_any,
};
pub use error::{OracleError, OracleResult};
pub use llm::LlmOracle;
pub use model::{ChatMessage, ChatModel, Role};
pub use openai::{OpenAiChatModel, OpenAiOptions};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::OracleConfig;
use crate::types::SnippetRange;

/// Input of one snippet-finding request.
#[derive(Debug, Clone, Copy)]
pub struct SnippetRequest<'a> {
    pub query: &'a str,
    pub file: &'a str,
    /// Preview with the accepted line ranges hidden
    pub preview: &'a str,
    pub accepted: &'a [(usize, usize)],
}

/// Relevance decisions the retrieval pipeline cannot make on its own.
///
/// Calls block and may run on several worker threads at once.
pub trait DecisionOracle: Send + Sync {
    /// File names mentioned in the query; empty by default.
    fn extract_file_names(&self, query: &str) -> Decision<Vec<String>>;

    /// Certainly relevant files among `candidates`; empty by default.
    fn choose_files(&self, query: &str, candidates: &[String], check: Check<'_, ChooseAnswer>) -> Decision<Vec<String>>;

    /// One more relevant file from the rendered `tree`, or `None` when done.
    fn next_file(
        &self,
        query: &str,
        tree: &str,
        found: &[String],
        check: Check<'_, NextFileAnswer>,
    ) -> Decision<Option<String>>;

    /// Relevance score in `0..=3` of a file judged by its preview; 0 by default.
    fn score_preview(
        &self,
        query: &str,
        file: &str,
        preview: &str,
        others: &[String],
        check: Check<'_, ScoreAnswer>,
    ) -> Decision<u8>;

    /// Relevance score in `0..=3` of a snippet; 0 by default.
    fn score_snippet(&self, query: &str, snippet: &SnippetRange, content: &str) -> Decision<u8>;

    /// Whether a snippet is relevant; not relevant by default.
    fn judge_snippet(&self, query: &str, snippet: &SnippetRange, content: &str) -> Decision<bool>;

    /// Next relevant line range of a file, or `None` when done.
    fn next_snippet(
        &self,
        request: &SnippetRequest<'_>,
        check: Check<'_, SnippetAnswer>,
    ) -> Decision<Option<(usize, usize)>>;
}

/// Chat backends selectable as `<provider>:<model>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Ollama,
}

impl Provider {
    fn default_base_url(self) -> &'static str {
        match self {
            Provider::OpenAi => openai::OPENAI_BASE_URL,
            Provider::Ollama => openai::OLLAMA_BASE_URL,
        }
    }

    fn requires_api_key(self) -> bool {
        matches!(self, Provider::OpenAi)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => f.write_str("openai"),
            Provider::Ollama => f.write_str("ollama"),
        }
    }
}

impl FromStr for Provider {
    type Err = OracleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Provider::OpenAi),
            "ollama" => Ok(Provider::Ollama),
            other => Err(OracleError::UnknownBackend(other.to_string())),
        }
    }
}

/// Split `provider:model`; the model part may itself contain `:`.
pub fn parse_backend(spec: &str) -> OracleResult<(Provider, String)> {
    let (provider, model) = spec
        .split_once(':')
        .filter(|(_, model)| !model.is_empty())
        .ok_or_else(|| OracleError::UnknownBackend(spec.to_string()))?;
    Ok((provider.parse()?, model.to_string()))
}

/// Create the chat backend selected by configuration.
pub fn create_chat_model(config: &OracleConfig) -> OracleResult<Arc<dyn ChatModel>> {
    let (provider, model) = parse_backend(&config.model)?;
    let api_key = std::env::var(&config.api_key_env).ok().filter(|key| !key.is_empty());
    if provider.requires_api_key() && api_key.is_none() && config.base_url.is_none() {
        return Err(OracleError::MissingApiKey(config.api_key_env.clone()));
    }

    tracing::debug!(target: "oracle", "using chat backend {provider}:{model}");
    let chat = OpenAiChatModel::new(OpenAiOptions {
        label: format!("{provider}:{model}"),
        base_url: config
            .base_url
            .clone()
            .unwrap_or_else(|| provider.default_base_url().to_string()),
        model,
        api_key,
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        timeout: Duration::from_secs(config.timeout_secs),
    })?;
    Ok(Arc::new(chat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend() {
        assert_eq!(
            parse_backend("openai:gpt-4o").unwrap(),
            (Provider::OpenAi, "gpt-4o".to_string())
        );
        assert_eq!(
            parse_backend("ollama:qwen2:0.5b-instruct").unwrap(),
            (Provider::Ollama, "qwen2:0.5b-instruct".to_string())
        );
        assert!(matches!(parse_backend("gpt-4o"), Err(OracleError::UnknownBackend(_))));
        assert!(matches!(parse_backend("claude:x"), Err(OracleError::UnknownBackend(_))));
        assert!(matches!(parse_backend("openai:"), Err(OracleError::UnknownBackend(_))));
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let config = OracleConfig {
            model: "ollama:qwen2".to_string(),
            api_key_env: "CR_TEST_UNSET_KEY".to_string(),
            ..OracleConfig::default()
        };
        let model = create_chat_model(&config).unwrap();
        assert_eq!(model.name(), "ollama:qwen2");
    }

    #[test]
    fn test_openai_requires_key() {
        let config = OracleConfig {
            api_key_env: "CR_TEST_UNSET_KEY".to_string(),
            ..OracleConfig::default()
        };
        assert!(matches!(
            create_chat_model(&config),
            Err(OracleError::MissingApiKey(_))
        ));
    }
}
