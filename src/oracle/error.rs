use thiserror::Error;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Chat backend request failed: {0}")]
    Transport(String),

    #[error("Response is not a valid JSON object: {0}")]
    MalformedAnswer(String),

    #[error("Response violates the JSON format: {0}")]
    SchemaViolation(String),

    #[error("Response rejected: {0}")]
    SemanticViolation(String),

    #[error("No valid answer after {0} rounds")]
    RoundLimitExceeded(usize),

    #[error("Environment variable {0} holding the API key is not set")]
    MissingApiKey(String),

    #[error("Unknown chat backend '{0}'. Expected <provider>:<model> with provider openai or ollama")]
    UnknownBackend(String),
}

pub type OracleResult<T> = Result<T, OracleError>;
