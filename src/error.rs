use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolaceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Rerank error: {0}")]
    Rerank(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Classification error: {0}")]
    Classification(String),

    #[error("Escalation unavailable: {0}")]
    EscalationUnavailable(String),

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM rate limit exceeded, retry after {retry_after:?} seconds")]
    LlmRateLimit { retry_after: Option<u64> },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SolaceError>;
