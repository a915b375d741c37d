use thiserror::Error;

/// Errors returned by the chat-completion client.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Network or TLS failure, or a non-2xx HTTP status from the provider.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the request for quota or billing reasons
    /// (HTTP 429 / 402). Never retried — the quota will not recover within
    /// a run.
    #[error("LLM quota exhausted: {0}")]
    QuotaExceeded(String),

    /// The provider answered with an application-level error.
    #[error("LLM API error: {0}")]
    ApiError(String),

    /// The response body could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
