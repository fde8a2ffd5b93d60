use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("bot challenge page served by {url}")]
    BotChallenge { url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid header value for {name}: {reason}")]
    InvalidHeader { name: &'static str, reason: String },

    #[error("invalid link pattern for {source_name}: {reason}")]
    InvalidPattern { source_name: String, reason: String },

    #[error("source {source_name} timed out after {timeout_secs}s")]
    SourceTimeout {
        source_name: String,
        timeout_secs: u64,
    },

    #[error("source {source_name} panicked: {message}")]
    SourcePanicked {
        source_name: String,
        message: String,
    },
}
