//! Source error types.

/// Errors that can occur while reading connections or distances.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the server
    #[error("rate limited by connections server")]
    RateLimited,

    /// Failed to parse response or file JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Failed to read a file
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Dataset contents are unusable
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    /// A URL could not be built
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The scan window can't be expressed to the source
    #[error("invalid scan window: {0}")]
    InvalidWindow(String),
}
