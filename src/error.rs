// Library error type shared by the catalog, image and Discord layers.

use std::path::PathBuf;

/// Errors that can occur while fetching the catalog or talking to Discord.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Discord returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Still rate limited after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },

    #[error("Failed to read {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No image files found in {0}")]
    NoImages(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Bot token contains characters not allowed in a header")]
    InvalidToken,

    #[error("Catalog error: {0}")]
    Catalog(String),
}
