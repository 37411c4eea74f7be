use thiserror::Error;

/// Fatal errors surfaced by an import call.
///
/// Fetch and parse failures inside individual extraction techniques are never
/// represented here: each technique catches its own failure and the extractor
/// moves on to the next fallback. Only the outermost import call returns one
/// of these.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The source was classified but no extraction path produced any usable
    /// content (or the model returned a recipe without a title).
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    /// Remote media reported a size above the staging cap. Surfaced before
    /// any download is attempted.
    #[error("Media too large: {size} bytes exceeds the {limit} byte cap")]
    OversizedMedia { size: u64, limit: u64 },

    /// The model payload carried an explicit error marker.
    #[error("Model declined extraction: {0}")]
    ModelDeclined(String),

    /// No JSON object could be recovered from the model response.
    #[error("Failed to parse model response: {0}")]
    ResponseParse(String),

    /// An HTTP request on the fatal path failed: the understanding call
    /// itself, or staging a file-like source that has no fallback. Extractor
    /// sub-fetches never produce this; they degrade.
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Local file I/O error (reading photos, writing staged media)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid call (empty photo list, missing API key, ...)
    #[error("Invalid import request: {0}")]
    InvalidRequest(String),
}
