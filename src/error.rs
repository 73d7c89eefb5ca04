// Error taxonomy
// Every failure here is non-fatal for the user: callers log it and do nothing.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Focus is not inside a recognized compose body
    #[error("not in a recognized compose area")]
    NoTarget,

    /// No range, or an empty/collapsed range where one is required
    #[error("no usable selection: {0}")]
    NoSelection(&'static str),

    /// The selection produced no style information or no word/space tokens
    #[error("selection yielded nothing to copy")]
    EmptyExtraction,

    /// The page invocation or message round-trip failed
    #[error("transport failure: {0}")]
    Transport(String),

    /// Paste requested before anything was copied
    #[error("no style found in storage to paste")]
    StoreMiss,

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("markup error: {0}")]
    Markup(String),
}
