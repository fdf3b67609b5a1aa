//! Error types for the card renderer

use std::fmt;
use thiserror::Error;

/// Result type alias for renderer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stage of the render pipeline that produced a `RenderError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    /// Merged options were unusable (e.g. a zero dimension)
    Options,
    /// Markup could not be turned into an element tree
    Parse,
    /// The layout engine failed to produce vector markup
    Layout,
    /// The rasterizer failed to produce a pixel buffer
    Rasterize,
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RenderStage::Options => "options",
            RenderStage::Parse => "parse",
            RenderStage::Layout => "layout",
            RenderStage::Rasterize => "rasterize",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while parsing, rendering or delivering cards
#[derive(Error, Debug)]
pub enum Error {
    /// Markup violates the root-must-be-div rule
    #[error("Invalid HTML: {0}")]
    ParseError(String),

    /// Caller asked for a buffer but got vector markup, or the reverse
    #[error("Format mismatch: {0}")]
    FormatError(String),

    /// Any failure inside `Canvas::render`
    #[error("Failed to render HTML: {message}")]
    RenderError { stage: RenderStage, message: String },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// An attachment adapter could not deliver the image
    #[error("Attachment delivery failed: {0}")]
    DeliveryError(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap any failure raised inside the render path.
    pub(crate) fn render(stage: RenderStage, err: impl fmt::Display) -> Self {
        Error::RenderError {
            stage,
            message: err.to_string(),
        }
    }

    /// Machine-readable code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            Error::ParseError(_) => "PARSE_ERROR",
            Error::FormatError(_) => "FORMAT_ERROR",
            Error::RenderError { .. } => "RENDER_ERROR",
            Error::ConfigError(_) => "CONFIG_ERROR",
            Error::DeliveryError(_) => "DELIVERY_ERROR",
            Error::Io(_) => "IO_ERROR",
        }
    }

    /// The pipeline stage, for render errors.
    pub fn stage(&self) -> Option<RenderStage> {
        match self {
            Error::RenderError { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
