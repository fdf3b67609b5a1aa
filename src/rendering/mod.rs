//! Layout and raster boundaries of the render pipeline.
//!
//! Both stages are pluggable. The crate ships a small block layout engine
//! and, with the `raster` feature, a `resvg`-backed rasterizer.

pub mod layout;
pub mod paint;
pub mod raster;

use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::{ElementNode, Error, FontEntry, OutputFormat, Result};

pub use layout::BlockLayout;
#[cfg(feature = "raster")]
pub use raster::ResvgRasterizer;
pub use raster::UnsupportedRasterizer;

/// Turns an element tree into vector (SVG) markup.
pub trait LayoutEngine: Send + Sync {
    fn layout(
        &self,
        tree: &ElementNode,
        width: u32,
        height: u32,
        fonts: &[FontEntry],
    ) -> anyhow::Result<String>;
}

/// Turns vector markup into PNG-encoded bytes.
///
/// `fonts` is the same merged list the layout engine saw, for rasterizers
/// that draw text themselves.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, svg: &str, fonts: &[FontEntry]) -> anyhow::Result<Vec<u8>>;
}

/// Result of a render: PNG bytes or SVG markup.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutput {
    Png(Vec<u8>),
    Svg(String),
}

impl RenderOutput {
    pub fn format(&self) -> OutputFormat {
        match self {
            RenderOutput::Png(_) => OutputFormat::Png,
            RenderOutput::Svg(_) => OutputFormat::Svg,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RenderOutput::Png(data) => data,
            RenderOutput::Svg(svg) => svg.as_bytes(),
        }
    }

    pub fn into_png(self) -> Result<Vec<u8>> {
        match self {
            RenderOutput::Png(data) => Ok(data),
            RenderOutput::Svg(_) => Err(Error::FormatError(
                "Expected buffer output but got SVG".into(),
            )),
        }
    }

    pub fn into_svg(self) -> Result<String> {
        match self {
            RenderOutput::Svg(svg) => Ok(svg),
            RenderOutput::Png(_) => Err(Error::FormatError(
                "Expected SVG output but got a PNG buffer".into(),
            )),
        }
    }

    /// Hex SHA-256 of the output bytes.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.as_bytes()))
    }

    pub fn to_data_uri(&self) -> String {
        let mime = match self {
            RenderOutput::Png(_) => "image/png",
            RenderOutput::Svg(_) => "image/svg+xml",
        };
        let b64 = base64::engine::general_purpose::STANDARD.encode(self.as_bytes());
        format!("data:{};base64,{}", mime, b64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_mismatch_is_format_error() {
        let out = RenderOutput::Svg("<svg/>".into());
        assert_eq!(out.format(), OutputFormat::Svg);
        let err = out.into_png().unwrap_err();
        assert_eq!(err.code(), "FORMAT_ERROR");

        let err = RenderOutput::Png(vec![1]).into_svg().unwrap_err();
        assert!(matches!(err, Error::FormatError(_)));
    }

    #[test]
    fn data_uri_and_digest() {
        let out = RenderOutput::Svg("abc".into());
        assert_eq!(out.to_data_uri(), "data:image/svg+xml;base64,YWJj");
        assert_eq!(
            out.digest(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
