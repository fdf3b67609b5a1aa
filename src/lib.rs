//! cardcanvas
//!
//! Render a constrained subset of HTML/CSS into PNG or SVG images, sized for
//! the rank cards, welcome banners and level-up notices chat bots post.
//!
//! # Pipeline
//!
//! - **Markup**: `<div style="...">` documents are parsed into an element
//!   tree (whitelisted tags only, `style` as the only attribute)
//! - **Layout**: a [`LayoutEngine`] turns the tree into SVG markup
//! - **Raster**: a [`Rasterizer`] turns the SVG into PNG bytes
//! - **Delivery**: an [`AttachmentDelivery`] adapter posts the image
//!
//! # Example
//!
//! ```no_run
//! use cardcanvas::{Canvas, OutputFormat, RenderOptions, RenderRequest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let canvas = Canvas::new(RenderOptions::default())?;
//! let png = canvas.render(
//!     r#"<div style="background-color: #2c2f33; color: white"><h1>Level up!</h1></div>"#,
//!     &RenderRequest::default(),
//! )?;
//! std::fs::write("card.png", png.as_bytes())?;
//!
//! let svg = canvas.render(
//!     "<div><p>vector</p></div>",
//!     &RenderRequest { format: Some(OutputFormat::Svg), ..Default::default() },
//! )?;
//! println!("{}", svg.into_svg()?);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, RenderStage, Result};

pub mod markup;
pub use markup::{parse, parse_children, ElementNode, TagName, MAX_DEPTH};

pub mod fonts;
pub use fonts::{FontEntry, FontRegistry, FontStyle, FontWeight};

pub mod rendering;
pub use rendering::{LayoutEngine, Rasterizer, RenderOutput};

pub mod canvas;
pub use canvas::{render_html_to_buffer, Canvas};

// Async facade running renders on the blocking pool
pub mod async_api;
pub use async_api::AsyncCanvas;

pub mod delivery;
pub use delivery::{Attachment, AttachmentDelivery, InteractionHandle, MessageHandle};

pub mod templates;

/// Output encoding of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            other => Err(Error::ConfigError(format!(
                "unsupported output format '{}' (expected png or svg)",
                other
            ))),
        }
    }
}

/// Fully resolved render options
///
/// A [`Canvas`] keeps one of these as its defaults; every render merges the
/// call's [`RenderRequest`] over them.
///
/// # Examples
///
/// ```
/// let opts = cardcanvas::RenderOptions::default();
/// assert_eq!((opts.width, opts.height), (800, 400));
/// assert_eq!(opts.background_color, "#ffffff");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// CSS color painted behind the root element unless its style sets one
    pub background_color: String,
    /// Output encoding
    pub format: OutputFormat,
    /// Font family applied to the root element unless its style sets one
    pub default_font_family: Option<String>,
    /// Fonts used by every render; request fonts shadow them by family and
    /// weight. Font bytes are not read from configuration files.
    #[serde(skip)]
    pub fonts: Vec<FontEntry>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            background_color: "#ffffff".to_string(),
            format: OutputFormat::Png,
            default_font_family: None,
            fonts: Vec::new(),
        }
    }
}

impl RenderOptions {
    /// Apply every explicit value of `request` over `self`.
    pub fn merge(&self, request: &RenderRequest) -> RenderOptions {
        RenderOptions {
            width: request.width.unwrap_or(self.width),
            height: request.height.unwrap_or(self.height),
            background_color: request
                .background_color
                .clone()
                .unwrap_or_else(|| self.background_color.clone()),
            format: request.format.unwrap_or(self.format),
            default_font_family: request
                .default_font_family
                .clone()
                .or_else(|| self.default_font_family.clone()),
            fonts: {
                let mut list = request.fonts.clone();
                crate::fonts::append_unshadowed(&mut list, &self.fonts);
                list
            },
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::ConfigError(format!(
                "dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Per-call options; `None` falls back to the canvas defaults.
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Fonts for this call; they take precedence over registered fonts
    pub fonts: Vec<FontEntry>,
    pub background_color: Option<String>,
    pub format: Option<OutputFormat>,
    pub default_font_family: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = RenderOptions::default();
        assert_eq!(opts.width, 800);
        assert_eq!(opts.height, 400);
        assert_eq!(opts.format, OutputFormat::Png);
        assert!(opts.default_font_family.is_none());
    }

    #[test]
    fn request_values_win() {
        let req = RenderRequest {
            width: Some(934),
            format: Some(OutputFormat::Svg),
            background_color: Some("#000".into()),
            ..Default::default()
        };
        let merged = RenderOptions::default().merge(&req);
        assert_eq!(merged.width, 934);
        assert_eq!(merged.height, 400);
        assert_eq!(merged.format, OutputFormat::Svg);
        assert_eq!(merged.background_color, "#000");
    }

    #[test]
    fn request_fonts_shadow_default_fonts() {
        let defaults = RenderOptions {
            fonts: vec![
                FontEntry::new("Inter", vec![1u8]),
                FontEntry::new("Mono", vec![2u8]),
            ],
            ..Default::default()
        };
        let req = RenderRequest {
            fonts: vec![FontEntry::new("Inter", vec![9u8])],
            ..Default::default()
        };
        let merged = defaults.merge(&req);
        let faces: Vec<_> = merged.fonts.iter().map(|f| (f.family.as_str(), f.data[0])).collect();
        assert_eq!(faces, vec![("Inter", 9), ("Mono", 2)]);

        assert_eq!(defaults.merge(&RenderRequest::default()).fonts, defaults.fonts);
    }

    #[test]
    fn format_from_str_fails_fast() {
        assert_eq!("svg".parse::<OutputFormat>().unwrap(), OutputFormat::Svg);
        let err = "jpeg".parse::<OutputFormat>().unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: RenderOptions =
            serde_json::from_str(r##"{"width": 600, "backgroundColor": "#111", "format": "svg"}"##).unwrap();
        assert_eq!(opts.width, 600);
        assert_eq!(opts.height, 400);
        assert_eq!(opts.background_color, "#111");
        assert_eq!(opts.format, OutputFormat::Svg);
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let opts = RenderOptions { height: 0, ..Default::default() };
        assert!(opts.validate().is_err());
    }
}
