//! Render orchestration: markup -> element tree -> SVG -> PNG.

use log::{debug, warn};

use crate::markup::{self, ElementNode};
use crate::rendering::{BlockLayout, LayoutEngine, Rasterizer, RenderOutput};
use crate::{Error, FontEntry, FontRegistry, OutputFormat, RenderOptions, RenderRequest, RenderStage, Result};

/// A renderer instance: default options, a font registry and the two
/// pipeline backends.
///
/// `render` takes `&self`, so one canvas can serve concurrent renders. The
/// registry is locked while a render snapshots it.
pub struct Canvas {
    defaults: RenderOptions,
    fonts: FontRegistry,
    layout: Box<dyn LayoutEngine>,
    rasterizer: Box<dyn Rasterizer>,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("defaults", &self.defaults)
            .field("fonts", &self.fonts.len())
            .finish_non_exhaustive()
    }
}

impl Canvas {
    /// Canvas with the built-in block layout and the default rasterizer.
    pub fn new(defaults: RenderOptions) -> Result<Self> {
        defaults.validate()?;
        Ok(Self::with_backends(defaults, BlockLayout::default(), default_rasterizer()))
    }

    /// Canvas with caller-supplied layout engine and rasterizer.
    pub fn with_backends(
        defaults: RenderOptions,
        layout: impl LayoutEngine + 'static,
        rasterizer: impl Rasterizer + 'static,
    ) -> Self {
        Self {
            defaults,
            fonts: FontRegistry::new(),
            layout: Box::new(layout),
            rasterizer: Box::new(rasterizer),
        }
    }

    pub fn defaults(&self) -> &RenderOptions {
        &self.defaults
    }

    /// Merge `options` into the defaults used by later renders.
    pub fn set_default_options(&mut self, options: &RenderRequest) {
        self.defaults = self.defaults.merge(options);
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    /// Cache a font for every later render on this canvas.
    pub fn load_font(&self, font: FontEntry) {
        self.fonts.register(font);
    }

    pub fn clear_font_cache(&self) {
        self.fonts.clear();
    }

    /// Render `markup` to PNG bytes or SVG markup.
    ///
    /// Every failure is reported as [`Error::RenderError`]; parse errors and
    /// backend errors never escape unwrapped.
    pub fn render(&self, markup: &str, request: &RenderRequest) -> Result<RenderOutput> {
        let options = self.defaults.merge(request);
        options
            .validate()
            .map_err(|e| fail(RenderStage::Options, e))?;

        let mut tree = markup::parse(markup).map_err(|e| fail(RenderStage::Parse, e))?;
        apply_root_defaults(&mut tree, &options);
        debug!("parsed markup into {} top-level children", tree.children().len());

        let fonts = self.fonts.merged_font_list(&options.fonts);
        let svg = self
            .layout
            .layout(&tree, options.width, options.height, &fonts)
            .map_err(|e| fail(RenderStage::Layout, format!("{:#}", e)))?;
        debug!("layout produced {} bytes of SVG", svg.len());

        if options.format == OutputFormat::Svg {
            return Ok(RenderOutput::Svg(svg));
        }

        let png = self
            .rasterizer
            .rasterize(&svg, &fonts)
            .map_err(|e| fail(RenderStage::Rasterize, format!("{:#}", e)))?;
        debug!("rasterized {}x{} card into {} PNG bytes", options.width, options.height, png.len());
        Ok(RenderOutput::Png(png))
    }

    /// Render and require PNG output.
    pub fn render_png(&self, markup: &str, request: &RenderRequest) -> Result<Vec<u8>> {
        self.render(markup, request)?.into_png()
    }

    /// Render and require SVG output.
    pub fn render_svg(&self, markup: &str, request: &RenderRequest) -> Result<String> {
        self.render(markup, request)?.into_svg()
    }
}

fn fail(stage: RenderStage, err: impl std::fmt::Display) -> Error {
    let err = Error::render(stage, err);
    warn!("{} stage failed: {}", stage, err);
    err
}

/// Insert the configured background and font family on the root unless the
/// markup already styles them.
fn apply_root_defaults(tree: &mut ElementNode, options: &RenderOptions) {
    if let ElementNode::Element { attributes, .. } = tree {
        let style = &mut attributes.style;
        if !style.contains_key("background") && !style.contains_key("backgroundColor") {
            style.insert("backgroundColor".into(), options.background_color.clone());
        }
        if let Some(family) = &options.default_font_family {
            style
                .entry("fontFamily".into())
                .or_insert_with(|| family.clone());
        }
    }
}

#[cfg(feature = "raster")]
fn default_rasterizer() -> crate::rendering::ResvgRasterizer {
    crate::rendering::ResvgRasterizer::new()
}

#[cfg(not(feature = "raster"))]
fn default_rasterizer() -> crate::rendering::UnsupportedRasterizer {
    crate::rendering::UnsupportedRasterizer
}

/// One-shot render with a fresh canvas; fails with `FormatError` when the
/// request asks for SVG.
pub fn render_html_to_buffer(markup: &str, request: &RenderRequest) -> Result<Vec<u8>> {
    let canvas = Canvas::with_backends(RenderOptions::default(), BlockLayout::default(), default_rasterizer());
    match canvas.render(markup, request)? {
        RenderOutput::Png(data) => Ok(data),
        RenderOutput::Svg(_) => Err(Error::FormatError(
            "Expected buffer output but got SVG".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::UnsupportedRasterizer;

    fn svg_canvas() -> Canvas {
        Canvas::with_backends(RenderOptions::default(), BlockLayout::default(), UnsupportedRasterizer)
    }

    fn svg_request() -> RenderRequest {
        RenderRequest {
            format: Some(OutputFormat::Svg),
            ..Default::default()
        }
    }

    #[test]
    fn background_default_is_applied() {
        let mut tree = markup::parse("<div>x</div>").unwrap();
        apply_root_defaults(&mut tree, &RenderOptions::default());
        assert_eq!(tree.style().unwrap()["backgroundColor"], "#ffffff");
    }

    #[test]
    fn markup_background_wins() {
        let mut tree = markup::parse(r#"<div style="background: #000">x</div>"#).unwrap();
        let opts = RenderOptions {
            default_font_family: Some("Inter".into()),
            ..Default::default()
        };
        apply_root_defaults(&mut tree, &opts);
        let style = tree.style().unwrap();
        assert!(!style.contains_key("backgroundColor"));
        assert_eq!(style["fontFamily"], "Inter");
    }

    #[test]
    fn svg_render_contains_text() {
        let svg = svg_canvas()
            .render_svg("<div><h1>Hello</h1></div>", &svg_request())
            .unwrap();
        assert!(svg.contains(">Hello</text>"));
        assert!(svg.contains(r##"fill="#ffffff""##));
    }

    #[test]
    fn parse_failure_is_render_error() {
        let err = svg_canvas()
            .render("<span>no div</span>", &svg_request())
            .unwrap_err();
        assert_eq!(err.code(), "RENDER_ERROR");
        assert_eq!(err.stage(), Some(RenderStage::Parse));
        assert!(err.to_string().contains("root element must be div"));
    }

    #[test]
    fn zero_width_is_render_error() {
        let req = RenderRequest {
            width: Some(0),
            ..svg_request()
        };
        let err = svg_canvas().render("<div>x</div>", &req).unwrap_err();
        assert_eq!(err.stage(), Some(RenderStage::Options));
    }

    #[test]
    fn png_without_rasterizer_is_render_error() {
        let err = svg_canvas()
            .render("<div>x</div>", &RenderRequest::default())
            .unwrap_err();
        assert_eq!(err.stage(), Some(RenderStage::Rasterize));
    }

    #[test]
    fn set_default_options_merges() {
        let mut canvas = svg_canvas();
        canvas.set_default_options(&RenderRequest {
            width: Some(320),
            ..Default::default()
        });
        assert_eq!(canvas.defaults().width, 320);
        assert_eq!(canvas.defaults().height, 400);
    }

    #[test]
    fn render_html_to_buffer_rejects_svg() {
        let err = render_html_to_buffer("<div>x</div>", &svg_request()).unwrap_err();
        assert_eq!(err.code(), "FORMAT_ERROR");
    }
}
