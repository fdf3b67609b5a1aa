//! SVG to PNG rasterization

use super::Rasterizer;
use crate::FontEntry;

/// `resvg`-backed rasterizer.
///
/// The system font database is scanned once, when the rasterizer is built.
/// Each call shares it and only copies it when that call brings its own
/// fonts, so text emitted by the layout engine resolves registered families.
#[cfg(feature = "raster")]
#[derive(Clone)]
pub struct ResvgRasterizer {
    fontdb: std::sync::Arc<resvg::usvg::fontdb::Database>,
}

#[cfg(feature = "raster")]
impl ResvgRasterizer {
    pub fn new() -> Self {
        let mut db = resvg::usvg::fontdb::Database::new();
        db.load_system_fonts();
        log::debug!("loaded {} system font faces", db.len());
        Self {
            fontdb: std::sync::Arc::new(db),
        }
    }

    /// Only use fonts passed to `rasterize`; output then does not depend on
    /// the host's installed fonts.
    pub fn without_system_fonts() -> Self {
        Self {
            fontdb: std::sync::Arc::new(resvg::usvg::fontdb::Database::new()),
        }
    }

    /// Faces in the shared base database.
    pub fn face_count(&self) -> usize {
        self.fontdb.len()
    }
}

#[cfg(feature = "raster")]
impl Default for ResvgRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "raster")]
impl std::fmt::Debug for ResvgRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResvgRasterizer")
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

#[cfg(feature = "raster")]
impl Rasterizer for ResvgRasterizer {
    fn rasterize(&self, svg: &str, fonts: &[FontEntry]) -> anyhow::Result<Vec<u8>> {
        use anyhow::Context;
        use resvg::{tiny_skia, usvg};

        let mut opt = usvg::Options::default();
        opt.fontdb = std::sync::Arc::clone(&self.fontdb);
        if !fonts.is_empty() {
            // copy-on-write: the shared base stays untouched
            let db = opt.fontdb_mut();
            for font in fonts {
                db.load_font_data(font.data.to_vec());
            }
        }

        let tree = usvg::Tree::from_str(svg, &opt).context("invalid SVG markup")?;
        let size = tree.size().to_int_size();
        let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
            .with_context(|| format!("cannot allocate a {}x{} pixmap", size.width(), size.height()))?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        let png = pixmap.encode_png().context("PNG encoding failed")?;
        Ok(png)
    }
}

/// Placeholder used when the crate is built without a rasterizer; every call
/// fails so PNG renders report a clear error while SVG output keeps working.
#[derive(Debug, Clone, Default)]
pub struct UnsupportedRasterizer;

impl Rasterizer for UnsupportedRasterizer {
    fn rasterize(&self, _svg: &str, _fonts: &[FontEntry]) -> anyhow::Result<Vec<u8>> {
        anyhow::bail!("PNG output requires the `raster` feature")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_rasterizer_fails() {
        let err = UnsupportedRasterizer.rasterize("<svg/>", &[]).unwrap_err();
        assert!(err.to_string().contains("raster"));
    }

    #[cfg(feature = "raster")]
    #[test]
    fn rasterize_returns_png() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="8" viewBox="0 0 16 8"><rect width="16" height="8" fill="#ff0000"/></svg>"##;
        let png = ResvgRasterizer::without_system_fonts().rasterize(svg, &[]).unwrap();
        assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
    }

    #[cfg(feature = "raster")]
    #[test]
    fn malformed_svg_is_an_error() {
        assert!(ResvgRasterizer::without_system_fonts()
            .rasterize("not svg", &[])
            .is_err());
    }

    #[cfg(feature = "raster")]
    #[test]
    fn call_fonts_do_not_leak_into_shared_database() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"><text y="6">a</text></svg>"#;
        let raster = ResvgRasterizer::without_system_fonts();
        let copy = raster.clone();
        let fonts = [FontEntry::new("Broken", vec![0u8; 4])];
        for _ in 0..2 {
            raster.rasterize(svg, &fonts).unwrap();
        }
        assert_eq!(raster.face_count(), 0);
        assert_eq!(copy.face_count(), 0);
        assert!(std::sync::Arc::ptr_eq(&raster.fontdb, &copy.fontdb));
    }
}
