use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::{Canvas, Error, FontEntry, RenderOutput, RenderRequest, RenderStage, Result};

/// An async-friendly handle to a [`Canvas`].
///
/// Rendering is CPU-bound, so each call runs on tokio's blocking pool and
/// the async caller only awaits the result. A semaphore sized to the CPU
/// count bounds how many renders run at once; clones share the canvas and
/// the limit.
#[derive(Clone)]
pub struct AsyncCanvas {
    canvas: Arc<Canvas>,
    permits: Arc<Semaphore>,
}

impl AsyncCanvas {
    pub fn new(canvas: Canvas) -> Self {
        Self::with_concurrency(canvas, num_cpus::get())
    }

    pub fn with_concurrency(canvas: Canvas, max_in_flight: usize) -> Self {
        Self {
            canvas: Arc::new(canvas),
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn load_font(&self, font: FontEntry) {
        self.canvas.load_font(font);
    }

    pub async fn render(&self, markup: impl Into<String>, request: RenderRequest) -> Result<RenderOutput> {
        let markup = markup.into();
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| Error::render(RenderStage::Options, format!("render queue closed: {}", e)))?;

        let canvas = Arc::clone(&self.canvas);
        tokio::task::spawn_blocking(move || canvas.render(&markup, &request))
            .await
            // a panicking backend surfaces here
            .map_err(|e| Error::render(RenderStage::Layout, format!("render task failed: {}", e)))?
    }

    pub async fn render_png(&self, markup: impl Into<String>, request: RenderRequest) -> Result<Vec<u8>> {
        self.render(markup, request).await?.into_png()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::{BlockLayout, UnsupportedRasterizer};
    use crate::{OutputFormat, RenderOptions};

    #[tokio::test]
    async fn renders_svg_off_thread() {
        let canvas = Canvas::with_backends(RenderOptions::default(), BlockLayout::default(), UnsupportedRasterizer);
        let handle = AsyncCanvas::with_concurrency(canvas, 2);
        let req = RenderRequest {
            format: Some(OutputFormat::Svg),
            ..Default::default()
        };
        let out = handle.render("<div><p>async</p></div>", req).await.unwrap();
        assert!(out.into_svg().unwrap().contains("async"));
    }
}
