use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cardcanvas::rendering::BlockLayout;
use cardcanvas::{
    AsyncCanvas, Canvas, ElementNode, FontEntry, LayoutEngine, OutputFormat, RenderOptions,
    RenderRequest, RenderStage,
};

/// Sleeps inside layout and tracks the highest number of overlapping calls.
#[derive(Clone, Default)]
struct SlowLayout {
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl LayoutEngine for SlowLayout {
    fn layout(&self, _: &ElementNode, w: u32, h: u32, _: &[FontEntry]) -> anyhow::Result<String> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(format!(r#"<svg width="{}" height="{}"/>"#, w, h))
    }
}

struct PanickingLayout;

impl LayoutEngine for PanickingLayout {
    fn layout(&self, _: &ElementNode, _: u32, _: u32, _: &[FontEntry]) -> anyhow::Result<String> {
        panic!("layout bug")
    }
}

fn svg_request() -> RenderRequest {
    RenderRequest {
        format: Some(OutputFormat::Svg),
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrency_is_bounded_by_semaphore() {
    let layout = SlowLayout::default();
    let canvas = Canvas::with_backends(
        RenderOptions::default(),
        layout.clone(),
        cardcanvas::rendering::UnsupportedRasterizer,
    );
    let handle = AsyncCanvas::with_concurrency(canvas, 2);

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let handle = handle.clone();
            tokio::spawn(async move { handle.render(format!("<div><p>{}</p></div>", i), svg_request()).await })
        })
        .collect();
    for t in futures::future::join_all(tasks).await {
        assert!(t.unwrap().is_ok());
    }

    let peak = layout.peak.load(Ordering::SeqCst);
    assert!((1..=2).contains(&peak), "peak concurrency was {}", peak);
}

#[tokio::test]
async fn panicking_backend_becomes_render_error() {
    let canvas = Canvas::with_backends(
        RenderOptions::default(),
        PanickingLayout,
        cardcanvas::rendering::UnsupportedRasterizer,
    );
    let err = AsyncCanvas::new(canvas)
        .render("<div>x</div>", svg_request())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "RENDER_ERROR");
    assert_eq!(err.stage(), Some(RenderStage::Layout));
}

#[tokio::test]
async fn fonts_loaded_through_handle_are_shared() {
    let canvas = Canvas::with_backends(
        RenderOptions::default(),
        BlockLayout::default(),
        cardcanvas::rendering::UnsupportedRasterizer,
    );
    let handle = AsyncCanvas::new(canvas);
    handle.clone().load_font(FontEntry::new("Inter", vec![0u8]));
    assert_eq!(handle.canvas().fonts().len(), 1);

    let svg = handle
        .render("<div><p>font</p></div>", svg_request())
        .await
        .unwrap()
        .into_svg()
        .unwrap();
    assert!(svg.contains(r#"font-family="Inter""#));
}

#[cfg(feature = "raster")]
#[tokio::test]
async fn render_png_returns_bytes() {
    let canvas = Canvas::new(RenderOptions {
        width: 40,
        height: 20,
        ..Default::default()
    })
    .unwrap();
    let png = AsyncCanvas::new(canvas)
        .render_png("<div><span>png</span></div>", RenderRequest::default())
        .await
        .unwrap();
    assert_eq!(&png[1..4], b"PNG");
}
