//! Built-in block layout: element tree -> paint commands -> SVG.
//!
//! Every element is a block stacked vertically inside its parent's content
//! box. Text is wrapped using an estimated glyph advance, so output is
//! deterministic and needs no font metrics.

use log::debug;

use super::paint::{self, Fill, GradientStop, PaintCommand, TextAnchor, TextStyle};
use super::LayoutEngine;
use crate::markup::style::split_top_level;
use crate::markup::{StyleMap, MAX_DEPTH};
use crate::{ElementNode, FontEntry, TagName};

#[derive(Debug, Clone)]
pub struct BlockLayout {
    /// Estimated advance of one glyph, as a fraction of the font size
    pub glyph_advance: f32,
    /// Line height as a multiple of the font size
    pub line_height: f32,
    /// Family used when neither styles nor the font list name one
    pub fallback_family: String,
    pub base_font_size: f32,
}

impl Default for BlockLayout {
    fn default() -> Self {
        Self {
            glyph_advance: 0.6,
            line_height: 1.2,
            fallback_family: "sans-serif".to_string(),
            base_font_size: 16.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Edges {
    top: f32,
    right: f32,
    bottom: f32,
    left: f32,
}

/// Text properties flowing from parents to children.
#[derive(Debug, Clone)]
struct Inherited {
    text: TextStyle,
    anchor: TextAnchor,
}

struct Frame {
    x: f32,
    y: f32,
    width: f32,
    /// Basis for percentage heights, when an ancestor fixes it
    height: Option<f32>,
}

impl LayoutEngine for BlockLayout {
    fn layout(
        &self,
        tree: &ElementNode,
        width: u32,
        height: u32,
        fonts: &[FontEntry],
    ) -> anyhow::Result<String> {
        let commands = self.paint_commands(tree, width, height, fonts)?;
        debug!("block layout produced {} paint commands", commands.len());
        Ok(paint::to_svg(width, height, &commands))
    }
}

impl BlockLayout {
    pub fn paint_commands(
        &self,
        tree: &ElementNode,
        width: u32,
        height: u32,
        fonts: &[FontEntry],
    ) -> anyhow::Result<Vec<PaintCommand>> {
        if tree.tag().is_none() {
            anyhow::bail!("layout root must be an element, got a text leaf");
        }
        let depth = tree.depth();
        if depth > MAX_DEPTH {
            anyhow::bail!("element tree is {} levels deep, limit is {}", depth, MAX_DEPTH);
        }

        let family = fonts
            .first()
            .map(|f| f.family.clone())
            .unwrap_or_else(|| self.fallback_family.clone());
        let inherited = Inherited {
            text: TextStyle {
                family,
                size: self.base_font_size,
                weight: 400,
                italic: false,
                color: "#000000".to_string(),
            },
            anchor: TextAnchor::Start,
        };

        let frame = Frame {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: Some(height as f32),
        };
        let mut out = Vec::new();
        self.layout_node(tree, &frame, &inherited, &mut out, true);
        Ok(out)
    }

    /// Lay out `node` at the frame origin; returns the vertical space used.
    /// The root box is stretched to fill the frame height.
    fn layout_node(
        &self,
        node: &ElementNode,
        frame: &Frame,
        inherited: &Inherited,
        out: &mut Vec<PaintCommand>,
        root: bool,
    ) -> f32 {
        match node {
            ElementNode::Text(text) => self.layout_text(text, frame, inherited, out),
            ElementNode::Element {
                tag,
                attributes,
                children,
            } => {
                let style = &attributes.style;
                let margin = edges(style, "margin");
                let padding = edges(style, "padding");
                let own = self.inherit(*tag, style, inherited);

                let box_x = frame.x + margin.left;
                let box_y = frame.y + margin.top;
                let box_w = style
                    .get("width")
                    .and_then(|v| length(v, Some(frame.width), own.text.size))
                    .unwrap_or(frame.width - margin.left - margin.right)
                    .max(0.0);
                let explicit_h = style
                    .get("height")
                    .and_then(|v| length(v, frame.height, own.text.size));
                let basis_h = explicit_h.or_else(|| {
                    frame
                        .height
                        .filter(|_| root)
                        .map(|h| h - margin.top - margin.bottom)
                });

                let content = Frame {
                    x: box_x + padding.left,
                    y: box_y + padding.top,
                    width: (box_w - padding.left - padding.right).max(0.0),
                    height: basis_h.map(|h| (h - padding.top - padding.bottom).max(0.0)),
                };

                let mut inner = Vec::new();
                let mut cursor = content.y;
                for child in children {
                    let child_frame = Frame {
                        x: content.x,
                        y: cursor,
                        width: content.width,
                        height: content.height,
                    };
                    cursor += self.layout_node(child, &child_frame, &own, &mut inner, false);
                }

                let natural_h = cursor - content.y + padding.top + padding.bottom;
                let box_h = match (explicit_h, basis_h) {
                    (Some(h), _) => h,
                    (None, Some(fill)) => natural_h.max(fill),
                    (None, None) => natural_h,
                };

                if let Some(fill) = background(style) {
                    let radius = style
                        .get("borderRadius")
                        .and_then(|v| first_token(v))
                        .and_then(|v| length(v, Some(box_w), own.text.size))
                        .unwrap_or(0.0);
                    out.push(PaintCommand::Rect {
                        x: box_x,
                        y: box_y,
                        width: box_w,
                        height: box_h,
                        radius,
                        fill,
                    });
                }
                out.extend(inner);

                margin.top + box_h + margin.bottom
            }
        }
    }

    fn layout_text(
        &self,
        text: &str,
        frame: &Frame,
        inherited: &Inherited,
        out: &mut Vec<PaintCommand>,
    ) -> f32 {
        let size = inherited.text.size;
        let line_h = size * self.line_height;
        let lines = wrap(&decode_entities(text), frame.width, size * self.glyph_advance);

        let x = match inherited.anchor {
            TextAnchor::Start => frame.x,
            TextAnchor::Middle => frame.x + frame.width / 2.0,
            TextAnchor::End => frame.x + frame.width,
        };
        for (i, line) in lines.iter().enumerate() {
            // baseline: half-leading plus an ascent of 0.8em
            let top = frame.y + i as f32 * line_h;
            out.push(PaintCommand::Text {
                x,
                y: top + (line_h - size) / 2.0 + size * 0.8,
                text: line.clone(),
                style: inherited.text.clone(),
                anchor: inherited.anchor,
            });
        }

        lines.len() as f32 * line_h
    }

    fn inherit(&self, tag: TagName, style: &StyleMap, parent: &Inherited) -> Inherited {
        let mut own = parent.clone();

        match tag {
            TagName::H1 => set_heading(&mut own.text, 32.0),
            TagName::H2 => set_heading(&mut own.text, 24.0),
            TagName::H3 => set_heading(&mut own.text, 18.72),
            _ => {}
        }

        if let Some(size) = style
            .get("fontSize")
            .and_then(|v| length(v, Some(parent.text.size), parent.text.size))
        {
            own.text.size = size;
        }
        if let Some(weight) = style.get("fontWeight").and_then(|v| font_weight(v)) {
            own.text.weight = weight;
        }
        if let Some(fs) = style.get("fontStyle") {
            own.text.italic = matches!(fs.trim(), "italic" | "oblique");
        }
        if let Some(family) = style.get("fontFamily") {
            own.text.family = family.trim().to_string();
        }
        if let Some(color) = style.get("color") {
            own.text.color = color.trim().to_string();
        }
        if let Some(align) = style.get("textAlign") {
            own.anchor = match align.trim() {
                "center" => TextAnchor::Middle,
                "right" | "end" => TextAnchor::End,
                _ => TextAnchor::Start,
            };
        }

        own
    }
}

fn set_heading(text: &mut TextStyle, size: f32) {
    text.size = size;
    text.weight = 700;
}

/// Decode the character references markup builders emit (`&amp;`, `&lt;`,
/// `&#39;`, `&#x1F389;`, ...). Unknown references are left as written.
fn decode_entities(text: &str) -> std::borrow::Cow<'_, str> {
    if !text.contains('&') {
        return std::borrow::Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let c = match &rest[1..semi] {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                name => name
                    .strip_prefix("#x")
                    .or_else(|| name.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| name.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            }?;
            Some((c, semi + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    std::borrow::Cow::Owned(out)
}

/// Greedy word wrap by estimated advance; whitespace runs collapse.
fn wrap(text: &str, width: f32, advance: f32) -> Vec<String> {
    let chars_per_line = if advance > 0.0 && width >= advance {
        (width / advance) as usize
    } else {
        1
    };

    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        let cur_len = cur.chars().count();
        if cur_len > 0 && cur_len + 1 + word.chars().count() > chars_per_line {
            lines.push(std::mem::take(&mut cur));
        }
        if !cur.is_empty() {
            cur.push(' ');
        }
        cur.push_str(word);
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}

/// `12px`, `12`, `50%` (of `basis`) or `1.5em`; anything else is `None`.
fn length(value: &str, basis: Option<f32>, font_size: f32) -> Option<f32> {
    let v = value.trim();
    if let Some(px) = v.strip_suffix("px") {
        return px.trim().parse().ok();
    }
    if let Some(pct) = v.strip_suffix('%') {
        let pct: f32 = pct.trim().parse().ok()?;
        return basis.map(|b| b * pct / 100.0);
    }
    if let Some(em) = v.strip_suffix("rem").or_else(|| v.strip_suffix("em")) {
        let em: f32 = em.trim().parse().ok()?;
        return Some(em * font_size);
    }
    v.parse().ok()
}

/// `margin`/`padding` shorthand with `marginTop`-style overrides.
fn edges(style: &StyleMap, prop: &str) -> Edges {
    let mut e = Edges::default();
    if let Some(v) = style.get(prop) {
        let vals: Vec<f32> = v
            .split_whitespace()
            .map(|t| length(t, None, 16.0).unwrap_or(0.0))
            .collect();
        let (t, r, b, l) = match vals.as_slice() {
            [a] => (*a, *a, *a, *a),
            [v, h] => (*v, *h, *v, *h),
            [t, h, b] => (*t, *h, *b, *h),
            [t, r, b, l, ..] => (*t, *r, *b, *l),
            [] => (0.0, 0.0, 0.0, 0.0),
        };
        e = Edges { top: t, right: r, bottom: b, left: l };
    }
    for (side, slot) in [
        ("Top", &mut e.top),
        ("Right", &mut e.right),
        ("Bottom", &mut e.bottom),
        ("Left", &mut e.left),
    ] {
        if let Some(v) = style
            .get(&format!("{}{}", prop, side))
            .and_then(|v| length(v, None, 16.0))
        {
            *slot = v;
        }
    }
    e
}

fn font_weight(value: &str) -> Option<u16> {
    match value.trim() {
        "normal" => Some(400),
        "bold" | "bolder" => Some(700),
        "lighter" => Some(300),
        other => other.parse().ok(),
    }
}

/// First whitespace-separated token that is not inside parentheses.
fn first_token(value: &str) -> Option<&str> {
    let v = value.trim();
    let mut depth = 0usize;
    for (i, ch) in v.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => return Some(&v[..i]),
            _ => {}
        }
    }
    if v.is_empty() {
        None
    } else {
        Some(v)
    }
}

fn background(style: &StyleMap) -> Option<Fill> {
    let value = style
        .get("backgroundColor")
        .or_else(|| style.get("background"))?;
    let token = first_token(value)?;

    if token.starts_with("linear-gradient(") {
        return linear_gradient(token);
    }
    if token.starts_with("url(") || matches!(token, "none" | "transparent") {
        return None;
    }
    Some(Fill::Solid(token.to_string()))
}

fn linear_gradient(value: &str) -> Option<Fill> {
    let inner = value
        .strip_prefix("linear-gradient(")?
        .strip_suffix(')')?;
    let mut parts: Vec<&str> = split_top_level(inner, ',')
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let mut angle = 180.0;
    if let Some(first) = parts.first() {
        if let Some(deg) = first.strip_suffix("deg") {
            if let Ok(a) = deg.trim().parse::<f32>() {
                angle = a;
                parts.remove(0);
            }
        } else if let Some(dir) = first.strip_prefix("to ") {
            angle = match dir.trim() {
                "top" => 0.0,
                "top right" | "right top" => 45.0,
                "right" => 90.0,
                "bottom right" | "right bottom" => 135.0,
                "bottom" => 180.0,
                "bottom left" | "left bottom" => 225.0,
                "left" => 270.0,
                "top left" | "left top" => 315.0,
                _ => 180.0,
            };
            parts.remove(0);
        }
    }
    if parts.is_empty() {
        return None;
    }

    let n = parts.len();
    let stops = parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let even = if n > 1 { i as f32 / (n - 1) as f32 } else { 0.0 };
            match part.rsplit_once(' ') {
                Some((color, pos)) if pos.ends_with('%') => GradientStop {
                    offset: length(pos, Some(1.0), 16.0).unwrap_or(even).clamp(0.0, 1.0),
                    color: color.trim().to_string(),
                },
                _ => GradientStop {
                    offset: even,
                    color: part.to_string(),
                },
            }
        })
        .collect();

    Some(Fill::LinearGradient { angle, stops })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse;

    fn commands(markup: &str, w: u32, h: u32) -> Vec<PaintCommand> {
        let tree = parse(markup).unwrap();
        BlockLayout::default().paint_commands(&tree, w, h, &[]).unwrap()
    }

    #[test]
    fn root_background_fills_canvas() {
        let cmds = commands(r#"<div style="background-color: #123456">hi</div>"#, 200, 100);
        match &cmds[0] {
            PaintCommand::Rect { width, height, fill, .. } => {
                assert_eq!(*width, 200.0);
                assert_eq!(*height, 100.0);
                assert_eq!(fill, &Fill::Solid("#123456".into()));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(cmds[1], PaintCommand::Text { .. }));
    }

    #[test]
    fn headings_are_bold_and_large() {
        let cmds = commands("<div><h1>Title</h1><p>body</p></div>", 200, 100);
        let texts: Vec<_> = cmds
            .iter()
            .filter_map(|c| match c {
                PaintCommand::Text { style, y, .. } => Some((style.size, style.weight, *y)),
                _ => None,
            })
            .collect();
        assert_eq!(texts.len(), 2);
        assert_eq!((texts[0].0, texts[0].1), (32.0, 700));
        assert_eq!((texts[1].0, texts[1].1), (16.0, 400));
        assert!(texts[1].2 > texts[0].2);
    }

    #[test]
    fn inherited_color_and_alignment() {
        let cmds = commands(
            r#"<div style="color: white; text-align: center; padding: 10px"><p>x</p></div>"#,
            100,
            50,
        );
        match &cmds[0] {
            PaintCommand::Text { x, style, anchor, .. } => {
                assert_eq!(style.color, "white");
                assert_eq!(*anchor, TextAnchor::Middle);
                assert_eq!(*x, 50.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn character_references_are_decoded() {
        assert_eq!(decode_entities("R&amp;D &lt;b&gt; &#39;x&#39; &#x41;"), "R&D <b> 'x' A");
        assert_eq!(decode_entities("a & b &bogus; c"), "a & b &bogus; c");
        assert_eq!(decode_entities("plain"), "plain");
    }

    #[test]
    fn long_text_wraps() {
        let lines = wrap("aaaa bbbb cccc", 60.0, 6.0);
        assert_eq!(lines, vec!["aaaa bbbb", "cccc"]);
        assert!(wrap("   ", 60.0, 6.0).is_empty());
    }

    #[test]
    fn box_edges_shorthand() {
        let style = crate::markup::parse_style("margin: 1px 2px 3px; padding-left: 7px");
        assert_eq!(
            edges(&style, "margin"),
            Edges { top: 1.0, right: 2.0, bottom: 3.0, left: 2.0 }
        );
        assert_eq!(edges(&style, "padding").left, 7.0);
    }

    #[test]
    fn gradient_background() {
        let style = crate::markup::parse_style(
            "background: linear-gradient(135deg, #667eea 0%, #764ba2 100%)",
        );
        match background(&style) {
            Some(Fill::LinearGradient { angle, stops }) => {
                assert_eq!(angle, 135.0);
                assert_eq!(stops.len(), 2);
                assert_eq!(stops[0].color, "#667eea");
                assert_eq!(stops[1].offset, 1.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn image_backgrounds_are_skipped() {
        let style = crate::markup::parse_style("background: url(a.png) center");
        assert!(background(&style).is_none());
        let style = crate::markup::parse_style("background: rgba(0, 0, 0, 0.3)");
        assert_eq!(background(&style), Some(Fill::Solid("rgba(0, 0, 0, 0.3)".into())));
    }

    #[test]
    fn font_list_supplies_fallback_family() {
        let tree = parse("<div>x</div>").unwrap();
        let fonts = [FontEntry::new("Inter", vec![0u8])];
        let cmds = BlockLayout::default().paint_commands(&tree, 10, 10, &fonts).unwrap();
        match &cmds[0] {
            PaintCommand::Text { style, .. } => assert_eq!(style.family, "Inter"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn text_root_is_rejected() {
        let err = BlockLayout::default()
            .layout(&ElementNode::text("x"), 10, 10, &[])
            .unwrap_err();
        assert!(err.to_string().contains("text leaf"));
    }

    #[test]
    fn over_deep_tree_is_rejected() {
        let mut tree = ElementNode::text("x");
        for _ in 0..MAX_DEPTH + 5 {
            tree = ElementNode::Element {
                tag: TagName::Span,
                attributes: Default::default(),
                children: vec![tree],
            };
        }
        let err = BlockLayout::default().layout(&tree, 10, 10, &[]).unwrap_err();
        assert!(err.to_string().contains("levels deep"));
    }
}
