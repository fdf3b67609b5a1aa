//! Paint command list produced by layout and its SVG serialization

use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient line, 0.0..=1.0
    pub offset: f32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Solid(String),
    /// CSS `linear-gradient`; `angle` in degrees, 180 = top to bottom
    LinearGradient { angle: f32, stops: Vec<GradientStop> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    fn as_svg(self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub family: String,
    pub size: f32,
    pub weight: u16,
    pub italic: bool,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
        fill: Fill,
    },
    /// One line of text; `y` is the baseline
    Text {
        x: f32,
        y: f32,
        text: String,
        style: TextStyle,
        anchor: TextAnchor,
    },
}

pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Serialize commands into a standalone SVG document.
pub fn to_svg(width: u32, height: u32, commands: &[PaintCommand]) -> String {
    let mut defs = String::new();
    let mut body = String::new();
    let mut gradients = 0usize;

    for cmd in commands {
        match cmd {
            PaintCommand::Rect {
                x,
                y,
                width,
                height,
                radius,
                fill,
            } => {
                let fill_attr = match fill {
                    Fill::Solid(color) => escape_xml(color),
                    Fill::LinearGradient { angle, stops } => {
                        let id = format!("g{}", gradients);
                        gradients += 1;
                        write_gradient(&mut defs, &id, *angle, stops);
                        format!("url(#{})", id)
                    }
                };
                let _ = write!(
                    body,
                    r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}""#,
                    x, y, width, height
                );
                if *radius > 0.0 {
                    let _ = write!(body, r#" rx="{:.2}""#, radius);
                }
                let _ = write!(body, r#" fill="{}"/>"#, fill_attr);
            }
            PaintCommand::Text {
                x,
                y,
                text,
                style,
                anchor,
            } => {
                let _ = write!(
                    body,
                    r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.2}" font-weight="{}" fill="{}""#,
                    x,
                    y,
                    escape_xml(&style.family),
                    style.size,
                    style.weight,
                    escape_xml(&style.color),
                );
                if style.italic {
                    body.push_str(r#" font-style="italic""#);
                }
                if *anchor != TextAnchor::Start {
                    let _ = write!(body, r#" text-anchor="{}""#, anchor.as_svg());
                }
                let _ = write!(body, r#" xml:space="preserve">{}</text>"#, escape_xml(text));
            }
        }
    }

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    );
    if !defs.is_empty() {
        let _ = write!(svg, "<defs>{}</defs>", defs);
    }
    svg.push_str(&body);
    svg.push_str("</svg>");
    svg
}

fn write_gradient(out: &mut String, id: &str, angle: f32, stops: &[GradientStop]) {
    // CSS angles start at "to top" and turn clockwise
    let rad = angle.to_radians();
    let (dx, dy) = (rad.sin() * 0.5, -rad.cos() * 0.5);
    let _ = write!(
        out,
        r#"<linearGradient id="{}" x1="{:.4}" y1="{:.4}" x2="{:.4}" y2="{:.4}">"#,
        id,
        0.5 - dx,
        0.5 - dy,
        0.5 + dx,
        0.5 + dy
    );
    for stop in stops {
        let _ = write!(
            out,
            r#"<stop offset="{:.4}" stop-color="{}"/>"#,
            stop.offset,
            escape_xml(&stop.color)
        );
    }
    out.push_str("</linearGradient>");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_style() -> TextStyle {
        TextStyle {
            family: "'Arial', sans-serif".into(),
            size: 16.0,
            weight: 700,
            italic: false,
            color: "white".into(),
        }
    }

    #[test]
    fn solid_rect_and_escaped_text() {
        let svg = to_svg(
            10,
            20,
            &[
                PaintCommand::Rect {
                    x: 0.0,
                    y: 0.0,
                    width: 10.0,
                    height: 20.0,
                    radius: 4.0,
                    fill: Fill::Solid("#ff0000".into()),
                },
                PaintCommand::Text {
                    x: 1.0,
                    y: 12.0,
                    text: "a < b & c".into(),
                    style: text_style(),
                    anchor: TextAnchor::Middle,
                },
            ],
        );
        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="20""#));
        assert!(svg.contains(r##"rx="4.00" fill="#ff0000""##));
        assert!(svg.contains("a &lt; b &amp; c"));
        assert!(svg.contains(r#"font-family="&apos;Arial&apos;, sans-serif""#));
        assert!(svg.contains(r#"text-anchor="middle""#));
        assert!(!svg.contains("<defs>"));
    }

    #[test]
    fn gradient_goes_into_defs() {
        let svg = to_svg(
            4,
            4,
            &[PaintCommand::Rect {
                x: 0.0,
                y: 0.0,
                width: 4.0,
                height: 4.0,
                radius: 0.0,
                fill: Fill::LinearGradient {
                    angle: 180.0,
                    stops: vec![
                        GradientStop { offset: 0.0, color: "#000".into() },
                        GradientStop { offset: 1.0, color: "#fff".into() },
                    ],
                },
            }],
        );
        assert!(svg.contains(r#"<linearGradient id="g0" x1="0.5000" y1="0.0000" x2="0.5000" y2="1.0000">"#));
        assert!(svg.contains(r#"fill="url(#g0)""#));
    }
}
