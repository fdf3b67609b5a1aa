//! HTML-subset markup to element tree.
//!
//! The builder understands a fixed whitelist of tags (`div`, `span`, `h1`,
//! `h2`, `h3`, `p`) and a single attribute (`style`). Anything else degrades
//! to literal text rather than failing, so markup copied from real pages
//! still renders. Do not turn this into a strict parser: callers rely on the
//! permissive fallback.

pub mod attributes;
pub mod scanner;
pub mod style;

use log::debug;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::{Error, Result};
use scanner::Token;
pub use attributes::{parse_attributes, AttributeBag};
pub use style::{parse_style, serialize_style, StyleMap};

/// Whitelisted tag names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagName {
    Div,
    Span,
    H1,
    H2,
    H3,
    P,
}

impl TagName {
    /// Case-sensitive lookup; `DIV` is not a whitelisted tag.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "div" => TagName::Div,
            "span" => TagName::Span,
            "h1" => TagName::H1,
            "h2" => TagName::H2,
            "h3" => TagName::H3,
            "p" => TagName::P,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TagName::Div => "div",
            TagName::Span => "span",
            TagName::H1 => "h1",
            TagName::H2 => "h2",
            TagName::H3 => "h3",
            TagName::P => "p",
        }
    }
}

impl Serialize for TagName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A node of the element tree handed to the layout engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementNode {
    Element {
        tag: TagName,
        attributes: AttributeBag,
        children: Vec<ElementNode>,
    },
    Text(String),
}

impl ElementNode {
    pub fn text(content: impl Into<String>) -> Self {
        ElementNode::Text(content.into())
    }

    pub fn tag(&self) -> Option<TagName> {
        match self {
            ElementNode::Element { tag, .. } => Some(*tag),
            ElementNode::Text(_) => None,
        }
    }

    pub fn children(&self) -> &[ElementNode] {
        match self {
            ElementNode::Element { children, .. } => children,
            ElementNode::Text(_) => &[],
        }
    }

    pub fn style(&self) -> Option<&StyleMap> {
        match self {
            ElementNode::Element { attributes, .. } => Some(&attributes.style),
            ElementNode::Text(_) => None,
        }
    }

    /// Levels of element nesting; a text leaf is 0 and a childless element 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 1)];
        while let Some((node, level)) = pending.pop() {
            if let ElementNode::Element { children, .. } = node {
                deepest = deepest.max(level);
                pending.extend(children.iter().map(|child| (child, level + 1)));
            }
        }
        deepest
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        match self {
            ElementNode::Text(t) => t.clone(),
            ElementNode::Element { children, .. } => {
                children.iter().map(ElementNode::text_content).collect()
            }
        }
    }
}

/// Elements serialize as `{"type": tag, "props": {"style": .., "children": [..]}}`
/// and text leaves as plain strings.
impl Serialize for ElementNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ElementNode::Text(t) => serializer.serialize_str(t),
            ElementNode::Element {
                tag,
                attributes,
                children,
            } => {
                #[derive(Serialize)]
                struct Props<'a> {
                    #[serde(skip_serializing_if = "no_declarations")]
                    style: &'a StyleMap,
                    children: &'a [ElementNode],
                }

                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", tag)?;
                map.serialize_entry(
                    "props",
                    &Props {
                        style: &attributes.style,
                        children,
                    },
                )?;
                map.end()
            }
        }
    }
}

fn no_declarations(style: &&StyleMap) -> bool {
    style.is_empty()
}

const ROOT_OPEN: &str = "<div";
const ROOT_CLOSE: &str = "</div>";

/// Deepest element nesting the builder produces, the root `div` included.
///
/// `parse` rejects deeper markup with `ParseError`, `parse_children` keeps
/// the over-deep element as raw text, and `BlockLayout` refuses trees built
/// by hand that exceed it. Everything downstream of the tree may recurse per
/// level, so this bounds stack use.
pub const MAX_DEPTH: usize = 256;

/// Parse a markup document into its root `div` element.
///
/// The trimmed input must start with a `<div ...>` open tag and end with
/// `</div>`; everything in between is the root's content.
pub fn parse(markup: &str) -> Result<ElementNode> {
    let doc = markup.trim();
    if !doc.starts_with(ROOT_OPEN) || !doc.ends_with(ROOT_CLOSE) {
        return Err(root_error());
    }

    let open = scanner::open_tag_at(doc, 0).ok_or_else(root_error)?;
    if open.tag != TagName::Div || open.self_closing {
        return Err(root_error());
    }
    let inner_end = doc.len() - ROOT_CLOSE.len();
    if open.end > inner_end {
        return Err(root_error());
    }

    Ok(ElementNode::Element {
        tag: TagName::Div,
        attributes: parse_attributes(open.attrs),
        children: build_children(&doc[open.end..inner_end], 1, Overflow::Fail)?,
    })
}

fn root_error() -> Error {
    Error::ParseError("root element must be div".into())
}

/// Build the children of an element from its inner markup.
///
/// Never returns an empty list: content without tags becomes one trimmed
/// text leaf, and content with tags but no whitelisted pairs becomes one raw
/// text leaf. Elements nested more than [`MAX_DEPTH`] levels below `content`
/// are kept as raw text.
pub fn parse_children(content: &str) -> Vec<ElementNode> {
    match build_children(content, 0, Overflow::KeepText) {
        Ok(children) => children,
        Err(_) => vec![ElementNode::text(content)],
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Overflow {
    Fail,
    KeepText,
}

/// An element whose children are still being collected.
struct Frame<'a> {
    element: Option<(TagName, &'a str)>,
    inner: &'a str,
    /// next token to visit
    next: usize,
    /// first token past this element's content
    end: usize,
    children: Vec<ElementNode>,
}

/// Builds the tree with an explicit stack of open elements; markup nesting
/// never turns into native recursion. `base_depth` is the depth of the element
/// that owns `content`.
fn build_children(content: &str, base_depth: usize, overflow: Overflow) -> Result<Vec<ElementNode>> {
    let tokens = scanner::tokenize(content);
    let mut stack = vec![Frame {
        element: None,
        inner: content,
        next: 0,
        end: tokens.len(),
        children: Vec::new(),
    }];

    loop {
        let child_depth = base_depth + stack.len();
        let Some(top) = stack.last_mut() else {
            break;
        };

        if top.next < top.end {
            let open = top.next;
            let (tag, attrs, start, open_end, close) = match tokens[open] {
                Token::Open {
                    tag,
                    attrs,
                    start,
                    end,
                    close: Some(close),
                } if close < top.end => (tag, attrs, start, end, close),
                _ => {
                    top.next += 1;
                    continue;
                }
            };
            top.next = close + 1;

            if child_depth > MAX_DEPTH {
                match overflow {
                    Overflow::Fail => {
                        return Err(Error::ParseError(format!(
                            "markup nests deeper than {} elements",
                            MAX_DEPTH
                        )))
                    }
                    Overflow::KeepText => {
                        let raw = &content[start..tokens[close].end()];
                        top.children.push(ElementNode::text(raw));
                        continue;
                    }
                }
            }

            stack.push(Frame {
                element: Some((tag, attrs)),
                inner: &content[open_end..tokens[close].start()],
                next: open + 1,
                end: close,
                children: Vec::new(),
            });
            continue;
        }

        let Some(frame) = stack.pop() else {
            break;
        };
        let children = with_fallback(frame.inner, frame.children);
        match (frame.element, stack.last_mut()) {
            (Some((tag, attrs)), Some(parent)) => parent.children.push(ElementNode::Element {
                tag,
                attributes: parse_attributes(attrs),
                children,
            }),
            _ => return Ok(children),
        }
    }

    Ok(vec![ElementNode::text(content)])
}

fn with_fallback(inner: &str, children: Vec<ElementNode>) -> Vec<ElementNode> {
    if !children.is_empty() {
        return children;
    }
    if !inner.contains('<') {
        return vec![ElementNode::text(inner.trim())];
    }
    debug!("no whitelisted elements in {} bytes of markup; keeping it as text", inner.len());
    vec![ElementNode::text(inner)]
}
