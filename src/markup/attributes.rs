//! Attribute extraction for whitelisted tags.
//!
//! Only `style` is recognized. Every other attribute is dropped on purpose:
//! pasted real-world markup (class names, ids, `alt`, ...) must keep
//! rendering instead of being rejected.

use serde::Serialize;

use super::style::{parse_style, StyleMap};

/// Parsed attributes of an element.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttributeBag {
    /// Declarations from the `style` attribute; empty when it is absent
    pub style: StyleMap,
}

impl AttributeBag {
    pub fn is_empty(&self) -> bool {
        self.style.is_empty()
    }
}

/// Parse the raw text between a tag name and its closing `>`.
///
/// The first attribute named exactly `style` wins; names that merely contain
/// it (`data-style`, `styles`) are ignored like any other attribute.
pub fn parse_attributes(attr_text: &str) -> AttributeBag {
    let style = raw_attributes(attr_text)
        .into_iter()
        .find(|(name, _)| *name == "style")
        .and_then(|(_, value)| value)
        .map(parse_style)
        .unwrap_or_default();

    AttributeBag { style }
}

/// Tokenize `name="value" name='value' name=value name` sequences.
fn raw_attributes(text: &str) -> Vec<(&str, Option<&str>)> {
    let bytes = text.as_bytes();
    let mut attrs = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' && bytes[i] != b'/' {
            i += 1;
        }
        if name_start == i {
            // stray '=' with no name
            i += 1;
            continue;
        }
        let name = &text[name_start..i];

        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j >= bytes.len() || bytes[j] != b'=' {
            attrs.push((name, None));
            continue;
        }
        j += 1;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }

        let value = match bytes.get(j) {
            Some(&q) if q == b'"' || q == b'\'' => {
                let start = j + 1;
                match text[start..].find(q as char) {
                    Some(len) => {
                        i = start + len + 1;
                        &text[start..start + len]
                    }
                    None => {
                        // unterminated quote runs to the end
                        i = bytes.len();
                        &text[start..]
                    }
                }
            }
            _ => {
                let start = j;
                i = j;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                &text[start..i]
            }
        };
        attrs.push((name, Some(value)));
    }

    attrs
}
