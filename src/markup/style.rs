//! Inline `style="..."` declaration parsing.
//!
//! Values are passed through verbatim; only property names are normalized.
//! Malformed declarations are dropped silently.

use std::collections::BTreeMap;

/// Normalized property name (`backgroundColor`) to raw value (`#fff`).
pub type StyleMap = BTreeMap<String, String>;

/// Parse the body of a `style` attribute into a [`StyleMap`].
///
/// Declarations are split on `;` and each one on its first `:`. Separators
/// inside parentheses or quotes do not split, so `url(data:image/png;base64,..)`
/// survives intact. Later duplicates overwrite earlier ones.
pub fn parse_style(text: &str) -> StyleMap {
    let mut style = StyleMap::new();

    for declaration in split_top_level(text, ';') {
        if declaration.trim().is_empty() {
            continue;
        }
        let Some((property, value)) = split_first_top_level(declaration, ':') else {
            continue;
        };
        let property = property.trim();
        let value = value.trim();
        if property.is_empty() || value.is_empty() {
            continue;
        }
        style.insert(camel_case(property), value.to_string());
    }

    style
}

/// Re-serialize a style map as `property:value;` pairs.
///
/// Keys stay in their normalized form; feeding the output back into
/// [`parse_style`] yields the same map.
pub fn serialize_style(style: &StyleMap) -> String {
    style
        .iter()
        .map(|(k, v)| format!("{}:{}", k, v))
        .collect::<Vec<_>>()
        .join(";")
}

/// `background-color` -> `backgroundColor`.
///
/// Every `-` is removed and the next character is upper-cased.
pub fn camel_case(property: &str) -> String {
    let mut out = String::with_capacity(property.len());
    let mut upper_next = false;
    for ch in property.chars() {
        if ch == '-' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Tracks whether a cursor sits inside `(...)` or a quoted string.
#[derive(Default)]
struct Nesting {
    parens: usize,
    quote: Option<char>,
}

impl Nesting {
    fn feed(&mut self, ch: char) {
        match self.quote {
            Some(q) if ch == q => self.quote = None,
            Some(_) => {}
            None => match ch {
                '"' | '\'' => self.quote = Some(ch),
                '(' => self.parens += 1,
                ')' => self.parens = self.parens.saturating_sub(1),
                _ => {}
            },
        }
    }

    fn is_top_level(&self) -> bool {
        self.parens == 0 && self.quote.is_none()
    }
}

/// Split on `sep` wherever it is not nested in parens or quotes.
pub(crate) fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut nesting = Nesting::default();
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        if ch == sep && nesting.is_top_level() {
            parts.push(&text[start..i]);
            start = i + ch.len_utf8();
            continue;
        }
        nesting.feed(ch);
    }
    parts.push(&text[start..]);
    parts
}

fn split_first_top_level(text: &str, sep: char) -> Option<(&str, &str)> {
    let mut nesting = Nesting::default();
    for (i, ch) in text.char_indices() {
        if ch == sep && nesting.is_top_level() {
            return Some((&text[..i], &text[i + ch.len_utf8()..]));
        }
        nesting.feed(ch);
    }
    None
}
