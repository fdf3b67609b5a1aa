//! Single-pass tokenizer for whitelisted tag pairs.
//!
//! The fragment is tokenized once into open and close tags. Each close pops
//! the most recent unpaired open of the same name, so `<div><div>a</div></div>`
//! pairs the outer tags correctly and pairing costs one pass however many
//! open tags are left unclosed.

use super::TagName;

const TAG_COUNT: usize = 6;

/// A whitelisted tag found in a fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Token<'a> {
    Open {
        tag: TagName,
        attrs: &'a str,
        /// byte offset of the `<`
        start: usize,
        /// byte offset just past the closing `>`
        end: usize,
        /// index of the paired `Close` token, if any
        close: Option<usize>,
    },
    Close {
        start: usize,
        end: usize,
    },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct OpenTag<'a> {
    pub tag: TagName,
    pub attrs: &'a str,
    /// byte offset just past the closing `>`
    pub end: usize,
    pub self_closing: bool,
}

/// Tokenize `content` and pair every close tag with its open tag.
///
/// Comments, unsupported tags and self-closing whitelisted tags produce no
/// tokens. A close tag with nothing to pair stays in the list unpaired.
pub(crate) fn tokenize(content: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut unpaired: [Vec<usize>; TAG_COUNT] = Default::default();
    let mut pos = 0;

    while let Some(off) = content[pos..].find('<') {
        let start = pos + off;
        if let Some(end) = comment_end(content, start) {
            pos = end;
            continue;
        }
        if let Some((tag, end)) = close_tag_at(content, start) {
            let index = tokens.len();
            if let Some(open) = unpaired[tag as usize].pop() {
                if let Some(Token::Open { close, .. }) = tokens.get_mut(open) {
                    *close = Some(index);
                }
            }
            tokens.push(Token::Close { start, end });
            pos = end;
            continue;
        }
        match open_tag_at(content, start) {
            Some(open) if !open.self_closing => {
                unpaired[open.tag as usize].push(tokens.len());
                tokens.push(Token::Open {
                    tag: open.tag,
                    attrs: open.attrs,
                    start,
                    end: open.end,
                    close: None,
                });
                pos = open.end;
            }
            Some(open) => pos = open.end,
            None => pos = start + 1,
        }
    }

    tokens
}

impl Token<'_> {
    pub(crate) fn start(&self) -> usize {
        match *self {
            Token::Open { start, .. } | Token::Close { start, .. } => start,
        }
    }

    pub(crate) fn end(&self) -> usize {
        match *self {
            Token::Open { end, .. } | Token::Close { end, .. } => end,
        }
    }
}

/// Parse a whitelisted open tag starting at `start` (which must point at `<`).
pub(crate) fn open_tag_at(content: &str, start: usize) -> Option<OpenTag<'_>> {
    let rest = content.get(start..)?.strip_prefix('<')?;
    let name_len = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    let tag = TagName::from_name(&rest[..name_len])?;

    match rest.as_bytes().get(name_len) {
        Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => {}
        _ => return None,
    }

    let attrs_start = start + 1 + name_len;
    let gt = find_tag_end(content, attrs_start)?;
    let raw = &content[attrs_start..gt];
    let self_closing = raw.trim_end().ends_with('/');

    Some(OpenTag {
        tag,
        attrs: raw,
        end: gt + 1,
        self_closing,
    })
}

/// Parse `</tag>` (trailing whitespace allowed) at `start`.
fn close_tag_at(content: &str, start: usize) -> Option<(TagName, usize)> {
    let rest = content.get(start..)?.strip_prefix("</")?;
    let name_len = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    let tag = TagName::from_name(&rest[..name_len])?;
    let ws = rest[name_len..]
        .bytes()
        .take_while(|b| b.is_ascii_whitespace())
        .count();
    if rest.as_bytes().get(name_len + ws) != Some(&b'>') {
        return None;
    }
    Some((tag, start + 2 + name_len + ws + 1))
}

/// Find the `>` that ends a tag, ignoring any inside quoted attribute values.
fn find_tag_end(content: &str, from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    let mut prev = 0u8;
    for (i, &b) in content.as_bytes().iter().enumerate().skip(from) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'>' => return Some(i),
                b'"' | b'\'' if prev == b'=' => quote = Some(b),
                _ => {}
            },
        }
        if !b.is_ascii_whitespace() {
            prev = b;
        }
    }
    None
}

fn comment_end(content: &str, start: usize) -> Option<usize> {
    let rest = content.get(start..)?;
    if !rest.starts_with("<!--") {
        return None;
    }
    Some(match rest[4..].find("-->") {
        Some(off) => start + 4 + off + 3,
        None => content.len(),
    })
}
