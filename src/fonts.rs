//! Font registrations shared by every render of a [`Canvas`](crate::Canvas).

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// CSS numeric font weight, 100 through 900.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct FontWeight(u16);

impl FontWeight {
    pub const THIN: FontWeight = FontWeight(100);
    pub const NORMAL: FontWeight = FontWeight(400);
    pub const BOLD: FontWeight = FontWeight(700);
    pub const BLACK: FontWeight = FontWeight(900);

    /// Only multiples of 100 in `100..=900` are valid.
    pub fn new(weight: u16) -> Option<Self> {
        if (100..=900).contains(&weight) && weight % 100 == 0 {
            Some(FontWeight(weight))
        } else {
            None
        }
    }

    pub fn value(self) -> u16 {
        self.0
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        FontWeight::NORMAL
    }
}

impl TryFrom<u16> for FontWeight {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        FontWeight::new(value)
            .ok_or_else(|| Error::ConfigError(format!("font weight {} is not one of 100..900", value)))
    }
}

impl From<FontWeight> for u16 {
    fn from(weight: FontWeight) -> u16 {
        weight.0
    }
}

impl fmt::Display for FontWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

impl FontStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
        }
    }
}

impl FromStr for FontStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal" => Ok(FontStyle::Normal),
            "italic" => Ok(FontStyle::Italic),
            other => Err(Error::ConfigError(format!("unknown font style '{}'", other))),
        }
    }
}

/// A font face passed to the layout engine and rasterizer.
#[derive(Clone, PartialEq)]
pub struct FontEntry {
    pub family: String,
    pub weight: FontWeight,
    pub style: FontStyle,
    /// Raw TTF/OTF/WOFF bytes, shared between clones
    pub data: Arc<[u8]>,
}

impl FontEntry {
    /// A regular (400, normal) face.
    pub fn new(family: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            family: family.into(),
            weight: FontWeight::default(),
            style: FontStyle::default(),
            data: data.into(),
        }
    }

    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }

    /// Registry key, `family|weight|style`.
    pub fn key(&self) -> String {
        format!("{}|{}|{}", self.family, self.weight, self.style.as_str())
    }
}

impl fmt::Debug for FontEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontEntry")
            .field("family", &self.family)
            .field("weight", &self.weight)
            .field("style", &self.style)
            .field("data_len", &self.data.len())
            .finish()
    }
}

/// Per-canvas font cache keyed by (family, weight, style).
///
/// Registration order is preserved. Reads and writes take the same lock, so
/// a render snapshots the registry atomically even while another thread
/// registers fonts.
#[derive(Debug, Default)]
pub struct FontRegistry {
    entries: Mutex<Vec<FontEntry>>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<FontEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a face, replacing any face registered under the same key.
    pub fn register(&self, entry: FontEntry) {
        let key = entry.key();
        let mut entries = self.lock();
        match entries.iter_mut().find(|e| e.key() == key) {
            Some(existing) => {
                debug!("replacing registered font {}", key);
                *existing = entry;
            }
            None => entries.push(entry),
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Explicit fonts first, then registered faces whose family and weight
    /// are not already present in `explicit`.
    pub fn merged_font_list(&self, explicit: &[FontEntry]) -> Vec<FontEntry> {
        let mut merged = explicit.to_vec();
        append_unshadowed(&mut merged, &self.lock());
        merged
    }
}

/// Push every face of `extra` whose family and weight are not in `list` yet.
pub(crate) fn append_unshadowed(list: &mut Vec<FontEntry>, extra: &[FontEntry]) {
    let known = list.len();
    for font in extra {
        let shadowed = list[..known]
            .iter()
            .any(|f| f.family == font.family && f.weight == font.weight);
        if !shadowed {
            list.push(font.clone());
        }
    }
}
