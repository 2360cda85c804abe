//! The content document: an ordered sequence of slide records.

use super::Slide;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Schema version the current crate writes and validates against.
pub const SCHEMA_VERSION: &str = "1.0.0";

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// A complete content document ("content.json").
///
/// Created once by the extraction phase, optionally rewritten by the
/// translation/summarization phase, consumed once by the build phase.
///
/// # Examples
///
/// ```rust
/// use deckforge::ir::{ContentDoc, Slide, SlideKind};
///
/// let mut doc = ContentDoc::new("Quarterly Report");
/// doc.slides.push(Slide::new(SlideKind::Title, "Quarterly Report"));
/// doc.slides.push(Slide::new(SlideKind::Content, "Highlights"));
/// assert_eq!(doc.slides.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentDoc {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub slides: Vec<Slide>,
}

impl ContentDoc {
    /// Create an empty document with the current schema version.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            schema_version: default_schema_version(),
            title: Some(title.into()),
            slides: Vec::new(),
        }
    }

    /// Load a content document from a JSON file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_slice(&bytes)
    }

    /// Parse a content document from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(Error::from)
    }

    /// Serialize to pretty-printed JSON and write to a file, creating
    /// parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Slides that are not marked `_skip`.
    pub fn active_slides(&self) -> impl Iterator<Item = (usize, &Slide)> {
        self.slides
            .iter()
            .enumerate()
            .filter(|(_, slide)| !slide.skip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::SlideKind;

    #[test]
    fn test_default_schema_version_applied() {
        let doc: ContentDoc = serde_json::from_str(r#"{"slides":[]}"#).unwrap();
        assert_eq!(doc.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn test_save_and_open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest/content.json");

        let mut doc = ContentDoc::new("Deck");
        doc.slides.push(Slide::new(SlideKind::Title, "Deck"));
        doc.save(&path).unwrap();

        let loaded = ContentDoc::open(&path).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_active_slides_skips_marked() {
        let mut doc = ContentDoc::new("Deck");
        doc.slides.push(Slide::new(SlideKind::Title, "Deck"));
        let mut hidden = Slide::new(SlideKind::Content, "Backup");
        hidden.skip = true;
        doc.slides.push(hidden);

        let active: Vec<usize> = doc.active_slides().map(|(i, _)| i).collect();
        assert_eq!(active, vec![0]);
    }
}
