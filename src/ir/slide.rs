//! Slide records and their field types.

use serde::{Deserialize, Serialize};

/// Semantic slide type.
///
/// The tag drives both layout selection against a template and the type
/// dispatch in the deck builder. The set mirrors the layout categories the
/// template analyzer can recognize, so every kind can be mapped to a layout
/// index after fallback resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideKind {
    Title,
    Content,
    Section,
    TwoColumn,
    Photo,
    Summary,
    Closing,
    Agenda,
    Code,
    Quote,
    Blank,
    TitleOnly,
}

impl SlideKind {
    /// All kinds, in the order the layout mapping manifest lists them.
    pub const ALL: [SlideKind; 12] = [
        SlideKind::Title,
        SlideKind::Content,
        SlideKind::Section,
        SlideKind::TwoColumn,
        SlideKind::Photo,
        SlideKind::Summary,
        SlideKind::Closing,
        SlideKind::Agenda,
        SlideKind::Code,
        SlideKind::Quote,
        SlideKind::Blank,
        SlideKind::TitleOnly,
    ];

    /// Stable snake_case name used in manifests and findings.
    pub fn as_str(&self) -> &'static str {
        match self {
            SlideKind::Title => "title",
            SlideKind::Content => "content",
            SlideKind::Section => "section",
            SlideKind::TwoColumn => "two_column",
            SlideKind::Photo => "photo",
            SlideKind::Summary => "summary",
            SlideKind::Closing => "closing",
            SlideKind::Agenda => "agenda",
            SlideKind::Code => "code",
            SlideKind::Quote => "quote",
            SlideKind::Blank => "blank",
            SlideKind::TitleOnly => "title_only",
        }
    }
}

impl Default for SlideKind {
    fn default() -> Self {
        SlideKind::Content
    }
}

/// Where an image is placed relative to the slide's text area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImagePosition {
    /// Image on the right, text flows on the left.
    #[default]
    Right,
    /// Image along the bottom, text above.
    Bottom,
    /// Image fills the slide body; no text area remains.
    Full,
    /// Image centered in the body.
    Center,
}

fn default_width_percent() -> u8 {
    45
}

fn default_height_percent() -> u8 {
    50
}

/// Reference to an image placed on a slide.
///
/// Exactly one of `path` (relative to the workspace images directory) or
/// `url` is expected; when both are present the local path wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub position: ImagePosition,
    #[serde(default = "default_width_percent")]
    pub width_percent: u8,
    #[serde(default = "default_height_percent")]
    pub height_percent: u8,
}

impl ImageRef {
    /// Create a reference to a local image file.
    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            url: None,
            position: ImagePosition::default(),
            width_percent: default_width_percent(),
            height_percent: default_height_percent(),
        }
    }
}

/// One slide record in the content document.
///
/// Free-text fields are plain strings; `items` and the column item lists are
/// always flat string sequences. Legacy documents that used `content` or
/// `content_ja` for the item list are accepted on input and normalized to
/// `items` on output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    #[serde(rename = "type", default)]
    pub kind: SlideKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(
        default,
        alias = "content",
        alias = "content_ja",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub items: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub left_items: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub right_items: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    /// Marked slides are carried through edits but skipped by validation
    /// and the builder.
    #[serde(rename = "_skip", default, skip_serializing_if = "std::ops::Not::not")]
    pub skip: bool,
}

impl Slide {
    /// Create a slide of the given kind with a title.
    pub fn new(kind: SlideKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Title text, or an empty string when absent.
    pub fn title_text(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// Whether the slide carries any body content (items, columns or image).
    pub fn has_body(&self) -> bool {
        !self.items.is_empty()
            || !self.left_items.is_empty()
            || !self.right_items.is_empty()
            || self.image.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_kind_round_trip() {
        for kind in SlideKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            let back: SlideKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn test_items_aliases_accepted() {
        let slide: Slide =
            serde_json::from_str(r#"{"type":"content","content_ja":["a","b"]}"#).unwrap();
        assert_eq!(slide.items, vec!["a", "b"]);

        let slide: Slide = serde_json::from_str(r#"{"type":"content","content":["x"]}"#).unwrap();
        assert_eq!(slide.items, vec!["x"]);
    }

    #[test]
    fn test_image_defaults() {
        let image: ImageRef = serde_json::from_str(r#"{"path":"images/a.png"}"#).unwrap();
        assert_eq!(image.position, ImagePosition::Right);
        assert_eq!(image.width_percent, 45);
        assert_eq!(image.height_percent, 50);
    }

    #[test]
    fn test_skip_flag_serialization() {
        let slide = Slide::new(SlideKind::Content, "t");
        let json = serde_json::to_value(&slide).unwrap();
        assert!(json.get("_skip").is_none());

        let skipped: Slide = serde_json::from_str(r#"{"type":"content","_skip":true}"#).unwrap();
        assert!(skipped.skip);
    }
}
