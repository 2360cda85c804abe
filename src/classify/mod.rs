//! Deterministic input classification and method routing.
//!
//! Routing needs no judgment calls: the kind of source material decides
//! the processing method and its workflow step list, and the source name
//! seeds the base name every later artifact is keyed by.

use crate::builder::text_frames;
use crate::naming::{BaseName, Purpose, extract_keyword};
use crate::template::TemplatePackage;
use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// English-letter ratio at or above which deck text counts as English.
const ENGLISH_RATIO: f64 = 0.7;
/// Below this ratio the deck counts as Japanese.
const JAPANESE_RATIO: f64 = 0.3;
/// Confidence reported when language detection does not apply.
const DEFAULT_CONFIDENCE: f64 = 0.8;

/// The kind of source material the pipeline was pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    PptxEn,
    PptxJa,
    PptxMixed,
    Markdown,
    Json,
    Text,
    Image,
    Url,
    Unknown,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::PptxEn => "pptx_en",
            InputKind::PptxJa => "pptx_ja",
            InputKind::PptxMixed => "pptx_mixed",
            InputKind::Markdown => "markdown",
            InputKind::Json => "json",
            InputKind::Text => "text",
            InputKind::Image => "image",
            InputKind::Url => "url",
            InputKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publishing platform behind a URL input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Qiita,
    Zenn,
    Github,
    Microsoft,
    Web,
}

impl Platform {
    pub fn detect(url: &str) -> Self {
        if url.contains("qiita.com") {
            Platform::Qiita
        } else if url.contains("zenn.dev") {
            Platform::Zenn
        } else if url.contains("github.com") || url.contains("github.io") {
            Platform::Github
        } else if url.contains("microsoft.com") || url.contains("azure.com") {
            Platform::Microsoft
        } else {
            Platform::Web
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Qiita => "qiita",
            Platform::Zenn => "zenn",
            Platform::Github => "github",
            Platform::Microsoft => "microsoft",
            Platform::Web => "web",
        }
    }
}

/// Recommended processing method for an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Translate and rebuild on the source deck's own template.
    Reconstruct,
    /// Analysis only; the deck is already in the target language.
    AnalyzeOnly,
    /// Draft a content document from scratch and build.
    CreateNew,
    /// No automatic route.
    Manual,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Reconstruct => "reconstruct",
            Method::AnalyzeOnly => "analyze_only",
            Method::CreateNew => "create_new",
            Method::Manual => "manual",
        }
    }
}

/// Primary language of a deck's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckLanguage {
    English,
    Japanese,
    Mixed,
}

impl DeckLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeckLanguage::English => "en",
            DeckLanguage::Japanese => "ja",
            DeckLanguage::Mixed => "mixed",
        }
    }
}

/// Classification manifest consumed by the orchestrating agent.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub input_type: InputKind,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_count: Option<usize>,
    pub recommended_method: Method,
    pub reasoning: String,
    pub workflow: Vec<String>,
    pub base_name: String,
    pub confidence: f64,
}

impl Classification {
    /// Write the manifest as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Ratio of ASCII letters among all letters in `text`.
///
/// Non-letter characters (digits, punctuation, whitespace) are ignored so
/// code-heavy decks do not skew toward English.
pub fn english_ratio(text: &str) -> f64 {
    let mut ascii = 0usize;
    let mut total = 0usize;
    for c in text.chars() {
        if c.is_alphabetic() {
            total += 1;
            if c.is_ascii() {
                ascii += 1;
            }
        }
    }
    if total == 0 {
        0.0
    } else {
        ascii as f64 / total as f64
    }
}

/// Detect the primary language of a deck from its slide text.
///
/// Returns the language, a confidence in 0..=1, and the slide count.
pub fn detect_deck_language(path: impl AsRef<Path>) -> Result<(DeckLanguage, f64, usize)> {
    let package = TemplatePackage::open(path)?;
    let slide_parts = package.slide_paths()?;

    let mut combined = String::new();
    for part in &slide_parts {
        let xml = package.get_text(part)?;
        for frame in text_frames(&xml)? {
            if !combined.is_empty() {
                combined.push(' ');
            }
            combined.push_str(&frame.text);
        }
    }

    let ratio = english_ratio(&combined);
    let (language, confidence) = if ratio >= ENGLISH_RATIO {
        (DeckLanguage::English, ratio)
    } else if ratio < JAPANESE_RATIO {
        (DeckLanguage::Japanese, 1.0 - ratio)
    } else {
        (DeckLanguage::Mixed, 0.5)
    };
    Ok((language, confidence, slide_parts.len()))
}

/// Classify an input path or URL and pick a processing route.
///
/// # Examples
///
/// ```no_run
/// use deckforge::classify::classify;
/// use deckforge::naming::Purpose;
///
/// let result = classify("input/quarterly_review.pptx", Purpose::Report)?;
/// println!("{} -> {}", result.input_type, result.recommended_method.as_str());
/// # Ok::<(), deckforge::Error>(())
/// ```
pub fn classify(input: &str, purpose: Purpose) -> Result<Classification> {
    if input.starts_with("http://") || input.starts_with("https://") {
        let platform = Platform::detect(input);
        let (method, reasoning, workflow) = route(InputKind::Url, Some(platform));
        return Ok(Classification {
            input_type: InputKind::Url,
            source: input.to_string(),
            platform: Some(platform),
            language: None,
            slide_count: None,
            recommended_method: method,
            reasoning,
            workflow,
            base_name: base_name_for(input, purpose)?.to_string(),
            confidence: DEFAULT_CONFIDENCE,
        });
    }

    let path = Path::new(input);
    if !path.exists() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input not found: {input}"),
        )));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let mut language = None;
    let mut slide_count = None;
    let mut confidence = DEFAULT_CONFIDENCE;
    let kind = match extension.as_str() {
        "pptx" => {
            let (lang, conf, slides) = detect_deck_language(path)?;
            language = Some(lang.as_str().to_string());
            slide_count = Some(slides);
            confidence = conf;
            match lang {
                DeckLanguage::English => InputKind::PptxEn,
                DeckLanguage::Japanese => InputKind::PptxJa,
                DeckLanguage::Mixed => InputKind::PptxMixed,
            }
        },
        "md" | "markdown" => InputKind::Markdown,
        "json" => InputKind::Json,
        "txt" | "text" => InputKind::Text,
        "png" | "jpg" | "jpeg" | "gif" | "webp" => InputKind::Image,
        _ => InputKind::Unknown,
    };

    let (method, reasoning, workflow) = route(kind, None);
    Ok(Classification {
        input_type: kind,
        source: input.to_string(),
        platform: None,
        language,
        slide_count,
        recommended_method: method,
        reasoning,
        workflow,
        base_name: base_name_for(input, purpose)?.to_string(),
        confidence,
    })
}

/// Method, reasoning, and workflow steps for a classified input.
fn route(kind: InputKind, platform: Option<Platform>) -> (Method, String, Vec<String>) {
    let steps = |names: &[&str]| names.iter().map(|s| (*s).to_string()).collect();
    match kind {
        InputKind::PptxEn => (
            Method::Reconstruct,
            "English deck detected: preserve the slide master and rebuild with translated text"
                .to_string(),
            steps(&["analyze", "extract-images", "summarize", "localize", "build"]),
        ),
        InputKind::PptxJa => (
            Method::AnalyzeOnly,
            "Japanese deck detected: analysis or minor edits only".to_string(),
            steps(&["analyze", "summarize"]),
        ),
        InputKind::Url => {
            let platform = platform.unwrap_or(Platform::Web);
            (
                Method::CreateNew,
                format!(
                    "web content from {}: build a new deck from the article",
                    platform.as_str()
                ),
                steps(&["fetch-article", "extract-images", "draft-content", "build"]),
            )
        },
        InputKind::Markdown => (
            Method::CreateNew,
            "Markdown source: draft a content document and build".to_string(),
            steps(&["parse-markdown", "draft-content", "build"]),
        ),
        other => (
            Method::Manual,
            format!("no automatic route for input type: {other}"),
            Vec::new(),
        ),
    }
}

/// Base name derived from the source file stem or URL path.
fn base_name_for(source: &str, purpose: Purpose) -> Result<BaseName> {
    // Query parameters never contribute to the keyword.
    let trimmed = source.split('?').next().unwrap_or(source);
    let stem = Path::new(trimmed)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    BaseName::today(&extract_keyword(stem), purpose)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DeckBuilder;
    use crate::ir::{ContentDoc, Slide, SlideKind};

    #[test]
    fn test_english_ratio() {
        assert_eq!(english_ratio(""), 0.0);
        assert_eq!(english_ratio("123 !!"), 0.0);
        assert!(english_ratio("Hello World") > 0.99);
        assert!(english_ratio("こんにちは世界") < 0.01);
        let mixed = english_ratio("Azure 入門ガイド");
        assert!(mixed > 0.3 && mixed < 0.7);
    }

    #[test]
    fn test_url_platform_routing() {
        let result = classify("https://qiita.com/user/items/abc123", Purpose::Blog).unwrap();
        assert_eq!(result.input_type, InputKind::Url);
        assert_eq!(result.platform, Some(Platform::Qiita));
        assert_eq!(result.recommended_method, Method::CreateNew);
        assert!(result.base_name.ends_with("_blog"));

        assert_eq!(
            Platform::detect("https://zenn.dev/user/articles/x"),
            Platform::Zenn
        );
        assert_eq!(
            Platform::detect("https://learn.microsoft.com/azure"),
            Platform::Microsoft
        );
        assert_eq!(Platform::detect("https://example.com/post"), Platform::Web);
    }

    #[test]
    fn test_missing_file_is_io_not_found() {
        let err = classify("no_such_file.pptx", Purpose::Report).unwrap_err();
        match err {
            Error::Io(io) => assert_eq!(io.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_markdown_routes_to_create_new() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("branch_strategy_notes.md");
        std::fs::write(&path, "# Notes\n").unwrap();

        let result = classify(path.to_str().unwrap(), Purpose::Report).unwrap();
        assert_eq!(result.input_type, InputKind::Markdown);
        assert_eq!(result.recommended_method, Method::CreateNew);
        assert!(result.base_name.contains("branch_strategy_notes"));
    }

    #[test]
    fn test_unknown_extension_is_manual() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.key");
        std::fs::write(&path, b"x").unwrap();

        let result = classify(path.to_str().unwrap(), Purpose::Report).unwrap();
        assert_eq!(result.input_type, InputKind::Unknown);
        assert_eq!(result.recommended_method, Method::Manual);
        assert!(result.workflow.is_empty());
    }

    fn build_deck(title: &str, items: &[&str]) -> Vec<u8> {
        let mut doc = ContentDoc::new(title);
        let mut slide = Slide::new(SlideKind::Content, title);
        slide.items = items.iter().map(|s| (*s).to_string()).collect();
        doc.slides.push(slide);
        DeckBuilder::new().build_to_bytes(&doc).unwrap().0
    }

    #[test]
    fn test_english_deck_classified_for_reconstruction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quarterly_review.pptx");
        std::fs::write(
            &path,
            build_deck("Overview", &["Revenue grew steadily", "Churn remained flat"]),
        )
        .unwrap();

        let result = classify(path.to_str().unwrap(), Purpose::Report).unwrap();
        assert_eq!(result.input_type, InputKind::PptxEn);
        assert_eq!(result.recommended_method, Method::Reconstruct);
        assert_eq!(result.language.as_deref(), Some("en"));
        assert_eq!(result.slide_count, Some(1));
        assert!(result.confidence >= 0.7);
    }

    #[test]
    fn test_japanese_deck_classified_as_analyze_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("進捗まとめ.pptx");
        std::fs::write(
            &path,
            build_deck("進捗まとめ", &["売上は前年比で増加", "解約率は横ばい"]),
        )
        .unwrap();

        let result = classify(path.to_str().unwrap(), Purpose::Report).unwrap();
        assert_eq!(result.input_type, InputKind::PptxJa);
        assert_eq!(result.recommended_method, Method::AnalyzeOnly);
        assert_eq!(result.language.as_deref(), Some("ja"));
    }
}
