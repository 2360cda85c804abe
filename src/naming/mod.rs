//! Naming convention and workspace directory layout.
//!
//! Every artifact the pipeline produces is keyed by a base name following
//! the `{YYYYMMDD}_{keyword}_{purpose}` convention, and lives under one of
//! the conventional directories (`input/`, `output_manifest/`,
//! `output_ppt/`, `images/{base}/`).

use crate::{Error, Result};
use chrono::{Local, NaiveDate};
use std::fmt;
use std::path::{Path, PathBuf};

/// Japanese title keywords mapped to the English keyword used in file names.
static KEYWORD_MAPPINGS: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "売上" => "sales",
    "報告" => "report",
    "進捗" => "progress",
    "企画" => "proposal",
    "提案" => "proposal",
    "障害" => "incident",
    "ブランチ" => "branch",
    "ツール" => "tool",
    "紹介" => "intro",
    "新機能" => "new_feature",
    "入門" => "intro",
    "比較" => "comparison",
    "やってみた" => "trying",
    "まとめ" => "summary",
    "解説" => "explanation",
    "セキュリティ" => "security",
    "データ" => "data",
    "分析" => "analysis",
    "設計" => "design",
    "実装" => "implementation",
};

/// Maximum keyword length after sanitization.
const MAX_KEYWORD_LEN: usize = 30;

/// The documented purposes a deck can be produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Purpose {
    #[default]
    Report,
    Lt,
    Incident,
    Blog,
    Custom,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::Report => "report",
            Purpose::Lt => "lt",
            Purpose::Incident => "incident",
            Purpose::Blog => "blog",
            Purpose::Custom => "custom",
        }
    }
}

impl std::str::FromStr for Purpose {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "report" => Ok(Purpose::Report),
            "lt" => Ok(Purpose::Lt),
            "incident" => Ok(Purpose::Incident),
            "blog" => Ok(Purpose::Blog),
            "custom" => Ok(Purpose::Custom),
            other => Err(Error::InvalidName(format!("unknown purpose: {other}"))),
        }
    }
}

/// A `{YYYYMMDD}_{keyword}_{purpose}` base name.
///
/// # Examples
///
/// ```rust
/// use deckforge::naming::{BaseName, Purpose};
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2025, 12, 14).unwrap();
/// let name = BaseName::with_date(date, "branch_strategy", Purpose::Report).unwrap();
/// assert_eq!(name.to_string(), "20251214_branch_strategy_report");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseName {
    date: NaiveDate,
    keyword: String,
    purpose: Purpose,
}

impl BaseName {
    /// Build a base name dated today.
    pub fn today(keyword: &str, purpose: Purpose) -> Result<Self> {
        Self::with_date(Local::now().date_naive(), keyword, purpose)
    }

    /// Build a base name with an explicit date.
    pub fn with_date(date: NaiveDate, keyword: &str, purpose: Purpose) -> Result<Self> {
        let keyword = sanitize_keyword(keyword);
        if keyword.is_empty() {
            return Err(Error::InvalidName(
                "keyword is empty after sanitization".into(),
            ));
        }
        Ok(Self {
            date,
            keyword,
            purpose,
        })
    }

    /// Parse a `{YYYYMMDD}_{keyword}_{purpose}` string.
    pub fn parse(name: &str) -> Result<Self> {
        let (date_part, rest) = name
            .split_once('_')
            .ok_or_else(|| Error::InvalidName(format!("missing date segment: {name}")))?;
        let date = NaiveDate::parse_from_str(date_part, "%Y%m%d")
            .map_err(|_| Error::InvalidName(format!("invalid date segment: {date_part}")))?;
        let (keyword, purpose_part) = rest
            .rsplit_once('_')
            .ok_or_else(|| Error::InvalidName(format!("missing purpose segment: {name}")))?;
        let purpose: Purpose = purpose_part.parse()?;
        Self::with_date(date, keyword, purpose)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn purpose(&self) -> Purpose {
        self.purpose
    }
}

impl fmt::Display for BaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.date.format("%Y%m%d"),
            self.keyword,
            self.purpose.as_str()
        )
    }
}

/// Extract an English keyword from a source title or file stem.
///
/// Known Japanese words map through a static table; otherwise up to three
/// significant ASCII words are joined; the fallback is "presentation".
pub fn extract_keyword(title: &str) -> String {
    for (jp, en) in KEYWORD_MAPPINGS.entries() {
        if title.contains(jp) {
            return (*en).to_string();
        }
    }

    let words: Vec<String> = title
        .split(|c: char| !c.is_ascii_alphabetic())
        .filter(|w| w.len() > 2)
        .take(3)
        .map(|w| w.to_lowercase())
        .collect();
    if !words.is_empty() {
        return words.join("_");
    }

    "presentation".to_string()
}

/// Lowercase, replace anything outside `[a-z0-9_]`, collapse repeated
/// underscores, trim, and cap the length.
pub fn sanitize_keyword(keyword: &str) -> String {
    let mut out = String::with_capacity(keyword.len());
    let mut last_was_underscore = false;
    for c in keyword.to_lowercase().chars() {
        let mapped = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            last_was_underscore = false;
            c
        } else if last_was_underscore {
            continue;
        } else {
            last_was_underscore = true;
            '_'
        };
        out.push(mapped);
    }
    let trimmed = out.trim_matches('_');
    let capped: String = trimmed.chars().take(MAX_KEYWORD_LEN).collect();
    // Truncation can land right after an underscore.
    capped.trim_end_matches('_').to_string()
}

/// The conventional directory layout around a pipeline run.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Source material dropped by the user. Never written to by the
    /// pipeline.
    pub fn input_dir(&self) -> PathBuf {
        self.root.join("input")
    }

    /// JSON manifests: content documents, layout mappings, traces.
    pub fn manifest_dir(&self) -> PathBuf {
        self.root.join("output_manifest")
    }

    /// Built presentations.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output_ppt")
    }

    /// Extracted images for one base name.
    pub fn images_dir(&self, base: &BaseName) -> PathBuf {
        self.root.join("images").join(base.to_string())
    }

    /// Manifest path for a suffix, e.g. `content.json` or `trace.jsonl`.
    pub fn manifest_path(&self, base: &BaseName, suffix: &str) -> PathBuf {
        self.manifest_dir().join(format!("{base}_{suffix}"))
    }

    /// Guard against outputs landing in `input/`.
    pub fn check_writable(&self, path: &Path) -> Result<()> {
        let input = self.input_dir();
        if path.starts_with(&input) {
            return Err(Error::ReservedDirectory(path.display().to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_base_name_parse_round_trip() {
        let name = BaseName::parse("20251214_branch_strategy_report").unwrap();
        assert_eq!(name.keyword(), "branch_strategy");
        assert_eq!(name.purpose(), Purpose::Report);
        assert_eq!(name.to_string(), "20251214_branch_strategy_report");
    }

    #[test]
    fn test_base_name_rejects_bad_date() {
        assert!(BaseName::parse("2025121_x_report").is_err());
        assert!(BaseName::parse("plain").is_err());
    }

    #[test]
    fn test_extract_keyword_japanese_mapping() {
        assert_eq!(extract_keyword("Git ブランチ戦略について"), "branch");
        assert_eq!(extract_keyword("セキュリティ強化"), "security");
    }

    #[test]
    fn test_extract_keyword_english_words() {
        assert_eq!(extract_keyword("Intro to Azure Functions"), "intro_azure_functions");
    }

    #[test]
    fn test_extract_keyword_fallback() {
        assert_eq!(extract_keyword("第1章"), "presentation");
    }

    #[test]
    fn test_sanitize_collapses_and_caps() {
        assert_eq!(sanitize_keyword("Hello  World!!"), "hello_world");
        assert_eq!(sanitize_keyword("__x__"), "x");
        assert!(sanitize_keyword(&"a".repeat(64)).len() <= MAX_KEYWORD_LEN);
    }

    #[test]
    fn test_workspace_guards_input_dir() {
        let ws = Workspace::new("/tmp/work");
        assert!(ws.check_writable(Path::new("/tmp/work/output_ppt/a.pptx")).is_ok());
        assert!(ws.check_writable(Path::new("/tmp/work/input/a.pptx")).is_err());
    }

    proptest! {
        #[test]
        fn prop_sanitized_keyword_is_always_clean(s in ".*") {
            let out = sanitize_keyword(&s);
            prop_assert!(out.len() <= MAX_KEYWORD_LEN);
            prop_assert!(!out.starts_with('_') && !out.ends_with('_'));
            prop_assert!(out.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
            prop_assert!(!out.contains("__"));
        }
    }
}
