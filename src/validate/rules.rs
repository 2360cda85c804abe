//! The validation rules.

use super::Report;
use crate::ir::{ContentDoc, ImagePosition, Slide, SlideKind, SCHEMA_VERSION};
use crate::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Title lengths beyond this are flagged as overflow risks.
const MAX_TITLE_LENGTH: usize = 80;
/// Item lengths beyond this are flagged as overflow risks.
const MAX_ITEM_LENGTH: usize = 150;
/// More items than this on one slide is flagged.
const MAX_ITEMS_PER_SLIDE: usize = 8;

/// Manual bullet symbols that must not appear at the start of an item;
/// the builder adds bullets itself.
const BULLET_SYMBOLS: [char; 11] = ['•', '・', '●', '○', '-', '*', '+', '◆', '◇', '▪', '▫'];

/// Title keywords that count as a summary/closing slide for the structure
/// check, regardless of the declared type.
const SUMMARY_KEYWORDS: [&str; 6] = ["まとめ", "summary", "結論", "conclusion", "おわりに", "closing"];

/// Alternate extensions probed when an image path does not resolve.
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Runs the deterministic rule set over a content document.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    images_dir: Option<PathBuf>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base directory against which relative image paths are resolved.
    /// Without it, image existence checks are skipped.
    pub fn with_images_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.images_dir = Some(dir.into());
        self
    }

    /// Load and validate a content.json file.
    ///
    /// Malformed JSON and object-shaped items are reported as findings
    /// rather than hard errors, so the orchestrator always gets a report.
    pub fn validate_file<P: AsRef<Path>>(&self, path: P) -> Result<Report> {
        let mut report = Report::new();
        let bytes = std::fs::read(path.as_ref())?;

        let value: Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(err) => {
                report.add_error("json", "file", format!("Invalid JSON: {err}"), None);
                return Ok(report);
            }
        };
        check_items_format(&value, &mut report);
        if !report.fatal_errors.is_empty() {
            return Ok(report);
        }

        match serde_json::from_value::<ContentDoc>(value) {
            Ok(doc) => {
                self.run_rules(&doc, &mut report);
                Ok(report)
            }
            Err(err) => {
                report.add_error("schema", "root", err.to_string(), None);
                Ok(report)
            }
        }
    }

    /// Validate an already-parsed document.
    pub fn validate(&self, doc: &ContentDoc) -> Report {
        let mut report = Report::new();
        self.run_rules(doc, &mut report);
        report
    }

    fn run_rules(&self, doc: &ContentDoc, report: &mut Report) {
        check_schema_version(&doc.schema_version, SCHEMA_VERSION, report);
        check_empty_content(doc, report);
        check_bullet_symbols(doc, report);
        if let Some(dir) = &self.images_dir {
            check_image_paths(doc, dir, report);
        }
        check_text_length(doc, report);
        check_structure(doc, report);
    }
}

fn parse_semver(version: &str) -> (u64, u64, u64) {
    let mut parts = version.split('.');
    let mut next = || parts.next().and_then(|p| p.parse().ok());
    match (next(), next(), next()) {
        (Some(major), Some(minor), Some(patch)) => (major, minor, patch),
        _ => (0, 0, 0),
    }
}

/// Major mismatch is a breaking change; a newer content minor only warns.
/// Patch differences are ignored.
fn check_schema_version(content_version: &str, schema_version: &str, report: &mut Report) {
    let content = parse_semver(content_version);
    let schema = parse_semver(schema_version);

    if content.0 != schema.0 {
        report.add_error(
            "schema_version",
            "schema_version",
            format!(
                "Major version mismatch: content={content_version}, schema={schema_version}"
            ),
            Some("Major version changes indicate breaking changes. Migrate the content.".into()),
        );
    } else if content.1 > schema.1 {
        report.add_warning(
            "schema_version",
            "schema_version",
            format!(
                "Content uses newer schema features: content={content_version}, schema={schema_version}"
            ),
            Some("Some features in this content may not be supported.".into()),
        );
    }
}

/// Items must be flat string arrays. Object-shaped entries belong only to
/// the preserve-method replacement files, never to content.json.
fn check_items_format(value: &Value, report: &mut Report) {
    let Some(slides) = value.get("slides").and_then(Value::as_array) else {
        return;
    };
    for (i, slide) in slides.iter().enumerate() {
        for list in ["items", "left_items", "right_items"] {
            let Some(entries) = slide.get(list).and_then(Value::as_array) else {
                continue;
            };
            for (j, entry) in entries.iter().enumerate() {
                if entry.is_object() {
                    report.add_error(
                        "items_format",
                        format!("slides[{i}].{list}[{j}]"),
                        "Item is an object but should be a string",
                        Some(format!(
                            "Use string array format: \"{list}\": [\"item1\", \"item2\"]"
                        )),
                    );
                    break; // report only the first occurrence per list
                }
            }
        }
    }
}

fn check_empty_content(doc: &ContentDoc, report: &mut Report) {
    for (i, slide) in doc.active_slides() {
        let location = format!("slides[{i}]");
        match slide.kind {
            SlideKind::Content => {
                if slide.items.is_empty() && slide.image.is_none() {
                    report.add_error(
                        "empty_content",
                        location,
                        format!("Content slide at index {i} has no items or image"),
                        Some("Add 'items' or 'image', or change type to 'section'".into()),
                    );
                }
            }
            SlideKind::Agenda | SlideKind::Summary => {
                if slide.items.is_empty() {
                    report.add_error(
                        "empty_content",
                        location,
                        format!("{} slide at index {i} has no items", slide.kind.as_str()),
                        Some("Add 'items' with the agenda/summary points".into()),
                    );
                }
            }
            SlideKind::Photo => {
                if slide.image.is_none() {
                    report.add_error(
                        "empty_content",
                        location,
                        format!("Photo slide at index {i} has no image"),
                        Some("Add 'image' with 'path' or 'url'".into()),
                    );
                }
            }
            SlideKind::Title | SlideKind::Section => {
                if slide.title_text().trim().is_empty() {
                    report.add_error(
                        "empty_content",
                        location,
                        format!("{} slide at index {i} has no title", slide.kind.as_str()),
                        Some("Add 'title'".into()),
                    );
                }
            }
            SlideKind::TwoColumn => {
                let has_columns = !slide.left_items.is_empty() || !slide.right_items.is_empty();
                if !has_columns && slide.items.is_empty() {
                    report.add_error(
                        "empty_content",
                        location,
                        format!("Two-column slide at index {i} has no content"),
                        Some("Add 'left_items'/'right_items' (recommended) or 'items'".into()),
                    );
                } else if !has_columns {
                    report.add_warning(
                        "two_column_format",
                        location,
                        "Two-column slide uses 'items' but 'left_items'/'right_items' is recommended",
                        Some(
                            "Use 'left_title'/'left_items'/'right_title'/'right_items' for a proper two-column layout"
                                .into(),
                        ),
                    );
                }
            }
            _ => {}
        }
    }
}

fn check_bullet_symbols(doc: &ContentDoc, report: &mut Report) {
    for (i, slide) in doc.active_slides() {
        for (j, item) in slide.items.iter().enumerate() {
            if let Some(symbol) = item.chars().next().filter(|c| BULLET_SYMBOLS.contains(c)) {
                report.add_error(
                    "bullet_symbol",
                    format!("slides[{i}].items[{j}]"),
                    format!("Manual bullet symbol '{symbol}' found at start of item"),
                    Some("Remove the symbol - bullets are added automatically".into()),
                );
                break; // report only the first occurrence per slide
            }
        }
    }
}

fn check_image_paths(doc: &ContentDoc, base_dir: &Path, report: &mut Report) {
    for (i, slide) in doc.active_slides() {
        let Some(image) = &slide.image else { continue };
        let Some(path) = &image.path else { continue };
        let resolved = base_dir.join(path);
        if resolved.exists() {
            continue;
        }

        // The extraction step sometimes saves under a different extension.
        let alternate = IMAGE_EXTENSIONS
            .iter()
            .map(|ext| resolved.with_extension(ext))
            .find(|candidate| candidate.exists());

        match alternate {
            Some(found) => report.add_warning(
                "image_path",
                format!("slides[{i}].image.path"),
                format!("Image not found at {path}, but found at {}", found.display()),
                Some(format!("Update path to '{}'", found.display())),
            ),
            None => report.add_error(
                "image_path",
                format!("slides[{i}].image.path"),
                format!("Image not found: {path}"),
                Some("Check the path or run the image extraction step first".into()),
            ),
        }
    }
}

fn check_text_length(doc: &ContentDoc, report: &mut Report) {
    for (i, slide) in doc.active_slides() {
        let title_len = slide.title_text().chars().count();
        if title_len > MAX_TITLE_LENGTH {
            report.add_warning(
                "overflow",
                format!("slides[{i}].title"),
                format!("Title length ({title_len}) exceeds {MAX_TITLE_LENGTH} characters"),
                Some("Consider shortening the title".into()),
            );
        }

        if slide.items.len() > MAX_ITEMS_PER_SLIDE {
            report.add_warning(
                "overflow",
                format!("slides[{i}].items"),
                format!(
                    "Too many items ({}) - recommend max {MAX_ITEMS_PER_SLIDE}",
                    slide.items.len()
                ),
                Some("Consider splitting into multiple slides".into()),
            );
        }

        for (j, item) in slide.items.iter().enumerate() {
            let len = item.chars().count();
            if len > MAX_ITEM_LENGTH {
                report.add_warning(
                    "overflow",
                    format!("slides[{i}].items[{j}]"),
                    format!("Item length ({len}) exceeds {MAX_ITEM_LENGTH} characters"),
                    Some("Consider shortening or splitting the item".into()),
                );
            }
        }
    }
}

fn has_summary_like_title(slide: &Slide) -> bool {
    let title = slide.title_text().to_lowercase();
    SUMMARY_KEYWORDS.iter().any(|keyword| title.contains(keyword))
}

fn check_structure(doc: &ContentDoc, report: &mut Report) {
    if doc.slides.is_empty() {
        report.add_error(
            "structure",
            "slides",
            "No slides found",
            Some("Add at least one slide".into()),
        );
        return;
    }

    if doc.slides[0].kind != SlideKind::Title {
        report.add_warning(
            "structure",
            "slides[0]",
            "First slide is not a title slide",
            Some("Consider adding a title slide at the beginning".into()),
        );
    }

    let total = doc.slides.len();
    if total >= 5 {
        if !doc.slides.iter().any(|s| s.kind == SlideKind::Agenda) {
            report.add_warning(
                "structure",
                "slides",
                "No agenda slide found in presentation with 5+ slides",
                Some("Consider adding an agenda slide after the title".into()),
            );
        }

        let has_summary = doc.slides.iter().any(|s| {
            s.kind == SlideKind::Summary || s.kind == SlideKind::Closing || has_summary_like_title(s)
        });
        if !has_summary {
            report.add_warning(
                "structure",
                "slides",
                "No summary or closing slide found",
                Some("Consider adding a summary or closing slide at the end".into()),
            );
        }
    }

    let photo_count = doc
        .slides
        .iter()
        .filter(|s| s.kind == SlideKind::Photo)
        .count();
    let photo_ratio = photo_count as f64 / total as f64;
    if photo_count >= 5 && photo_ratio > 0.2 {
        report.add_warning(
            "structure",
            "slides",
            format!(
                "Many photo slides detected ({photo_count}/{total} = {:.0}%)",
                photo_ratio * 100.0
            ),
            Some("Consider converting some to 'type: content' with an image field".into()),
        );
    }

    for (i, slide) in doc.slides.iter().enumerate() {
        if slide.kind != SlideKind::Photo {
            continue;
        }
        if let Some(image) = &slide.image
            && image.position == ImagePosition::Center
            && image.width_percent > 60
        {
            report.add_warning(
                "layout",
                format!("slides[{i}]"),
                format!(
                    "Photo slide with center position and high width_percent ({}%) may overflow",
                    image.width_percent
                ),
                Some("Reduce width_percent to 50-60% or use position: right".into()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ImageRef;
    use crate::validate::Status;

    fn slide(kind: SlideKind, title: &str, items: &[&str]) -> Slide {
        Slide {
            kind,
            title: Some(title.to_string()),
            items: items.iter().map(|s| s.to_string()).collect(),
            ..Slide::default()
        }
    }

    fn small_valid_doc() -> ContentDoc {
        let mut doc = ContentDoc::new("Deck");
        doc.slides.push(slide(SlideKind::Title, "Deck", &[]));
        doc.slides.push(slide(SlideKind::Content, "Body", &["point"]));
        doc
    }

    #[test]
    fn test_valid_doc_passes() {
        let report = Validator::new().validate(&small_valid_doc());
        assert_eq!(report.status(), Status::Pass);
    }

    #[test]
    fn test_content_without_items_fails() {
        let mut doc = small_valid_doc();
        doc.slides[1].items.clear();
        let report = Validator::new().validate(&doc);
        assert_eq!(report.status(), Status::Fail);
        assert_eq!(report.fatal_errors[0].rule, "empty_content");
    }

    #[test]
    fn test_skip_flag_exempts_slide() {
        let mut doc = small_valid_doc();
        doc.slides[1].items.clear();
        doc.slides[1].skip = true;
        let report = Validator::new().validate(&doc);
        assert_eq!(report.status(), Status::Pass);
    }

    #[test]
    fn test_two_column_items_only_warns() {
        let mut doc = small_valid_doc();
        doc.slides.push(slide(SlideKind::TwoColumn, "Compare", &["a"]));
        let report = Validator::new().validate(&doc);
        assert_eq!(report.status(), Status::Warn);
        assert!(report.warnings.iter().any(|f| f.rule == "two_column_format"));
    }

    #[test]
    fn test_two_column_without_content_fails() {
        let mut doc = small_valid_doc();
        doc.slides.push(slide(SlideKind::TwoColumn, "Compare", &[]));
        let report = Validator::new().validate(&doc);
        assert_eq!(report.status(), Status::Fail);
    }

    #[test]
    fn test_manual_bullet_symbol_fails() {
        let mut doc = small_valid_doc();
        doc.slides[1].items = vec!["• already bulleted".into()];
        let report = Validator::new().validate(&doc);
        assert!(report.fatal_errors.iter().any(|f| f.rule == "bullet_symbol"));
    }

    #[test]
    fn test_schema_major_mismatch_fails() {
        let mut doc = small_valid_doc();
        doc.schema_version = "2.0.0".into();
        let report = Validator::new().validate(&doc);
        assert!(report.fatal_errors.iter().any(|f| f.rule == "schema_version"));
    }

    #[test]
    fn test_schema_newer_minor_warns() {
        let mut doc = small_valid_doc();
        doc.schema_version = "1.5.0".into();
        let report = Validator::new().validate(&doc);
        assert_eq!(report.status(), Status::Warn);
    }

    #[test]
    fn test_long_title_warns() {
        let mut doc = small_valid_doc();
        doc.slides[1].title = Some("x".repeat(81));
        let report = Validator::new().validate(&doc);
        assert!(report.warnings.iter().any(|f| f.rule == "overflow"));
    }

    #[test]
    fn test_structure_warnings_for_large_deck() {
        let mut doc = ContentDoc::new("Deck");
        for i in 0..6 {
            doc.slides
                .push(slide(SlideKind::Content, &format!("S{i}"), &["x"]));
        }
        let report = Validator::new().validate(&doc);
        let rules: Vec<&str> = report.warnings.iter().map(|f| f.rule).collect();
        assert!(rules.contains(&"structure"));
        // first slide not title + no agenda + no summary
        assert!(report.warnings.len() >= 3);
    }

    #[test]
    fn test_centered_wide_photo_warns() {
        let mut doc = small_valid_doc();
        let mut photo = slide(SlideKind::Photo, "Shot", &[]);
        photo.image = Some(ImageRef {
            path: Some("images/a.png".into()),
            url: None,
            position: ImagePosition::Center,
            width_percent: 80,
            height_percent: 50,
        });
        doc.slides.push(photo);
        let report = Validator::new().validate(&doc);
        assert!(report.warnings.iter().any(|f| f.rule == "layout"));
    }

    #[test]
    fn test_image_path_alternate_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("images")).unwrap();
        std::fs::write(dir.path().join("images/shot.jpg"), b"fake").unwrap();

        let mut doc = small_valid_doc();
        doc.slides[1].image = Some(ImageRef::from_path("images/shot.png"));
        let report = Validator::new().with_images_dir(dir.path()).validate(&doc);
        assert!(report.warnings.iter().any(|f| f.rule == "image_path"));
        assert!(report.fatal_errors.is_empty());
    }

    #[test]
    fn test_missing_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = small_valid_doc();
        doc.slides[1].image = Some(ImageRef::from_path("images/nope.png"));
        let report = Validator::new().with_images_dir(dir.path()).validate(&doc);
        assert!(report.fatal_errors.iter().any(|f| f.rule == "image_path"));
    }

    #[test]
    fn test_object_items_reported_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.json");
        std::fs::write(
            &path,
            r#"{"slides":[{"type":"content","items":[{"text":"a","bullet":true}]}]}"#,
        )
        .unwrap();
        let report = Validator::new().validate_file(&path).unwrap();
        assert!(report.fatal_errors.iter().any(|f| f.rule == "items_format"));
    }
}
