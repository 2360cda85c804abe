//! Deck assembly from a content document.

use super::colors::{DARK_GRAY, PURPLE, WHITE};
use super::text::{optimal_font_size, overflow_warning};
use super::xml::{
    Paragraph, SLIDE_CX, SLIDE_CY, blank_layout_part, blank_layout_rels, content_types,
    core_props_part, inches, picture, presentation_part, presentation_rels, root_rels,
    slide_master_part, slide_master_rels, slide_part, slide_rels, solid_rect, text_box,
    theme_part,
};
use crate::images::ImageMeta;
use crate::ir::{ContentDoc, ImagePosition, ImageRef, Slide, SlideKind};
use crate::Result;
use log::{info, warn};
use serde::Serialize;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::{SimpleFileOptions, ZipWriter};

const SLIDE_W_IN: f64 = 13.333;
const SLIDE_H_IN: f64 = 7.5;

/// Outcome of a build run.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub slides: usize,
    /// Slides whose type was corrected before building.
    pub auto_fixed: usize,
    pub warnings: Vec<String>,
}

/// Text area remaining on a slide after image placement, in inches.
#[derive(Debug, Clone, Copy)]
struct ContentArea {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl ContentArea {
    const DEFAULT: ContentArea = ContentArea {
        left: 0.5,
        top: 1.5,
        width: 12.333,
        height: 5.5,
    };
}

/// An image resolved to bytes, with its placement geometry.
struct ResolvedImage {
    bytes: Vec<u8>,
    extension: &'static str,
    x: i64,
    y: i64,
    cx: i64,
    cy: i64,
}

/// Builds a self-contained 16:9 presentation from the IR.
///
/// # Examples
///
/// ```no_run
/// # use deckforge::builder::DeckBuilder;
/// # use deckforge::ir::ContentDoc;
/// # use deckforge::Result;
/// # fn example(doc: &ContentDoc) -> Result<()> {
/// let report = DeckBuilder::new()
///     .with_images_dir("images/20251214_branch_strategy_report")
///     .build(doc, "output_ppt/20251214_branch_strategy_report.pptx")?;
/// println!("{} slides", report.slides);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct DeckBuilder {
    images_dir: Option<PathBuf>,
    auto_shrink: bool,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self {
            images_dir: None,
            auto_shrink: true,
        }
    }

    /// Base directory for resolving relative image paths.
    #[inline]
    pub fn with_images_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.images_dir = Some(dir.into());
        self
    }

    /// Disable automatic font shrinking for overflowing text.
    #[inline]
    pub fn with_auto_shrink(mut self, enabled: bool) -> Self {
        self.auto_shrink = enabled;
        self
    }

    /// Build the deck and write it to `output`.
    pub fn build(&self, doc: &ContentDoc, output: impl AsRef<Path>) -> Result<BuildReport> {
        let (bytes, report) = self.build_to_bytes(doc)?;
        let output = output.as_ref();
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output, bytes)?;
        info!("saved {} ({} slides)", output.display(), report.slides);
        Ok(report)
    }

    /// Build the deck into memory.
    pub fn build_to_bytes(&self, doc: &ContentDoc) -> Result<(Vec<u8>, BuildReport)> {
        let mut report = BuildReport {
            slides: 0,
            auto_fixed: 0,
            warnings: Vec::new(),
        };

        // A closing slide with a full item list is a content slide that
        // was mislabeled; correct it instead of rendering a bare ending.
        let slides: Vec<Slide> = doc
            .active_slides()
            .map(|(_, slide)| {
                let mut slide = slide.clone();
                if slide.kind == SlideKind::Closing && slide.items.len() > 1 {
                    warn!(
                        "closing slide '{}' has {} items; converting to content",
                        slide.title_text(),
                        slide.items.len()
                    );
                    slide.kind = SlideKind::Content;
                    report.auto_fixed += 1;
                }
                slide
            })
            .collect();

        let mut media: Vec<(String, Vec<u8>)> = Vec::new();
        let mut slide_parts: Vec<(String, Vec<(String, String)>)> = Vec::new();

        for (index, slide) in slides.iter().enumerate() {
            let (shapes, image_rels) =
                self.compose_slide(slide, index, &mut media, &mut report);
            slide_parts.push((slide_part(&shapes), image_rels));
        }
        report.slides = slide_parts.len();

        let mut extensions: Vec<&str> = media
            .iter()
            .filter_map(|(name, _)| name.rsplit('.').next())
            .collect();
        extensions.sort_unstable();
        extensions.dedup();

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        let mut add = |writer: &mut ZipWriter<Cursor<Vec<u8>>>,
                       path: &str,
                       content: &[u8]|
         -> Result<()> {
            writer.start_file(path, options)?;
            writer.write_all(content)?;
            Ok(())
        };

        add(
            &mut writer,
            "[Content_Types].xml",
            content_types(report.slides, &extensions).as_bytes(),
        )?;
        add(&mut writer, "_rels/.rels", root_rels().as_bytes())?;
        add(
            &mut writer,
            "docProps/core.xml",
            core_props_part(doc.title.as_deref().unwrap_or("Presentation")).as_bytes(),
        )?;
        add(
            &mut writer,
            "ppt/presentation.xml",
            presentation_part(report.slides).as_bytes(),
        )?;
        add(
            &mut writer,
            "ppt/_rels/presentation.xml.rels",
            presentation_rels(report.slides).as_bytes(),
        )?;
        add(&mut writer, "ppt/theme/theme1.xml", theme_part().as_bytes())?;
        add(
            &mut writer,
            "ppt/slideMasters/slideMaster1.xml",
            slide_master_part().as_bytes(),
        )?;
        add(
            &mut writer,
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            slide_master_rels().as_bytes(),
        )?;
        add(
            &mut writer,
            "ppt/slideLayouts/slideLayout1.xml",
            blank_layout_part().as_bytes(),
        )?;
        add(
            &mut writer,
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            blank_layout_rels().as_bytes(),
        )?;

        for (i, (part, image_rels)) in slide_parts.iter().enumerate() {
            add(
                &mut writer,
                &format!("ppt/slides/slide{}.xml", i + 1),
                part.as_bytes(),
            )?;
            add(
                &mut writer,
                &format!("ppt/slides/_rels/slide{}.xml.rels", i + 1),
                slide_rels(image_rels).as_bytes(),
            )?;
        }
        for (name, bytes) in &media {
            add(&mut writer, &format!("ppt/media/{name}"), bytes)?;
        }

        let cursor = writer.finish()?;
        Ok((cursor.into_inner(), report))
    }

    fn compose_slide(
        &self,
        slide: &Slide,
        index: usize,
        media: &mut Vec<(String, Vec<u8>)>,
        report: &mut BuildReport,
    ) -> (String, Vec<(String, String)>) {
        match slide.kind {
            SlideKind::Title | SlideKind::Closing => (self.title_slide(slide), Vec::new()),
            SlideKind::Section => (self.section_slide(slide), Vec::new()),
            SlideKind::TwoColumn => (self.two_column_slide(slide, index, report), Vec::new()),
            SlideKind::Blank => (String::new(), Vec::new()),
            _ => self.content_slide(slide, index, media, report),
        }
    }

    fn title_slide(&self, slide: &Slide) -> String {
        let mut shapes = solid_rect(2, "Background", 0, 0, SLIDE_CX, SLIDE_CY, PURPLE);
        let mut paragraphs = vec![
            Paragraph::new(slide.title_text(), 44.0, WHITE)
                .bold()
                .centered(),
        ];
        if let Some(subtitle) = &slide.subtitle {
            paragraphs.push(Paragraph::new(subtitle, 24.0, WHITE).centered());
        }
        shapes.push_str(&text_box(
            3,
            "Title",
            inches(0.5),
            inches(2.5),
            inches(12.333),
            inches(2.0),
            &paragraphs,
        ));
        shapes
    }

    fn section_slide(&self, slide: &Slide) -> String {
        let mut shapes = solid_rect(2, "Background", 0, 0, SLIDE_CX, SLIDE_CY, PURPLE);
        let mut paragraphs = vec![
            Paragraph::new(slide.title_text(), 48.0, WHITE)
                .bold()
                .centered(),
        ];
        if let Some(subtitle) = &slide.subtitle {
            paragraphs.push(Paragraph::new(subtitle, 28.0, WHITE).centered());
        }
        shapes.push_str(&text_box(
            3,
            "Section Title",
            inches(0.5),
            inches(2.8),
            inches(12.333),
            inches(1.5),
            &paragraphs,
        ));
        shapes
    }

    fn title_bar(&self, slide: &Slide, index: usize, report: &mut BuildReport) -> String {
        let mut shapes = solid_rect(2, "Title Bar", 0, 0, SLIDE_CX, inches(1.2), PURPLE);
        let size = self.fit(slide.title_text(), 12.333, 32.0, index, "title", report);
        shapes.push_str(&text_box(
            3,
            "Title",
            inches(0.5),
            inches(0.3),
            inches(12.333),
            inches(0.8),
            &[Paragraph::new(slide.title_text(), size, WHITE).bold()],
        ));
        shapes
    }

    fn content_slide(
        &self,
        slide: &Slide,
        index: usize,
        media: &mut Vec<(String, Vec<u8>)>,
        report: &mut BuildReport,
    ) -> (String, Vec<(String, String)>) {
        let mut shapes = self.title_bar(slide, index, report);
        let mut image_rels = Vec::new();
        let mut shape_id = 4u32;

        let mut area = Some(ContentArea::DEFAULT);
        if let Some(image) = &slide.image
            && let Some(resolved) = self.resolve_image(image, index, report)
        {
            let name = format!("image{}.{}", media.len() + 1, resolved.extension);
            let r_id = format!("rId{}", image_rels.len() + 2);
            shapes.push_str(&picture(
                shape_id,
                "Picture",
                &r_id,
                resolved.x,
                resolved.y,
                resolved.cx,
                resolved.cy,
            ));
            shape_id += 1;
            image_rels.push((r_id, format!("../media/{name}")));
            media.push((name, resolved.bytes));
            area = shrink_area(image);
        }

        if !slide.items.is_empty()
            && let Some(area) = area
        {
            let mut size = 24.0f64;
            for item in &slide.items {
                let bullet = format!("• {item}");
                size = size.min(self.fit(
                    &bullet,
                    area.width,
                    24.0,
                    index,
                    "items",
                    report,
                ));
            }
            let paragraphs: Vec<Paragraph> = slide
                .items
                .iter()
                .map(|item| {
                    Paragraph::new(format!("• {item}"), size, DARK_GRAY).with_space_after(12)
                })
                .collect();
            shapes.push_str(&text_box(
                shape_id,
                "Content",
                inches(area.left),
                inches(area.top),
                inches(area.width),
                inches(area.height),
                &paragraphs,
            ));
        }

        (shapes, image_rels)
    }

    fn two_column_slide(&self, slide: &Slide, index: usize, report: &mut BuildReport) -> String {
        let mut shapes = self.title_bar(slide, index, report);
        let mut shape_id = 4u32;

        let mut column = |shapes: &mut String,
                          shape_id: &mut u32,
                          left: f64,
                          heading: &Option<String>,
                          items: &[String]| {
            if let Some(heading) = heading {
                shapes.push_str(&text_box(
                    *shape_id,
                    "Column Heading",
                    inches(left),
                    inches(1.5),
                    inches(5.8),
                    inches(0.6),
                    &[Paragraph::new(heading, 24.0, PURPLE).bold()],
                ));
                *shape_id += 1;
            }
            if !items.is_empty() {
                let mut size = 20.0f64;
                for item in items {
                    size = size.min(self.fit(
                        &format!("• {item}"),
                        5.8,
                        20.0,
                        index,
                        "columns",
                        report,
                    ));
                }
                let paragraphs: Vec<Paragraph> = items
                    .iter()
                    .map(|item| {
                        Paragraph::new(format!("• {item}"), size, DARK_GRAY)
                            .with_space_after(10)
                    })
                    .collect();
                shapes.push_str(&text_box(
                    *shape_id,
                    "Column",
                    inches(left),
                    inches(2.2),
                    inches(5.8),
                    inches(4.8),
                    &paragraphs,
                ));
                *shape_id += 1;
            }
        };

        column(
            &mut shapes,
            &mut shape_id,
            0.5,
            &slide.left_title,
            &slide.left_items,
        );
        column(
            &mut shapes,
            &mut shape_id,
            7.0,
            &slide.right_title,
            &slide.right_items,
        );
        shapes
    }

    /// Shrink text to fit and record an overflow warning when it still
    /// does not.
    fn fit(
        &self,
        text: &str,
        width_in: f64,
        original_size: f64,
        index: usize,
        field: &str,
        report: &mut BuildReport,
    ) -> f64 {
        let size = if self.auto_shrink {
            optimal_font_size(text, width_in, original_size)
        } else {
            original_size
        };
        let location = format!("slides[{index}].{field}");
        if let Some(warning) = overflow_warning(text, width_in, size, &location) {
            report.warnings.push(warning);
        }
        size
    }

    /// Resolve an image reference to bytes and placement geometry.
    ///
    /// The build step never touches the network; URL-only references are
    /// reported and skipped.
    fn resolve_image(
        &self,
        image: &ImageRef,
        index: usize,
        report: &mut BuildReport,
    ) -> Option<ResolvedImage> {
        let Some(path) = &image.path else {
            if let Some(url) = &image.url {
                report.warnings.push(format!(
                    "slides[{index}].image: URL images are not fetched at build time ({url})"
                ));
            }
            return None;
        };

        let mut candidates = vec![PathBuf::from(path)];
        if let Some(dir) = &self.images_dir {
            candidates.insert(0, dir.join(path));
        }
        let Some(found) = candidates.iter().find(|c| c.exists()) else {
            report
                .warnings
                .push(format!("slides[{index}].image: not found: {path}"));
            return None;
        };
        let bytes = match std::fs::read(found) {
            Ok(bytes) => bytes,
            Err(err) => {
                report
                    .warnings
                    .push(format!("slides[{index}].image: unreadable: {err}"));
                return None;
            }
        };

        let meta = ImageMeta::sniff(&bytes);
        let aspect = meta.map(|m| m.aspect_ratio()).unwrap_or(4.0 / 3.0);
        let extension = meta.map(|m| m.format.extension()).unwrap_or("png");

        let width_pct = image.width_percent as f64;
        let height_pct = image.height_percent as f64;
        let area = ContentArea::DEFAULT;

        let (x, y, w_in, h_in) = match image.position {
            ImagePosition::Full => {
                let w = 12.333;
                (0.5, area.top, w, w / aspect)
            },
            ImagePosition::Right => {
                let w = SLIDE_W_IN * width_pct / 100.0;
                (SLIDE_W_IN - 0.5 - w, area.top, w, w / aspect)
            },
            ImagePosition::Bottom => {
                let h = SLIDE_H_IN * height_pct / 100.0;
                (0.5, SLIDE_H_IN - 0.5 - h, h * aspect, h)
            },
            ImagePosition::Center => {
                let w = SLIDE_W_IN * width_pct / 100.0;
                ((SLIDE_W_IN - w) / 2.0, area.top, w, w / aspect)
            },
        };

        Some(ResolvedImage {
            bytes,
            extension,
            x: inches(x),
            y: inches(y),
            cx: inches(w_in),
            cy: inches(h_in),
        })
    }
}

/// Remaining text area after an image claims its share of the slide.
fn shrink_area(image: &ImageRef) -> Option<ContentArea> {
    let area = ContentArea::DEFAULT;
    match image.position {
        ImagePosition::Full => None,
        ImagePosition::Right => Some(ContentArea {
            width: SLIDE_W_IN * (100.0 - image.width_percent as f64 - 5.0) / 100.0,
            ..area
        }),
        ImagePosition::Bottom => Some(ContentArea {
            height: SLIDE_H_IN * (100.0 - image.height_percent as f64 - 10.0) / 100.0,
            ..area
        }),
        // Centered images deliberately share the area with the text; the
        // validator warns when they are wide enough to cover it.
        ImagePosition::Center => Some(area),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ContentDoc, Slide, SlideKind};

    fn doc() -> ContentDoc {
        let mut doc = ContentDoc::new("Deck");
        let mut title = Slide::new(SlideKind::Title, "デッキ");
        title.subtitle = Some("2025-12-14".into());
        doc.slides.push(title);

        let mut content = Slide::new(SlideKind::Content, "ポイント");
        content.items = vec!["最初".into(), "次".into()];
        doc.slides.push(content);

        doc.slides.push(Slide::new(SlideKind::Closing, "ご清聴ありがとうございました"));
        doc
    }

    #[test]
    fn test_build_produces_zip_with_slide_parts() {
        let (bytes, report) = DeckBuilder::new().build_to_bytes(&doc()).unwrap();
        assert_eq!(report.slides, 3);
        assert_eq!(report.auto_fixed, 0);

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        for part in [
            "[Content_Types].xml",
            "ppt/presentation.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/slide3.xml",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/theme/theme1.xml",
        ] {
            assert!(archive.by_name(part).is_ok(), "missing part: {part}");
        }
    }

    #[test]
    fn test_closing_with_items_is_converted() {
        let mut doc = doc();
        doc.slides[2].items = vec!["a".into(), "b".into(), "c".into()];
        let (_, report) = DeckBuilder::new().build_to_bytes(&doc).unwrap();
        assert_eq!(report.auto_fixed, 1);
    }

    #[test]
    fn test_skipped_slides_are_not_built() {
        let mut doc = doc();
        doc.slides[1].skip = true;
        let (_, report) = DeckBuilder::new().build_to_bytes(&doc).unwrap();
        assert_eq!(report.slides, 2);
    }

    #[test]
    fn test_url_image_yields_warning() {
        let mut doc = doc();
        doc.slides[1].image = Some(crate::ir::ImageRef {
            path: None,
            url: Some("https://example.com/pic.png".into()),
            position: crate::ir::ImagePosition::Right,
            width_percent: 45,
            height_percent: 50,
        });
        let (_, report) = DeckBuilder::new().build_to_bytes(&doc).unwrap();
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("not fetched at build time")));
    }

    #[test]
    fn test_missing_image_warns_but_builds() {
        let mut doc = doc();
        doc.slides[1].image = Some(crate::ir::ImageRef::from_path("nope/missing.png"));
        let (bytes, report) = DeckBuilder::new().build_to_bytes(&doc).unwrap();
        assert!(report.warnings.iter().any(|w| w.contains("not found")));
        assert!(!bytes.is_empty());
    }
}
