//! Post-build quality review of a presentation package.

use crate::template::TemplatePackage;
use crate::Result;
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Serialize;
use std::path::Path;

/// Text frames longer than this are flagged.
const MAX_FRAME_CHARS: usize = 500;
/// Frames with more paragraphs than this are flagged.
const MAX_FRAME_PARAGRAPHS: usize = 15;

/// One flagged text frame.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewFinding {
    /// 1-based slide number.
    pub slide: usize,
    /// Shape index within the slide.
    pub shape: usize,
    pub message: String,
}

/// Review result for a built or existing deck.
#[derive(Debug, Clone, Serialize)]
pub struct DeckReview {
    pub slides: usize,
    pub findings: Vec<ReviewFinding>,
}

impl DeckReview {
    /// Walk every text frame of a package and flag oversized ones.
    pub fn of_file(path: impl AsRef<Path>) -> Result<Self> {
        let package = TemplatePackage::open(path)?;
        Self::of_package(&package)
    }

    pub fn of_package<R: std::io::Read + std::io::Seek>(
        package: &TemplatePackage<R>,
    ) -> Result<Self> {
        let slide_parts = package.slide_paths()?;
        let mut findings = Vec::new();

        for (slide_idx, part) in slide_parts.iter().enumerate() {
            let xml = package.get_text(part)?;
            for (shape_idx, frame) in text_frames(&xml)?.into_iter().enumerate() {
                let chars = frame.text.chars().count();
                if chars > MAX_FRAME_CHARS {
                    findings.push(ReviewFinding {
                        slide: slide_idx + 1,
                        shape: shape_idx,
                        message: format!("text too long ({chars} chars)"),
                    });
                }
                if frame.paragraphs > MAX_FRAME_PARAGRAPHS {
                    findings.push(ReviewFinding {
                        slide: slide_idx + 1,
                        shape: shape_idx,
                        message: format!("too many paragraphs ({})", frame.paragraphs),
                    });
                }
            }
        }

        Ok(Self {
            slides: slide_parts.len(),
            findings,
        })
    }

    #[inline]
    pub fn passed(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn render_text(&self) -> String {
        let mut out = format!("Slides: {}\n", self.slides);
        if self.findings.is_empty() {
            out.push_str("No overflow or excessive text detected\n");
        } else {
            for finding in &self.findings {
                out.push_str(&format!(
                    "  slide {}, shape {}: {}\n",
                    finding.slide, finding.shape, finding.message
                ));
            }
        }
        out
    }
}

pub(crate) struct TextFrame {
    pub(crate) text: String,
    pub(crate) paragraphs: usize,
}

/// Extract the text frames (`p:txBody`) of a slide part.
pub(crate) fn text_frames(xml: &str) -> Result<Vec<TextFrame>> {
    let mut reader = Reader::from_str(xml);
    let mut frames = Vec::new();

    let mut current: Option<TextFrame> = None;
    let mut in_run_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"p:txBody" => {
                    current = Some(TextFrame {
                        text: String::new(),
                        paragraphs: 0,
                    });
                },
                b"a:p" => {
                    if let Some(frame) = current.as_mut() {
                        if frame.paragraphs > 0 {
                            frame.text.push('\n');
                        }
                        frame.paragraphs += 1;
                    }
                },
                b"a:t" => in_run_text = current.is_some(),
                _ => {},
            },
            Ok(Event::Text(ref t)) if in_run_text => {
                if let Some(frame) = current.as_mut() {
                    frame.text.push_str(&t.xml_content()?);
                }
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"a:t" => in_run_text = false,
                b"p:txBody" => {
                    if let Some(frame) = current.take() {
                        frames.push(frame);
                    }
                },
                _ => {},
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {},
        }
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DeckBuilder;
    use crate::ir::{ContentDoc, Slide, SlideKind};
    use std::io::Cursor;

    #[test]
    fn test_text_frames_count_paragraphs() {
        let xml = r#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree><p:sp><p:txBody>
            <a:p><a:r><a:t>one</a:t></a:r></a:p>
            <a:p><a:r><a:t>two</a:t></a:r></a:p>
        </p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#;
        let frames = text_frames(xml).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].paragraphs, 2);
        assert_eq!(frames[0].text, "one\ntwo");
    }

    #[test]
    fn test_review_passes_normal_deck() {
        let mut doc = ContentDoc::new("Deck");
        let mut slide = Slide::new(SlideKind::Content, "Title");
        slide.items = vec!["a".into(), "b".into()];
        doc.slides.push(slide);

        let (bytes, _) = DeckBuilder::new().build_to_bytes(&doc).unwrap();
        let package = TemplatePackage::from_reader(Cursor::new(bytes)).unwrap();
        let review = DeckReview::of_package(&package).unwrap();
        assert_eq!(review.slides, 1);
        assert!(review.passed());
    }

    #[test]
    fn test_review_flags_paragraph_flood() {
        let mut doc = ContentDoc::new("Deck");
        let mut slide = Slide::new(SlideKind::Content, "Title");
        slide.items = (0..20).map(|i| format!("item {i}")).collect();
        doc.slides.push(slide);

        let (bytes, _) = DeckBuilder::new().build_to_bytes(&doc).unwrap();
        let package = TemplatePackage::from_reader(Cursor::new(bytes)).unwrap();
        let review = DeckReview::of_package(&package).unwrap();
        assert!(!review.passed());
        assert!(review.findings[0].message.contains("paragraphs"));
    }
}
