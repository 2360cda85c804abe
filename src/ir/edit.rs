//! Document-level edits: reorder, merge, and structure analysis.
//!
//! These operate purely on the IR. The observable deck is the same as if
//! the equivalent slide surgery had been done on the built package, without
//! touching any XML.

use super::{ContentDoc, SlideKind};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Where merged slides are inserted into the base document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePosition {
    /// Before the first slide.
    Start,
    /// After the last slide (the default for diagram merges).
    End,
    /// Before the slide at this index.
    At(usize),
}

/// Rearrange (and optionally duplicate) slides by an index sequence.
///
/// Indices are 0-based and may repeat; every index is validated against the
/// document length before any output is produced.
///
/// # Examples
///
/// ```rust
/// use deckforge::ir::{reorder, ContentDoc, Slide, SlideKind};
///
/// let mut doc = ContentDoc::new("Deck");
/// doc.slides.push(Slide::new(SlideKind::Title, "A"));
/// doc.slides.push(Slide::new(SlideKind::Content, "B"));
/// doc.slides.push(Slide::new(SlideKind::Content, "C"));
///
/// let reordered = reorder(&doc, &[0, 2, 2, 1]).unwrap();
/// assert_eq!(reordered.slides.len(), 4);
/// assert_eq!(reordered.slides[1].title_text(), "C");
/// ```
pub fn reorder(doc: &ContentDoc, sequence: &[usize]) -> Result<ContentDoc> {
    if doc.slides.is_empty() {
        return Err(Error::Other("document has no slides to reorder".into()));
    }
    let max = doc.slides.len() - 1;
    for &index in sequence {
        if index > max {
            return Err(Error::IndexOutOfRange { index, max });
        }
    }

    let mut out = doc.clone();
    out.slides = sequence.iter().map(|&i| doc.slides[i].clone()).collect();
    Ok(out)
}

/// Merge the slides of `other` into `base` at the given position.
///
/// Metadata (title, schema version) comes from the base document.
pub fn merge(base: &ContentDoc, other: &ContentDoc, position: MergePosition) -> Result<ContentDoc> {
    let at = match position {
        MergePosition::Start => 0,
        MergePosition::End => base.slides.len(),
        MergePosition::At(index) => {
            if index > base.slides.len() {
                return Err(Error::IndexOutOfRange {
                    index,
                    max: base.slides.len(),
                });
            }
            index
        }
    };

    let mut out = base.clone();
    let tail = out.slides.split_off(at);
    out.slides.extend(other.slides.iter().cloned());
    out.slides.extend(tail);
    Ok(out)
}

/// A contiguous run of slides belonging to one section.
#[derive(Debug, Clone, Serialize)]
pub struct SectionSummary {
    pub name: String,
    pub start: usize,
    pub end: usize,
    pub count: usize,
}

/// Structure analysis of a content document.
///
/// This is the input the Summarizer agent reads before restructuring a
/// large deck into a shorter one; it carries no content, only shape.
#[derive(Debug, Clone, Serialize)]
pub struct StructureAnalysis {
    pub total_slides: usize,
    pub type_counts: BTreeMap<String, usize>,
    pub sections: Vec<SectionSummary>,
    /// Recommended slide counts per summary depth.
    pub recommended_sizes: BTreeMap<String, usize>,
    /// Indices of slides with neither title nor body content.
    pub empty_slides: Vec<usize>,
}

impl StructureAnalysis {
    /// Analyze a document's section structure and slide-type distribution.
    pub fn of(doc: &ContentDoc) -> Self {
        let total = doc.slides.len();

        let mut type_counts: BTreeMap<String, usize> = BTreeMap::new();
        for slide in &doc.slides {
            *type_counts.entry(slide.kind.as_str().to_string()).or_default() += 1;
        }

        // Section boundaries: an explicit section slide, or a title slide
        // appearing after the first position.
        let mut sections = Vec::new();
        let mut current_start = 0usize;
        let mut current_name = String::from("Introduction");
        for (i, slide) in doc.slides.iter().enumerate() {
            let is_break = slide.kind == SlideKind::Section
                || (slide.kind == SlideKind::Title && i > 0);
            if is_break && i > current_start {
                sections.push(SectionSummary {
                    name: current_name.clone(),
                    start: current_start,
                    end: i - 1,
                    count: i - current_start,
                });
                current_start = i;
                current_name = slide
                    .title
                    .clone()
                    .unwrap_or_else(|| format!("Section {}", sections.len() + 1));
            } else if is_break {
                current_name = slide
                    .title
                    .clone()
                    .unwrap_or_else(|| format!("Section {}", sections.len() + 1));
            }
        }
        if total > 0 {
            sections.push(SectionSummary {
                name: current_name,
                start: current_start,
                end: total - 1,
                count: total - current_start,
            });
        }

        let mut recommended_sizes = BTreeMap::new();
        recommended_sizes.insert("executive_summary".into(), (total / 20).max(7));
        recommended_sizes.insert("short_summary".into(), (total / 8).max(15));
        recommended_sizes.insert("standard_summary".into(), (total / 4).max(25));
        recommended_sizes.insert("detailed_summary".into(), (total / 2).max(40));

        let empty_slides = doc
            .slides
            .iter()
            .enumerate()
            .filter(|(_, s)| s.title_text().trim().is_empty() && !s.has_body())
            .map(|(i, _)| i)
            .collect();

        Self {
            total_slides: total,
            type_counts,
            sections,
            recommended_sizes,
            empty_slides,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Slide;

    fn doc_with(kinds: &[(SlideKind, &str)]) -> ContentDoc {
        let mut doc = ContentDoc::new("Deck");
        for (kind, title) in kinds {
            doc.slides.push(Slide::new(*kind, *title));
        }
        doc
    }

    #[test]
    fn test_reorder_rejects_out_of_range() {
        let doc = doc_with(&[(SlideKind::Title, "A"), (SlideKind::Content, "B")]);
        let err = reorder(&doc, &[0, 2]).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 2, max: 1 }));
    }

    #[test]
    fn test_reorder_allows_duplicates() {
        let doc = doc_with(&[(SlideKind::Title, "A"), (SlideKind::Content, "B")]);
        let out = reorder(&doc, &[1, 1, 0]).unwrap();
        let titles: Vec<&str> = out.slides.iter().map(|s| s.title_text()).collect();
        assert_eq!(titles, vec!["B", "B", "A"]);
    }

    #[test]
    fn test_merge_positions() {
        let base = doc_with(&[(SlideKind::Title, "A"), (SlideKind::Closing, "Z")]);
        let diagrams = doc_with(&[(SlideKind::Photo, "Arch")]);

        let end = merge(&base, &diagrams, MergePosition::End).unwrap();
        assert_eq!(end.slides[2].title_text(), "Arch");

        let start = merge(&base, &diagrams, MergePosition::Start).unwrap();
        assert_eq!(start.slides[0].title_text(), "Arch");

        let mid = merge(&base, &diagrams, MergePosition::At(1)).unwrap();
        assert_eq!(mid.slides[1].title_text(), "Arch");

        assert!(merge(&base, &diagrams, MergePosition::At(5)).is_err());
    }

    #[test]
    fn test_structure_analysis_sections() {
        let doc = doc_with(&[
            (SlideKind::Title, "Deck"),
            (SlideKind::Content, "Intro"),
            (SlideKind::Section, "Part 1"),
            (SlideKind::Content, "Detail"),
        ]);
        let analysis = StructureAnalysis::of(&doc);
        assert_eq!(analysis.total_slides, 4);
        assert_eq!(analysis.sections.len(), 2);
        assert_eq!(analysis.sections[0].count, 2);
        assert_eq!(analysis.sections[1].name, "Part 1");
        assert_eq!(analysis.recommended_sizes["executive_summary"], 7);
    }
}
