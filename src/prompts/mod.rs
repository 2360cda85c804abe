//! Role prompts for the agent-driven pipeline phases.
//!
//! The deterministic stages (template analysis, validation, build) run in
//! this crate; extraction, summarization, and translation are performed by
//! an external agent. This module assembles the system and task prompts
//! those agents consume, embedding the content document field contract and
//! the retry/escalation convention so agent output stays machine-checkable.

use crate::ir::StructureAnalysis;
use crate::validate::Report;

/// The content document contract every agent must write to.
pub const CONTENT_CONTRACT: &str = r#"
Content document format (JSON):

{
  "title": "deck title",
  "slides": [
    {
      "type": "title | section | content | two_column | title_only | agenda | summary | quote | photo | code | closing | blank",
      "title": "slide title",
      "subtitle": "optional subtitle (title/section/closing slides)",
      "items": ["bullet text", "..."],
      "left_title": "two_column only", "left_items": ["..."],
      "right_title": "two_column only", "right_items": ["..."],
      "notes": "optional speaker notes",
      "image": {
        "path": "images/<base>/slide_01.png",
        "url": "https://... (alternative to path)",
        "position": "right | bottom | full | center",
        "width_percent": 45,
        "height_percent": 50
      },
      "_skip": false
    }
  ]
}

Field rules:
- Every slide needs "type"; unknown types fail validation.
- "items" may also be written as "content"; both are read.
- Set "_skip": true to keep a slide in the file but out of the build.
- Bullet text must not contain manual line breaks; the builder wraps and
  shrinks text itself.
- Keep at most 7 items per slide and at most 40 characters per item for
  Japanese body text; the validator warns beyond that.
"#;

/// The retry and escalation convention agents must follow.
pub const RETRY_CONVENTION: &str = r#"
Retry convention:
- After your output fails validation, you get the validation report back.
  Fix only the findings it lists and resubmit the full document.
- After 3 failed attempts the workflow escalates to a human: stop editing
  and summarize what kept failing instead.
"#;

/// System prompt for the Extractor role.
pub const EXTRACTOR_SYSTEM_PROMPT: &str = r#"
You are an expert presentation analyst extracting structured content from
source material (slide decks, technical articles, Markdown documents).

Your role is to read the entire source, understand its narrative, and
produce a faithful content document for the deck builder.

Key responsibilities:
- Preserve the source's structure: sections, ordering, emphasis
- Keep one idea per bullet; never paste paragraphs into items
- Record speaker notes where the source has presenter commentary
- Reference extracted images by their slide_NN file names
- Output strictly valid JSON following the content document format
"#;

/// System prompt for the Summarizer role.
pub const SUMMARIZER_SYSTEM_PROMPT: &str = r#"
You are an expert presentation editor condensing a long deck into a
shorter one without losing its message.

Your role is to read ALL slides first, identify the key sections and
messages, and only then restructure into the requested slide count.

Key responsibilities:
- Understand the full narrative before cutting anything
- Keep section boundaries meaningful; merge thin sections
- Prefer dropping whole redundant slides over thinning every slide
- Keep the opening title slide and a closing slide
- Output strictly valid JSON following the content document format
"#;

/// System prompt for the Localizer role.
pub const LOCALIZER_SYSTEM_PROMPT: &str = r#"
You are a professional technical translator localizing presentation
content from English into Japanese.

Key responsibilities:
- Translate titles, subtitles, items, and notes; never structural fields
- Keep product names, API names, and code identifiers in the original
- Use concise presentation Japanese (body text in である調 is avoided;
  use noun phrases or ですます調 consistently)
- Respect slide real estate: Japanese runs wider than English, so keep
  bullets within the documented length limits
- Return the same JSON structure with only text values changed
"#;

/// System prompt for the Reviewer role.
pub const REVIEWER_SYSTEM_PROMPT: &str = r#"
You are a meticulous reviewer fixing a presentation content document that
failed deterministic validation.

Key responsibilities:
- Address every finding in the validation report, and nothing else
- Follow the suggestion attached to a finding when one is given
- Never delete content to silence a warning unless the finding says so
- Return the complete corrected JSON document, not a diff
"#;

/// Task prompt for extracting a content document from source material.
pub fn create_extraction_prompt(source_description: &str, target_slides: Option<usize>) -> String {
    let scope = match target_slides {
        Some(n) => format!("Produce about {n} slides."),
        None => "Produce one slide per source slide or section.".to_string(),
    };
    format!(
        r#"Extract a content document from the following source.

Source: {source_description}

{scope}
{CONTENT_CONTRACT}
{RETRY_CONVENTION}
Return ONLY the JSON document, with no surrounding prose or code fences."#
    )
}

/// Task prompt for summarizing a deck to a target slide count.
///
/// Embeds the structure analysis so the agent sees section shape without
/// re-deriving it.
pub fn create_summary_prompt(analysis: &StructureAnalysis, target_slides: usize) -> String {
    let analysis_json =
        serde_json::to_string_pretty(analysis).unwrap_or_else(|_| "{}".to_string());
    format!(
        r#"Summarize the attached content document down to {target_slides} slides.

Structure analysis of the source deck:
{analysis_json}

Slides listed in empty_slides carry no content and must be dropped first.
{CONTENT_CONTRACT}
{RETRY_CONVENTION}
Return ONLY the JSON document, with no surrounding prose or code fences."#
    )
}

/// Task prompt for translating a content document into Japanese.
pub fn create_localization_prompt(content_json: &str) -> String {
    format!(
        r#"Translate this content document into Japanese.

<content>
{content_json}
</content>
{CONTENT_CONTRACT}
{RETRY_CONVENTION}
Return ONLY the translated JSON document, with no surrounding prose or
code fences."#
    )
}

/// Task prompt for fixing a document that failed validation.
pub fn create_review_prompt(content_json: &str, report: &Report) -> String {
    format!(
        r#"This content document failed validation. Fix it.

Validation report:
{report}
<content>
{content_json}
</content>
{CONTENT_CONTRACT}
{RETRY_CONVENTION}
Return ONLY the corrected JSON document, with no surrounding prose or
code fences."#,
        report = report.render_text(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ContentDoc, Slide, SlideKind};

    #[test]
    fn test_contract_names_every_slide_kind() {
        for kind in SlideKind::ALL {
            assert!(
                CONTENT_CONTRACT.contains(kind.as_str()),
                "contract missing kind {}",
                kind.as_str()
            );
        }
    }

    #[test]
    fn test_extraction_prompt_scopes_slide_count() {
        let prompt = create_extraction_prompt("input/deck.pptx (45 slides, English)", Some(20));
        assert!(prompt.contains("about 20 slides"));
        assert!(prompt.contains("input/deck.pptx"));
        assert!(prompt.contains("Retry convention"));
    }

    #[test]
    fn test_summary_prompt_embeds_analysis() {
        let mut doc = ContentDoc::new("Deck");
        doc.slides.push(Slide::new(SlideKind::Title, "Deck"));
        doc.slides.push(Slide::new(SlideKind::Section, "Part 1"));
        let prompt = create_summary_prompt(&StructureAnalysis::of(&doc), 15);
        assert!(prompt.contains("down to 15 slides"));
        assert!(prompt.contains("\"total_slides\": 2"));
        assert!(prompt.contains("Part 1"));
    }

    #[test]
    fn test_review_prompt_carries_findings() {
        let mut report = Report::new();
        report.add_error(
            "empty_content",
            "slides[2]",
            "content slide has no items",
            Some("add items or mark _skip".into()),
        );
        let prompt = create_review_prompt("{\"title\":\"x\",\"slides\":[]}", &report);
        assert!(prompt.contains("[empty_content] slides[2]"));
        assert!(prompt.contains("-> add items or mark _skip"));
    }
}
