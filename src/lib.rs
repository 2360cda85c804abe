//! Deckforge - deterministic toolkit for an agent-driven PPTX pipeline
//!
//! This library provides the pure, scriptable half of a workflow that turns
//! English source material (decks, articles, Markdown) into localized
//! Japanese presentations. Agents do the reading, summarizing, and
//! translating; deckforge does everything that must be exact: input
//! classification, template analysis and cleaning, content validation,
//! deck assembly, image extraction, and workflow tracing.
//!
//! # Features
//!
//! - **Content IR**: a JSON content document as the contract between
//!   pipeline phases, with reorder/merge/structure-analysis edits
//! - **Validation**: deterministic checks with a PASS/WARN/FAIL report and
//!   the 0/1/2 exit-code convention
//! - **Template analysis**: layout categorization, slide-kind mapping, and
//!   span-preserving template cleanup
//! - **Deck assembly**: self-contained 16:9 `.pptx` generation with text
//!   auto-shrink and image placement
//! - **Workflow tracing**: JSONL traces, retry bookkeeping, and escalation
//!   manifests for resumable runs
//!
//! # Example - Validate and build a deck
//!
//! ```no_run
//! use deckforge::builder::DeckBuilder;
//! use deckforge::ir::ContentDoc;
//! use deckforge::validate::Validator;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let doc = ContentDoc::open("output_manifest/20251214_demo_report_content_ja.json")?;
//!
//! let report = Validator::new().validate(&doc);
//! if report.exit_code(false) == 1 {
//!     eprintln!("{}", report.render_text());
//!     return Ok(());
//! }
//!
//! let report = DeckBuilder::new()
//!     .with_images_dir("images/20251214_demo_report")
//!     .build(&doc, "output_ppt/20251214_demo_report.pptx")?;
//! println!("built {} slides", report.slides);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Classify an input
//!
//! ```no_run
//! use deckforge::classify::classify;
//! use deckforge::naming::Purpose;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let result = classify("input/quarterly_review.pptx", Purpose::Report)?;
//! println!(
//!     "{} -> {} ({})",
//!     result.input_type,
//!     result.recommended_method.as_str(),
//!     result.base_name
//! );
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod builder;
pub mod classify;
pub mod error;
pub mod images;
pub mod ir;
pub mod naming;
pub mod prompts;
pub mod template;
pub mod validate;
pub mod workflow;

// Re-exports
pub use error::{Error, Result};
