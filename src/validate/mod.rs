//! Deterministic validation of content documents.
//!
//! This is the helper the Reviewer agent calls between the translation and
//! build phases. All checks are pure functions of the document (plus the
//! filesystem for image existence); the orchestrating agent interprets the
//! exit code: 0 = pass, 1 = fail, 2 = warnings only.
//!
//! # Examples
//!
//! ```rust
//! use deckforge::ir::{ContentDoc, Slide, SlideKind};
//! use deckforge::validate::{Validator, Status};
//!
//! let mut doc = ContentDoc::new("Deck");
//! doc.slides.push(Slide::new(SlideKind::Title, "Deck"));
//! let report = Validator::new().validate(&doc);
//! assert_eq!(report.status(), Status::Pass);
//! ```

// Submodule declarations
mod report;
mod rules;

// Re-exports
pub use report::{Finding, Report, Status};
pub use rules::Validator;
