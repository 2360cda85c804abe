//! Intermediate representation for deck content ("content.json").
//!
//! The IR is the contract between the pipeline phases: an extraction step
//! creates it, a translation/summarization step may rewrite it, and the
//! build step consumes it. It is a plain declarative document; the only
//! structural guarantees are the ones checked by [`crate::validate`].

// Submodule declarations
mod document;
mod edit;
mod slide;

// Re-exports
pub use document::{ContentDoc, SCHEMA_VERSION};
pub use edit::{merge, reorder, MergePosition, SectionSummary, StructureAnalysis};
pub use slide::{ImagePosition, ImageRef, Slide, SlideKind};
