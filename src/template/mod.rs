//! Template analysis, layout mapping, and template cleaning.
//!
//! A template is an ordinary `.pptx` package. This module reads the parts
//! that matter for layout matching (presentation.xml, the slide layouts,
//! the media inventory), categorizes each layout by name and placeholder
//! shape, and derives the slide-type to layout-index mapping the build
//! phase consumes. The cleaning pass rewrites layout XML in place to strip
//! decorations and clamp placeholder geometry that breaks generated decks.

// Submodule declarations
mod clean;
mod layout;
mod mapping;
mod package;

// Re-exports
pub use clean::{CleanReport, LayoutDiagnosis, TemplateCleaner, TemplateDiagnosis};
pub use layout::{
    LayoutCategory, LayoutInfo, Placeholder, PlaceholderKind, ShapeInfo, ShapeKind,
    parse_layout,
};
pub use mapping::{LayoutMapping, TemplateAnalysis};
pub use package::{SlideSize, TemplatePackage, EMUS_PER_INCH};
