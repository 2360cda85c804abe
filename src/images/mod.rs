//! Media inspection and per-slide image extraction.

// Submodule declarations
mod extract;
mod meta;

// Re-exports
pub use extract::{ExtractedImage, ImageExtractor};
pub use meta::{ImageFormat, ImageMeta, image_score, is_icon_or_logo};
