//! Presentation assembly and post-build review.
//!
//! The builder turns a content document into a self-contained 16:9
//! `.pptx`: one generated slide part per IR slide, styled with the accent
//! theme, with images embedded as media parts. Overflowing text is shrunk
//! before it is written, and [`DeckReview`] walks a finished package to
//! flag frames that are still too dense.

// Submodule declarations
mod colors;
mod deck;
mod review;
mod text;
mod xml;

// Re-exports
pub use colors::{Color, DARK_GRAY, LIGHT_GRAY, PURPLE, WHITE};
pub use deck::{BuildReport, DeckBuilder};
pub use review::{DeckReview, ReviewFinding};
pub(crate) use review::text_frames;
pub use text::{MIN_FONT_SIZE, estimate_text_width, optimal_font_size, overflow_warning};
pub use xml::escape_xml;
