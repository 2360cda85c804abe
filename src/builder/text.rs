//! Text measurement and overflow prevention.
//!
//! Widths are estimated, not rendered: CJK characters count as 0.9 em and
//! everything else as 0.5 em, which tracks common Japanese presentation
//! fonts closely enough to decide shrinking before the deck is opened.

/// Minimum font size auto-shrink will go down to.
pub const MIN_FONT_SIZE: f64 = 12.0;

/// Fraction of the frame width text must fit within.
const FIT_MARGIN: f64 = 0.95;

#[inline]
fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{309F}' // Hiragana
        | '\u{30A0}'..='\u{30FF}' // Katakana
        | '\u{4E00}'..='\u{9FFF}' // CJK unified ideographs
    )
}

/// Estimated width of a single line in inches at the given point size.
pub fn estimate_text_width(text: &str, font_size: f64) -> f64 {
    let em = font_size / 72.0;
    let mut width = 0.0;
    for c in text.chars() {
        width += if is_cjk(c) { 0.9 * em } else { 0.5 * em };
    }
    width
}

/// Longest line of a multi-line text, by character count.
fn longest_line(text: &str) -> &str {
    text.lines()
        .max_by_key(|line| line.chars().count())
        .unwrap_or(text)
}

/// Largest font size, at most `original`, at which the text fits the
/// frame width with a 5% margin. Never goes below [`MIN_FONT_SIZE`].
pub fn optimal_font_size(text: &str, frame_width_inches: f64, original: f64) -> f64 {
    let estimated = estimate_text_width(longest_line(text), original);
    if estimated <= frame_width_inches * FIT_MARGIN {
        return original;
    }
    let ratio = frame_width_inches * FIT_MARGIN / estimated;
    (original * ratio).max(MIN_FONT_SIZE)
}

/// Overflow warning for text that still does not fit at its final size.
pub fn overflow_warning(
    text: &str,
    frame_width_inches: f64,
    font_size: f64,
    location: &str,
) -> Option<String> {
    let line = longest_line(text);
    let estimated = estimate_text_width(line, font_size);
    if estimated > frame_width_inches {
        Some(format!(
            "overflow risk at {location}: {} chars, estimated {estimated:.1}in > width {frame_width_inches:.1}in",
            line.chars().count()
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cjk_wider_than_ascii() {
        let ja = estimate_text_width("こんにちは", 24.0);
        let en = estimate_text_width("hello", 24.0);
        assert!(ja > en);
        // 5 chars * 0.9 * (24/72) = 1.5in
        assert!((ja - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_optimal_size_keeps_fitting_text() {
        assert_eq!(optimal_font_size("short", 12.0, 24.0), 24.0);
    }

    #[test]
    fn test_optimal_size_shrinks_and_floors() {
        let long = "あ".repeat(60);
        let shrunk = optimal_font_size(&long, 10.0, 24.0);
        assert!(shrunk < 24.0);
        assert!(shrunk >= MIN_FONT_SIZE);

        let very_long = "あ".repeat(400);
        assert_eq!(optimal_font_size(&very_long, 10.0, 24.0), MIN_FONT_SIZE);
    }

    #[test]
    fn test_overflow_warning_uses_longest_line() {
        let text = format!("short\n{}", "x".repeat(200));
        let warning = overflow_warning(&text, 5.0, 24.0, "slides[2].items[0]");
        assert!(warning.unwrap().contains("slides[2]"));
        assert!(overflow_warning("ok", 5.0, 24.0, "x").is_none());
    }
}
