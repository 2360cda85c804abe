//! Theme colors and contrast helpers.

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Accent purple used for backgrounds and title bars.
pub const PURPLE: Color = Color::new(0x5B, 0x5F, 0xC7);
/// Body text on light backgrounds.
pub const DARK_GRAY: Color = Color::new(0x33, 0x33, 0x33);
pub const WHITE: Color = Color::new(0xFF, 0xFF, 0xFF);
pub const LIGHT_GRAY: Color = Color::new(0xF5, 0xF5, 0xF5);

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Uppercase hex without a leading `#`, as OOXML `srgbClr` wants it.
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// WCAG relative luminance, 0.0 (black) to 1.0 (white).
    pub fn luminance(&self) -> f64 {
        fn channel(c: u8) -> f64 {
            let c = c as f64 / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * channel(self.r) + 0.7152 * channel(self.g) + 0.0722 * channel(self.b)
    }

    /// Backgrounds below 0.5 luminance count as dark.
    #[inline]
    pub fn is_dark(&self) -> bool {
        self.luminance() < 0.5
    }

    /// Text color that reads well against this background.
    pub fn contrast_text(&self) -> Color {
        if self.is_dark() { WHITE } else { DARK_GRAY }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luminance_extremes() {
        assert!(Color::new(0, 0, 0).luminance() < 0.01);
        assert!(Color::new(255, 255, 255).luminance() > 0.99);
    }

    #[test]
    fn test_accent_purple_is_dark() {
        assert!(PURPLE.is_dark());
        assert_eq!(PURPLE.contrast_text(), WHITE);
        assert_eq!(LIGHT_GRAY.contrast_text(), DARK_GRAY);
    }

    #[test]
    fn test_hex_rendering() {
        assert_eq!(PURPLE.hex(), "5B5FC7");
        assert_eq!(DARK_GRAY.hex(), "333333");
    }
}
