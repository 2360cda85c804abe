//! Image format sniffing and the icon/logo heuristic.

/// Raster formats the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    WebP,
}

impl ImageFormat {
    /// Conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Gif => "gif",
            ImageFormat::WebP => "webp",
        }
    }
}

/// Format and pixel dimensions read from an image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMeta {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl ImageMeta {
    /// Sniff format and dimensions from the leading bytes.
    ///
    /// Only headers are read; the pixel data is never decoded.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            return Self::sniff_png(data);
        }
        if data.starts_with(&[0xFF, 0xD8]) {
            return Self::sniff_jpeg(data);
        }
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Self::sniff_gif(data);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::sniff_webp(data);
        }
        None
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f64 / self.height as f64
        }
    }

    fn sniff_png(data: &[u8]) -> Option<Self> {
        // IHDR is the first chunk; width/height at fixed offsets.
        if data.len() < 24 || &data[12..16] != b"IHDR" {
            return None;
        }
        Some(Self {
            format: ImageFormat::Png,
            width: u32::from_be_bytes([data[16], data[17], data[18], data[19]]),
            height: u32::from_be_bytes([data[20], data[21], data[22], data[23]]),
        })
    }

    fn sniff_jpeg(data: &[u8]) -> Option<Self> {
        // Walk segments until a start-of-frame marker.
        let mut pos = 2usize;
        while pos + 9 <= data.len() {
            if data[pos] != 0xFF {
                pos += 1;
                continue;
            }
            let marker = data[pos + 1];
            match marker {
                // Fill bytes and standalone markers carry no length.
                0xFF | 0x01 | 0xD0..=0xD7 => {
                    pos += 1;
                    continue;
                },
                0xC0..=0xCF if marker != 0xC4 && marker != 0xC8 && marker != 0xCC => {
                    let height = u16::from_be_bytes([data[pos + 5], data[pos + 6]]) as u32;
                    let width = u16::from_be_bytes([data[pos + 7], data[pos + 8]]) as u32;
                    return Some(Self {
                        format: ImageFormat::Jpeg,
                        width,
                        height,
                    });
                },
                _ => {
                    let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
                    pos += 2 + length;
                },
            }
        }
        None
    }

    fn sniff_gif(data: &[u8]) -> Option<Self> {
        if data.len() < 10 {
            return None;
        }
        Some(Self {
            format: ImageFormat::Gif,
            width: u16::from_le_bytes([data[6], data[7]]) as u32,
            height: u16::from_le_bytes([data[8], data[9]]) as u32,
        })
    }

    fn sniff_webp(data: &[u8]) -> Option<Self> {
        if data.len() < 30 {
            return None;
        }
        match &data[12..16] {
            b"VP8X" => Some(Self {
                format: ImageFormat::WebP,
                width: 1 + u32::from_le_bytes([data[24], data[25], data[26], 0]),
                height: 1 + u32::from_le_bytes([data[27], data[28], data[29], 0]),
            }),
            b"VP8 " => Some(Self {
                format: ImageFormat::WebP,
                width: (u16::from_le_bytes([data[26], data[27]]) & 0x3FFF) as u32,
                height: (u16::from_le_bytes([data[28], data[29]]) & 0x3FFF) as u32,
            }),
            b"VP8L" => {
                if data[20] != 0x2F {
                    return None;
                }
                let bits = u32::from_le_bytes([data[21], data[22], data[23], data[24]]);
                Some(Self {
                    format: ImageFormat::WebP,
                    width: 1 + (bits & 0x3FFF),
                    height: 1 + ((bits >> 14) & 0x3FFF),
                })
            },
            _ => None,
        }
    }
}

/// Whether a placed image is likely an icon or logo rather than content.
///
/// Small on any dimension, or roughly square and at most 800px.
pub fn is_icon_or_logo(width_px: u32, height_px: u32) -> bool {
    const MIN_SIZE: u32 = 400;
    if width_px < MIN_SIZE || height_px < MIN_SIZE {
        return true;
    }
    let aspect = if height_px > 0 {
        width_px as f64 / height_px as f64
    } else {
        1.0
    };
    (0.9..=1.1).contains(&aspect) && width_px.max(height_px) <= 800
}

/// Score for picking the main image of a slide.
///
/// Area, with a 1.5x bonus for widescreen-ish aspect ratios, which
/// favours screenshots over portrait photos of the same area.
pub fn image_score(width_px: u32, height_px: u32) -> f64 {
    let area = width_px as f64 * height_px as f64;
    let aspect = if height_px > 0 {
        width_px as f64 / height_px as f64
    } else {
        1.0
    };
    if (1.6..=1.9).contains(&aspect) {
        area * 1.5
    } else {
        area
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
        data.extend_from_slice(&13u32.to_be_bytes());
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[8, 6, 0, 0, 0]);
        data
    }

    #[test]
    fn test_sniff_png() {
        let meta = ImageMeta::sniff(&png_header(1920, 1080)).unwrap();
        assert_eq!(meta.format, ImageFormat::Png);
        assert_eq!((meta.width, meta.height), (1920, 1080));
    }

    #[test]
    fn test_sniff_gif() {
        let mut data = b"GIF89a".to_vec();
        data.extend_from_slice(&640u16.to_le_bytes());
        data.extend_from_slice(&480u16.to_le_bytes());
        let meta = ImageMeta::sniff(&data).unwrap();
        assert_eq!(meta.format, ImageFormat::Gif);
        assert_eq!((meta.width, meta.height), (640, 480));
    }

    #[test]
    fn test_sniff_jpeg_sof() {
        // SOI, APP0 (minimal), SOF0 with 800x600.
        let mut data = vec![0xFF, 0xD8];
        data.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00]);
        data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x0B, 0x08]);
        data.extend_from_slice(&600u16.to_be_bytes());
        data.extend_from_slice(&800u16.to_be_bytes());
        data.extend_from_slice(&[0x03, 0x01, 0x22, 0x00]);
        let meta = ImageMeta::sniff(&data).unwrap();
        assert_eq!(meta.format, ImageFormat::Jpeg);
        assert_eq!((meta.width, meta.height), (800, 600));
    }

    #[test]
    fn test_sniff_unknown() {
        assert!(ImageMeta::sniff(b"BM12345").is_none());
    }

    #[test]
    fn test_icon_heuristic() {
        assert!(is_icon_or_logo(64, 64));
        assert!(is_icon_or_logo(1200, 300));
        assert!(is_icon_or_logo(700, 700));
        assert!(!is_icon_or_logo(900, 900));
        assert!(!is_icon_or_logo(1920, 1080));
    }

    #[test]
    fn test_score_prefers_widescreen() {
        // Same area; the 16:9 one gets the bonus.
        assert!(image_score(1600, 900) > image_score(1200, 1200));
    }
}
