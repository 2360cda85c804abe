//! PPTX package (ZIP archive) handling.

use crate::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

pub const EMUS_PER_INCH: i64 = 914_400;

/// Slide dimensions in EMU, as declared by `p:sldSz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideSize {
    pub width: i64,
    pub height: i64,
}

impl SlideSize {
    #[inline]
    pub fn width_inches(&self) -> f64 {
        self.width as f64 / EMUS_PER_INCH as f64
    }

    #[inline]
    pub fn height_inches(&self) -> f64 {
        self.height as f64 / EMUS_PER_INCH as f64
    }

    /// "16:9" when within 0.1 of the widescreen ratio, otherwise "4:3".
    pub fn aspect_ratio(&self) -> &'static str {
        let ratio = self.width as f64 / self.height as f64;
        if (ratio - 16.0 / 9.0).abs() < 0.1 {
            "16:9"
        } else {
            "4:3"
        }
    }
}

/// A presentation package opened for reading.
#[derive(Debug)]
pub struct TemplatePackage<R> {
    archive: RefCell<zip::ZipArchive<R>>,
    slide_size: SlideSize,
}

impl TemplatePackage<BufReader<File>> {
    /// Open a `.pptx` file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> TemplatePackage<R> {
    /// Open a package from a reader.
    ///
    /// The ZIP local-file signature is checked before handing the stream
    /// to the archive parser so that a stray `.ppt` or renamed file fails
    /// with a format error rather than a ZIP error.
    pub fn from_reader(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic[..2] != b"PK" {
            return Err(Error::InvalidFormat(
                "not a ZIP archive (missing PK signature)".to_string(),
            ));
        }
        reader.rewind()?;

        let mut archive = zip::ZipArchive::new(reader)
            .map_err(|_| Error::InvalidFormat("invalid ZIP archive".to_string()))?;

        let slide_size = {
            let mut part = archive.by_name("ppt/presentation.xml").map_err(|_| {
                Error::InvalidFormat(
                    "no ppt/presentation.xml part; not a PowerPoint package".to_string(),
                )
            })?;
            let mut xml = String::new();
            part.read_to_string(&mut xml)?;
            parse_slide_size(&xml)?
        };

        Ok(Self {
            archive: RefCell::new(archive),
            slide_size,
        })
    }

    pub fn slide_size(&self) -> SlideSize {
        self.slide_size
    }

    /// Get a file from the package by path.
    pub fn get_file(&self, path: &str) -> Result<Vec<u8>> {
        let mut archive = self.archive.borrow_mut();
        let mut file = archive
            .by_name(path)
            .map_err(|_| Error::ComponentNotFound(path.to_string()))?;

        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Get a file as UTF-8 text.
    pub fn get_text(&self, path: &str) -> Result<String> {
        let bytes = self.get_file(path)?;
        String::from_utf8(bytes)
            .map_err(|_| Error::InvalidFormat(format!("part is not UTF-8: {path}")))
    }

    /// Check if a file exists in the package.
    pub fn has_file(&self, path: &str) -> bool {
        self.archive.borrow_mut().by_name(path).is_ok()
    }

    /// List all files in the package.
    pub fn files(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        let mut archive = self.archive.borrow_mut();
        for i in 0..archive.len() {
            let file = archive.by_index(i)?;
            files.push(file.name().to_string());
        }
        Ok(files)
    }

    /// Slide layout parts sorted by layout number.
    pub fn layout_paths(&self) -> Result<Vec<String>> {
        let mut layouts: Vec<(u32, String)> = self
            .files()?
            .into_iter()
            .filter_map(|name| {
                let number = name
                    .strip_prefix("ppt/slideLayouts/slideLayout")?
                    .strip_suffix(".xml")?
                    .parse()
                    .ok()?;
                Some((number, name))
            })
            .collect();
        layouts.sort_by_key(|(number, _)| *number);
        Ok(layouts.into_iter().map(|(_, name)| name).collect())
    }

    /// Slide parts sorted by slide number.
    pub fn slide_paths(&self) -> Result<Vec<String>> {
        let mut slides: Vec<(u32, String)> = self
            .files()?
            .into_iter()
            .filter_map(|name| {
                let number = name
                    .strip_prefix("ppt/slides/slide")?
                    .strip_suffix(".xml")?
                    .parse()
                    .ok()?;
                Some((number, name))
            })
            .collect();
        slides.sort_by_key(|(number, _)| *number);
        Ok(slides.into_iter().map(|(_, name)| name).collect())
    }

    /// All media parts under `ppt/media/`.
    pub fn media_paths(&self) -> Result<Vec<String>> {
        Ok(self
            .files()?
            .into_iter()
            .filter(|name| name.starts_with("ppt/media/"))
            .collect())
    }
}

/// Extract the `p:sldSz` dimensions from presentation.xml.
fn parse_slide_size(xml: &str) -> Result<SlideSize> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"p:sldSz" =>
            {
                let mut width = None;
                let mut height = None;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value);
                    match attr.key.as_ref() {
                        b"cx" => width = value.parse().ok(),
                        b"cy" => height = value.parse().ok(),
                        _ => {}
                    }
                }
                return match (width, height) {
                    (Some(width), Some(height)) => Ok(SlideSize { width, height }),
                    _ => Err(Error::InvalidFormat(
                        "p:sldSz missing cx/cy attributes".to_string(),
                    )),
                };
            },
            Ok(Event::Eof) => {
                return Err(Error::InvalidFormat(
                    "presentation.xml has no p:sldSz element".to_string(),
                ));
            },
            Err(e) => return Err(e.into()),
            _ => {},
        }
        buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::{SimpleFileOptions, ZipWriter};

    fn minimal_pptx() -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.start_file("ppt/presentation.xml", options).unwrap();
        writer
            .write_all(
                br#"<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#,
            )
            .unwrap();
        writer
            .start_file("ppt/slideLayouts/slideLayout2.xml", options)
            .unwrap();
        writer.write_all(b"<p:sldLayout/>").unwrap();
        writer
            .start_file("ppt/slideLayouts/slideLayout10.xml", options)
            .unwrap();
        writer.write_all(b"<p:sldLayout/>").unwrap();
        writer.start_file("ppt/media/image1.png", options).unwrap();
        writer.write_all(b"png").unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_open_reads_slide_size() {
        let package = TemplatePackage::from_reader(Cursor::new(minimal_pptx())).unwrap();
        let size = package.slide_size();
        assert_eq!(size.width, 12_192_000);
        assert!((size.width_inches() - 13.333).abs() < 0.01);
        assert_eq!(size.aspect_ratio(), "16:9");
    }

    #[test]
    fn test_layout_paths_numeric_order() {
        let package = TemplatePackage::from_reader(Cursor::new(minimal_pptx())).unwrap();
        let layouts = package.layout_paths().unwrap();
        assert_eq!(
            layouts,
            vec![
                "ppt/slideLayouts/slideLayout2.xml",
                "ppt/slideLayouts/slideLayout10.xml"
            ]
        );
        assert_eq!(package.media_paths().unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_non_zip() {
        let err = TemplatePackage::from_reader(Cursor::new(b"not a zip file".to_vec()))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }
}
