//! Per-slide main-image extraction from presentation packages.

use super::meta::{image_score, is_icon_or_logo, ImageMeta};
use crate::template::TemplatePackage;
use crate::{Error, Result};
use log::{info, warn};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Component, Path};

/// One image written to the output directory.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedImage {
    /// 1-based slide number.
    pub slide: usize,
    pub file_name: String,
    pub width_px: u32,
    pub height_px: u32,
    pub is_icon: bool,
}

/// Extracts the main content image of each slide.
///
/// Pixel sizes come from the placed shape extent at 96 DPI, matching how
/// the icon heuristic was calibrated, not from the stored bitmap.
#[derive(Debug, Clone, Default)]
pub struct ImageExtractor {
    skip_icons: bool,
}

/// A picture placed on a slide: relationship id plus shape extent.
struct PlacedPicture {
    embed_id: String,
    cx: i64,
    cy: i64,
}

impl ImageExtractor {
    pub fn new() -> Self {
        Self { skip_icons: false }
    }

    /// Skip images the icon heuristic flags instead of extracting them.
    #[inline]
    pub fn with_skip_icons(mut self, enabled: bool) -> Self {
        self.skip_icons = enabled;
        self
    }

    /// Extract images from `pptx` into `output_dir` as `slide_NN.ext`.
    ///
    /// Refuses to write into the `input/` directory.
    pub fn extract(
        &self,
        pptx: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
    ) -> Result<Vec<ExtractedImage>> {
        let output_dir = output_dir.as_ref();
        if output_dir
            .components()
            .next()
            .is_some_and(|c| c == Component::Normal("input".as_ref()))
        {
            return Err(Error::ReservedDirectory(output_dir.display().to_string()));
        }

        let package = TemplatePackage::open(pptx.as_ref())?;
        std::fs::create_dir_all(output_dir)?;

        let mut extracted = Vec::new();
        for (slide_idx, slide_part) in package.slide_paths()?.iter().enumerate() {
            let slide_num = slide_idx + 1;
            let xml = package.get_text(slide_part)?;
            let rels = self.read_rels(&package, slide_part)?;

            let mut pictures = parse_pictures(&xml)?;
            if self.skip_icons {
                pictures.retain(|pic| {
                    let (w, h) = (emu_to_px(pic.cx), emu_to_px(pic.cy));
                    if is_icon_or_logo(w, h) {
                        info!("slide {slide_num}: skipped icon/logo ({w}x{h}px)");
                        false
                    } else {
                        true
                    }
                });
            }

            let Some(main) = pictures.iter().max_by(|a, b| {
                let score_a = image_score(emu_to_px(a.cx), emu_to_px(a.cy));
                let score_b = image_score(emu_to_px(b.cx), emu_to_px(b.cy));
                score_a.total_cmp(&score_b)
            }) else {
                continue;
            };

            let Some(target) = rels.get(&main.embed_id) else {
                warn!("slide {slide_num}: unresolved image relationship {}", main.embed_id);
                continue;
            };
            let media_part = resolve_target(slide_part, target);
            let blob = package.get_file(&media_part)?;

            let ext = ImageMeta::sniff(&blob)
                .map(|meta| meta.format.extension())
                .or_else(|| media_part.rsplit('.').next())
                .unwrap_or("bin");
            let width_px = emu_to_px(main.cx);
            let height_px = emu_to_px(main.cy);
            let file_name = format!("slide_{slide_num:02}.{ext}");
            std::fs::write(output_dir.join(&file_name), &blob)?;

            extracted.push(ExtractedImage {
                slide: slide_num,
                file_name,
                width_px,
                height_px,
                is_icon: is_icon_or_logo(width_px, height_px),
            });
        }

        info!(
            "extracted images from {} slides to {}",
            extracted.len(),
            output_dir.display()
        );
        Ok(extracted)
    }

    fn read_rels<R: std::io::Read + std::io::Seek>(
        &self,
        package: &TemplatePackage<R>,
        slide_part: &str,
    ) -> Result<HashMap<String, String>> {
        let rels_part = rels_path(slide_part);
        if !package.has_file(&rels_part) {
            return Ok(HashMap::new());
        }
        let xml = package.get_text(&rels_part)?;
        parse_relationships(&xml)
    }
}

#[inline]
fn emu_to_px(emu: i64) -> u32 {
    (emu as f64 / 914_400.0 * 96.0) as u32
}

/// `ppt/slides/slide3.xml` -> `ppt/slides/_rels/slide3.xml.rels`
fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target relative to the part's directory.
fn resolve_target(part: &str, target: &str) -> String {
    let base = part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            },
            "." | "" => {},
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn parse_relationships(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut rels = HashMap::new();
    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).into_owned();
                    match attr.key.as_ref() {
                        b"Id" => id = Some(value),
                        b"Target" => target = Some(value),
                        _ => {},
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    rels.insert(id, target);
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {},
        }
    }
    Ok(rels)
}

/// Collect every `p:pic` with its blip relationship and shape extent.
fn parse_pictures(xml: &str) -> Result<Vec<PlacedPicture>> {
    let mut reader = Reader::from_str(xml);
    let mut pictures = Vec::new();

    let mut in_pic = 0usize;
    let mut embed_id: Option<String> = None;
    let mut cx = 0i64;
    let mut cy = 0i64;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"p:pic" => {
                in_pic += 1;
                embed_id = None;
                cx = 0;
                cy = 0;
            },
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if in_pic > 0 => {
                match e.name().as_ref() {
                    b"a:blip" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"r:embed" {
                                embed_id =
                                    Some(String::from_utf8_lossy(&attr.value).into_owned());
                            }
                        }
                    },
                    b"a:ext" if cx == 0 => {
                        for attr in e.attributes().flatten() {
                            let value = String::from_utf8_lossy(&attr.value);
                            match attr.key.as_ref() {
                                b"cx" => cx = value.parse().unwrap_or(0),
                                b"cy" => cy = value.parse().unwrap_or(0),
                                _ => {},
                            }
                        }
                    },
                    _ => {},
                }
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"p:pic" => {
                in_pic = in_pic.saturating_sub(1);
                if let Some(id) = embed_id.take() {
                    pictures.push(PlacedPicture { embed_id: id, cx, cy });
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {},
        }
    }
    Ok(pictures)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rels_path() {
        assert_eq!(
            rels_path("ppt/slides/slide3.xml"),
            "ppt/slides/_rels/slide3.xml.rels"
        );
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../media/image3.png"),
            "ppt/media/image3.png"
        );
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "chart.xml"),
            "ppt/slides/chart.xml"
        );
    }

    #[test]
    fn test_parse_pictures_extent_and_embed() {
        let xml = r#"<p:sld xmlns:p="p" xmlns:a="a" xmlns:r="r"><p:cSld><p:spTree>
            <p:pic><p:blipFill><a:blip r:embed="rId2"/></p:blipFill>
              <p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="914400" cy="914400"/></a:xfrm></p:spPr></p:pic>
            <p:pic><p:blipFill><a:blip r:embed="rId3"/></p:blipFill>
              <p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="9144000" cy="5143500"/></a:xfrm></p:spPr></p:pic>
        </p:spTree></p:cSld></p:sld>"#;
        let pictures = parse_pictures(xml).unwrap();
        assert_eq!(pictures.len(), 2);
        assert_eq!(pictures[0].embed_id, "rId2");
        assert_eq!(emu_to_px(pictures[1].cx), 960);
    }

    #[test]
    fn test_refuses_input_directory() {
        let err = ImageExtractor::new()
            .extract("missing.pptx", "input/images")
            .unwrap_err();
        assert!(matches!(err, Error::ReservedDirectory(_)));
    }

    #[test]
    fn test_parse_relationships() {
        let xml = r#"<Relationships xmlns="x"><Relationship Id="rId2" Type="t" Target="../media/image1.png"/></Relationships>"#;
        let rels = parse_relationships(xml).unwrap();
        assert_eq!(rels["rId2"], "../media/image1.png");
    }
}
