//! Template diagnosis and cleaning.
//!
//! Conference decks reused as templates usually carry baggage that breaks
//! generated slides: decorative bars hugging the left edge, text boxes
//! parked outside the slide, titles squeezed into a corner. The cleaner
//! rewrites the layout XML directly, editing only the byte spans the
//! parser recorded, so everything it does not touch survives verbatim.

use super::layout::{parse_layout, LayoutInfo, PlaceholderKind, ShapeInfo, ShapeKind};
use super::package::{SlideSize, TemplatePackage, EMUS_PER_INCH};
use crate::Result;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::ops::Range;
use std::path::Path;

/// Issues found in one layout.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutDiagnosis {
    pub index: usize,
    pub name: String,
    pub issues: Vec<String>,
    pub background_images: usize,
    pub decorative_shapes: usize,
}

/// Template-wide diagnosis.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateDiagnosis {
    pub slide_size: String,
    pub layout_count: usize,
    pub total_issues: usize,
    pub layouts: Vec<LayoutDiagnosis>,
}

impl TemplateDiagnosis {
    /// Inspect every layout of a package for known problems.
    pub fn of<R: std::io::Read + std::io::Seek>(package: &TemplatePackage<R>) -> Result<Self> {
        let size = package.slide_size();
        let mut layouts = Vec::new();
        let mut total_issues = 0;

        for (index, part) in package.layout_paths()?.iter().enumerate() {
            let xml = package.get_text(part)?;
            let info = parse_layout(&xml, index)?;
            let diagnosis = diagnose_layout(&info, size);
            total_issues += diagnosis.issues.len();
            layouts.push(diagnosis);
        }

        Ok(Self {
            slide_size: format!(
                "{:.2} x {:.2} inches",
                size.width_inches(),
                size.height_inches()
            ),
            layout_count: layouts.len(),
            total_issues,
            layouts,
        })
    }

    pub fn render_text(&self) -> String {
        let mut out = format!(
            "Slide size: {}\nLayouts: {}\nTotal issues: {}\n",
            self.slide_size, self.layout_count, self.total_issues
        );
        for layout in &self.layouts {
            if layout.issues.is_empty() {
                continue;
            }
            out.push_str(&format!("\n[{}] {}:\n", layout.index, layout.name));
            for issue in &layout.issues {
                out.push_str(&format!("  - {issue}\n"));
            }
        }
        out
    }
}

fn diagnose_layout(info: &LayoutInfo, size: SlideSize) -> LayoutDiagnosis {
    let mut issues = Vec::new();
    let mut background_images = 0;
    let mut decorative_shapes = 0;

    for ph in &info.placeholders {
        if let Some(y) = ph.y {
            let top_percent = y as f64 / size.height as f64 * 100.0;
            if top_percent > 70.0 {
                issues.push(format!(
                    "placeholder {:?} is positioned very low ({top_percent:.0}%)",
                    ph.kind
                ));
            }
        }
        if ph.kind.is_title()
            && let Some(cx) = ph.cx
            && cx < 5 * EMUS_PER_INCH
        {
            issues.push(format!(
                "title placeholder is narrow ({:.1} inches)",
                cx as f64 / EMUS_PER_INCH as f64
            ));
        }
    }

    for shape in &info.shapes {
        match shape.kind {
            ShapeKind::Picture => {
                background_images += 1;
                issues.push(format!("background image found: {}", shape.name));
            },
            ShapeKind::AutoShape => {
                let left = shape.x.unwrap_or(0);
                let width = shape.cx.unwrap_or(0);
                if left < EMUS_PER_INCH / 2 || width > 10 * EMUS_PER_INCH {
                    decorative_shapes += 1;
                    issues.push(format!("decorative shape at edge: {}", shape.name));
                }
            },
            _ => {},
        }
    }

    LayoutDiagnosis {
        index: info.index,
        name: info.name.clone(),
        issues,
        background_images,
        decorative_shapes,
    }
}

/// Result of a cleaning run.
#[derive(Debug, Clone, Serialize)]
pub struct CleanReport {
    pub source: String,
    pub output: String,
    pub removed_pictures: usize,
    pub removed_decorations: usize,
    pub fixed_positions: usize,
    pub actions: Vec<String>,
}

/// Cleans a template by rewriting its layout parts.
///
/// # Examples
///
/// ```no_run
/// # use deckforge::template::TemplateCleaner;
/// # use deckforge::Result;
/// # fn example() -> Result<()> {
/// let report = TemplateCleaner::new()
///     .with_remove_backgrounds(true)
///     .clean_file("input/conference.pptx", "templates/conference_clean.pptx")?;
/// println!("fixed {} placeholder positions", report.fixed_positions);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TemplateCleaner {
    remove_backgrounds: bool,
    remove_decorations: bool,
    fix_positions: bool,
}

impl Default for TemplateCleaner {
    fn default() -> Self {
        Self::new()
    }
}

enum Edit {
    Remove(Range<usize>),
    Replace(Range<usize>, String),
}

impl Edit {
    fn start(&self) -> usize {
        match self {
            Edit::Remove(range) => range.start,
            Edit::Replace(range, _) => range.start,
        }
    }
}

impl TemplateCleaner {
    /// Default settings: keep backgrounds, drop decorations, fix
    /// placeholder geometry.
    pub fn new() -> Self {
        Self {
            remove_backgrounds: false,
            remove_decorations: true,
            fix_positions: true,
        }
    }

    #[inline]
    pub fn with_remove_backgrounds(mut self, enabled: bool) -> Self {
        self.remove_backgrounds = enabled;
        self
    }

    #[inline]
    pub fn with_remove_decorations(mut self, enabled: bool) -> Self {
        self.remove_decorations = enabled;
        self
    }

    #[inline]
    pub fn with_fix_positions(mut self, enabled: bool) -> Self {
        self.fix_positions = enabled;
        self
    }

    /// Clean `source` and write the result to `output`.
    ///
    /// Every part other than the slide layouts is copied through
    /// unchanged.
    pub fn clean_file(
        &self,
        source: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<CleanReport> {
        let source = source.as_ref();
        let output = output.as_ref();

        let package = TemplatePackage::open(source)?;
        let size = package.slide_size();

        let mut report = CleanReport {
            source: source.display().to_string(),
            output: output.display().to_string(),
            removed_pictures: 0,
            removed_decorations: 0,
            fixed_positions: 0,
            actions: Vec::new(),
        };

        // Clean each layout part up front.
        let mut cleaned: Vec<(String, Vec<u8>)> = Vec::new();
        for (index, part) in package.layout_paths()?.iter().enumerate() {
            let xml = package.get_text(part)?;
            let info = parse_layout(&xml, index)?;
            let new_xml = self.clean_layout_xml(&xml, &info, size, &mut report);
            cleaned.push((part.clone(), new_xml.into_bytes()));
        }

        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(output)?;
        let mut writer = zip::write::ZipWriter::new(BufWriter::new(file));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        let mut archive = zip::ZipArchive::new(BufReader::new(File::open(source)?))?;
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let name = entry.name().to_string();
            writer.start_file(&name, options)?;
            if let Some((_, bytes)) = cleaned.iter().find(|(part, _)| *part == name) {
                writer.write_all(bytes)?;
            } else {
                std::io::copy(&mut entry, &mut writer)?;
            }
        }
        writer.finish()?;

        if report.removed_pictures > 0 {
            report
                .actions
                .push(format!("removed {} background images", report.removed_pictures));
        }
        if report.removed_decorations > 0 {
            report
                .actions
                .push(format!("removed {} decorative shapes", report.removed_decorations));
        }
        if report.fixed_positions > 0 {
            report
                .actions
                .push(format!("fixed {} placeholder positions", report.fixed_positions));
        }
        Ok(report)
    }

    fn clean_layout_xml(
        &self,
        xml: &str,
        info: &LayoutInfo,
        size: SlideSize,
        report: &mut CleanReport,
    ) -> String {
        let mut edits: Vec<Edit> = Vec::new();
        let name_lower = info.name.to_lowercase();
        let is_section_layout = name_lower.contains("section");
        let is_title_layout = name_lower.starts_with("title") && !name_lower.contains("only");

        for shape in &info.shapes {
            if shape.placeholder.is_none() {
                if let Some(edit) = self.plan_shape_removal(shape, size) {
                    match shape.kind {
                        ShapeKind::Picture => report.removed_pictures += 1,
                        _ => report.removed_decorations += 1,
                    }
                    edits.push(edit);
                }
                continue;
            }

            if !self.fix_positions {
                continue;
            }
            if let Some(edit) =
                plan_position_fix(shape, size, is_section_layout, is_title_layout)
            {
                report.fixed_positions += 1;
                edits.extend(edit);
            }
        }

        apply_edits(xml, edits)
    }

    fn plan_shape_removal(&self, shape: &ShapeInfo, size: SlideSize) -> Option<Edit> {
        let left = shape.x.unwrap_or(0);
        let width = shape.cx.unwrap_or(0);

        if self.remove_backgrounds && shape.kind == ShapeKind::Picture {
            return Some(Edit::Remove(shape.span.clone()));
        }
        if !self.remove_decorations {
            return None;
        }

        // Anything parked past the right edge of the slide.
        if left > size.width {
            return Some(Edit::Remove(shape.span.clone()));
        }
        match shape.kind {
            ShapeKind::TextBox => {
                if left > (size.width as f64 * 0.95) as i64 {
                    return Some(Edit::Remove(shape.span.clone()));
                }
                // Narrow left-edge text boxes render as vertical text.
                if left < 3 * EMUS_PER_INCH / 10 && width < EMUS_PER_INCH / 2 {
                    return Some(Edit::Remove(shape.span.clone()));
                }
            },
            ShapeKind::AutoShape => {
                if left < 3 * EMUS_PER_INCH / 10 && width < EMUS_PER_INCH {
                    return Some(Edit::Remove(shape.span.clone()));
                }
                if width > (size.width as f64 * 0.9) as i64 {
                    return Some(Edit::Remove(shape.span.clone()));
                }
            },
            _ => {},
        }
        None
    }
}

/// Geometry clamps for a placeholder shape, as span replacements.
///
/// Moving a placeholder rewrites only `a:off`, so width and height are
/// untouched by construction.
fn plan_position_fix(
    shape: &ShapeInfo,
    size: SlideSize,
    is_section_layout: bool,
    is_title_layout: bool,
) -> Option<Vec<Edit>> {
    let ph = shape.placeholder.as_ref()?;
    let off_span = shape.off_span.clone()?;
    let x = shape.x?;
    let y = shape.y?;

    let off = |x: i64, y: i64| format!(r#"<a:off x="{x}" y="{y}"/>"#);

    if ph.kind.is_title() {
        if is_section_layout {
            let top_percent = y as f64 / size.height as f64;
            if !(0.10..=0.60).contains(&top_percent) {
                let new_y = (size.height as f64 * 0.35) as i64;
                return Some(vec![Edit::Replace(off_span, off(x, new_y))]);
            }
        }
        if is_title_layout
            && let Some(cx) = shape.cx
            && (cx as f64) < size.width as f64 * 0.5
        {
            let new_cx = (size.width as f64 * 0.75) as i64;
            let new_x = (size.width - new_cx) / 2;
            let mut edits = vec![Edit::Replace(off_span, off(new_x, y))];
            if let Some(ext_span) = shape.ext_span.clone()
                && let Some(cy) = shape.cy
            {
                edits.push(Edit::Replace(
                    ext_span,
                    format!(r#"<a:ext cx="{new_cx}" cy="{cy}"/>"#),
                ));
            }
            return Some(edits);
        }
        return None;
    }

    match ph.kind {
        PlaceholderKind::Subtitle => {
            if y as f64 > size.height as f64 * 0.7 {
                let new_y = (size.height as f64 * 0.55) as i64;
                return Some(vec![Edit::Replace(off_span, off(x, new_y))]);
            }
        },
        PlaceholderKind::Body | PlaceholderKind::Object => {
            if x < 0 {
                let new_x = EMUS_PER_INCH / 2;
                return Some(vec![Edit::Replace(off_span, off(new_x, y))]);
            }
        },
        _ => {},
    }
    None
}

/// Apply non-overlapping span edits back to front.
fn apply_edits(xml: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|edit| edit.start());
    let mut out = xml.to_string();
    for edit in edits.into_iter().rev() {
        match edit {
            Edit::Remove(range) => out.replace_range(range, ""),
            Edit::Replace(range, text) => out.replace_range(range, &text),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout_xml() -> String {
        format!(
            r#"<p:sldLayout xmlns:p="p" xmlns:a="a"><p:cSld name="Section Header"><p:spTree>{title}{decoration}{picture}</p:spTree></p:cSld></p:sldLayout>"#,
            title = r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="914400" y="6172200"/><a:ext cx="9144000" cy="914400"/></a:xfrm></p:spPr></p:sp>"#,
            decoration = r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Bar"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="457200" cy="6858000"/></a:xfrm></p:spPr></p:sp>"#,
            picture = r#"<p:pic><p:nvPicPr><p:cNvPr id="4" name="Background"/></p:nvPicPr><p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="12192000" cy="6858000"/></a:xfrm></p:spPr></p:pic>"#,
        )
    }

    const SIZE: SlideSize = SlideSize {
        width: 12_192_000,
        height: 6_858_000,
    };

    #[test]
    fn test_diagnose_flags_low_placeholder_and_decorations() {
        let xml = layout_xml();
        let info = parse_layout(&xml, 0).unwrap();
        let diagnosis = diagnose_layout(&info, SIZE);
        assert_eq!(diagnosis.background_images, 1);
        assert_eq!(diagnosis.decorative_shapes, 1);
        assert!(diagnosis
            .issues
            .iter()
            .any(|issue| issue.contains("positioned very low")));
    }

    #[test]
    fn test_clean_drops_decoration_and_clamps_title() {
        let xml = layout_xml();
        let info = parse_layout(&xml, 0).unwrap();
        let mut report = CleanReport {
            source: String::new(),
            output: String::new(),
            removed_pictures: 0,
            removed_decorations: 0,
            fixed_positions: 0,
            actions: Vec::new(),
        };
        let cleaner = TemplateCleaner::new();
        let out = cleaner.clean_layout_xml(&xml, &info, SIZE, &mut report);

        assert_eq!(report.removed_decorations, 1);
        assert_eq!(report.removed_pictures, 0);
        assert_eq!(report.fixed_positions, 1);
        assert!(!out.contains(r#"name="Bar""#));
        // Section title was at 90% height; clamped to 35%.
        let expected_y = (SIZE.height as f64 * 0.35) as i64;
        assert!(out.contains(&format!(r#"y="{expected_y}""#)));
        // Width untouched.
        assert!(out.contains(r#"cx="9144000""#));
        // Backgrounds are kept by default.
        assert!(out.contains(r#"name="Background""#));
    }

    #[test]
    fn test_clean_removes_backgrounds_when_asked() {
        let xml = layout_xml();
        let info = parse_layout(&xml, 0).unwrap();
        let mut report = CleanReport {
            source: String::new(),
            output: String::new(),
            removed_pictures: 0,
            removed_decorations: 0,
            fixed_positions: 0,
            actions: Vec::new(),
        };
        let cleaner = TemplateCleaner::new().with_remove_backgrounds(true);
        let out = cleaner.clean_layout_xml(&xml, &info, SIZE, &mut report);
        assert_eq!(report.removed_pictures, 1);
        assert!(!out.contains(r#"name="Background""#));
    }

    #[test]
    fn test_negative_body_left_is_clamped() {
        let xml = r#"<p:sldLayout xmlns:p="p" xmlns:a="a"><p:cSld name="Custom"><p:spTree><p:sp><p:nvSpPr><p:cNvPr id="2" name="Body 1"/><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="-91440" y="1828800"/><a:ext cx="9144000" cy="3657600"/></a:xfrm></p:spPr></p:sp></p:spTree></p:cSld></p:sldLayout>"#;
        let info = parse_layout(xml, 0).unwrap();
        let mut report = CleanReport {
            source: String::new(),
            output: String::new(),
            removed_pictures: 0,
            removed_decorations: 0,
            fixed_positions: 0,
            actions: Vec::new(),
        };
        let out = TemplateCleaner::new().clean_layout_xml(xml, &info, SIZE, &mut report);
        assert_eq!(report.fixed_positions, 1);
        assert!(out.contains(r#"x="457200""#));
        assert!(out.contains(r#"y="1828800""#));
    }
}
