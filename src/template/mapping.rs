//! Slide-type to layout-index mapping and the analysis manifest.

use super::layout::{LayoutCategory, LayoutInfo, parse_layout};
use super::package::TemplatePackage;
use crate::ir::SlideKind;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::io::{Read, Seek};
use std::path::Path;

/// Recommended layout index per slide type.
///
/// First match wins per category; anything the template does not provide
/// falls back along the documented chain so every slide type always
/// resolves to some layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutMapping {
    pub title: usize,
    pub content: usize,
    pub section: usize,
    pub agenda: usize,
    pub summary: usize,
    pub closing: usize,
    pub two_column: usize,
    pub code: usize,
    pub photo: usize,
    pub blank: usize,
    pub title_only: usize,
}

impl LayoutMapping {
    /// Derive the mapping from analyzed layouts.
    pub fn from_layouts(layouts: &[LayoutInfo]) -> Self {
        let first = |category: LayoutCategory| -> Option<usize> {
            layouts
                .iter()
                .find(|layout| layout.category == category)
                .map(|layout| layout.index)
        };

        let content = first(LayoutCategory::Content).unwrap_or(1);
        let title = first(LayoutCategory::Title).unwrap_or(0);
        let section = first(LayoutCategory::Section).unwrap_or(content);
        let blank = first(LayoutCategory::Blank).unwrap_or(content);

        Self {
            title,
            content,
            section,
            agenda: first(LayoutCategory::Agenda).unwrap_or(content),
            summary: content,
            closing: first(LayoutCategory::Closing).unwrap_or(section),
            two_column: first(LayoutCategory::TwoColumn).unwrap_or(content),
            code: first(LayoutCategory::Code).unwrap_or(content),
            photo: first(LayoutCategory::Photo).unwrap_or(content),
            blank,
            title_only: first(LayoutCategory::TitleOnly).unwrap_or(blank),
        }
    }

    /// Resolve the layout index for a slide type.
    pub fn layout_for(&self, kind: SlideKind) -> usize {
        match kind {
            SlideKind::Title => self.title,
            SlideKind::Content => self.content,
            SlideKind::Section => self.section,
            SlideKind::Agenda => self.agenda,
            SlideKind::Summary => self.summary,
            SlideKind::Closing => self.closing,
            SlideKind::TwoColumn => self.two_column,
            SlideKind::Code => self.code,
            SlideKind::Quote => self.content,
            SlideKind::Photo => self.photo,
            SlideKind::Blank => self.blank,
            SlideKind::TitleOnly => self.title_only,
        }
    }
}

/// Full template analysis, serialized as the `{stem}_layouts.json`
/// manifest.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateAnalysis {
    pub template: String,
    pub template_path: String,
    pub slide_width_inches: f64,
    pub slide_height_inches: f64,
    pub aspect_ratio: &'static str,
    pub layouts: Vec<LayoutInfo>,
    pub layout_mapping: LayoutMapping,
}

impl TemplateAnalysis {
    /// Analyze a template file on disk.
    pub fn analyze(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let package = TemplatePackage::open(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_package(&package, &name, &path.display().to_string())
    }

    /// Analyze an already-opened package.
    pub fn from_package<R: Read + Seek>(
        package: &TemplatePackage<R>,
        template: &str,
        template_path: &str,
    ) -> Result<Self> {
        let mut layouts = Vec::new();
        for (index, part) in package.layout_paths()?.iter().enumerate() {
            let xml = package.get_text(part)?;
            layouts.push(parse_layout(&xml, index)?);
        }

        let size = package.slide_size();
        let layout_mapping = LayoutMapping::from_layouts(&layouts);
        Ok(Self {
            template: template.to_string(),
            template_path: template_path.to_string(),
            slide_width_inches: (size.width_inches() * 100.0).round() / 100.0,
            slide_height_inches: (size.height_inches() * 100.0).round() / 100.0,
            aspect_ratio: size.aspect_ratio(),
            layouts,
            layout_mapping,
        })
    }

    /// Human-readable summary for the console.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Template: {} ({}\" x {}\", {})\n",
            self.template, self.slide_width_inches, self.slide_height_inches, self.aspect_ratio
        ));
        out.push_str("Layouts:\n");
        for layout in &self.layouts {
            let mut flags = Vec::new();
            if layout.has_title {
                flags.push("T".to_string());
            }
            if layout.has_body {
                flags.push(format!("B{}", layout.body_count));
            }
            if layout.has_content {
                flags.push("C".to_string());
            }
            if layout.has_picture {
                flags.push("P".to_string());
            }
            let flags = if flags.is_empty() {
                "-".to_string()
            } else {
                flags.join(",")
            };
            out.push_str(&format!(
                "  [{:2}] {:40} {:12} ({})\n",
                layout.index,
                layout.name,
                layout.category.as_str(),
                flags
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::layout::categorize;

    fn layout(index: usize, name: &str) -> LayoutInfo {
        LayoutInfo {
            index,
            name: name.to_string(),
            category: categorize(name, false, false, false, false),
            has_title: false,
            has_subtitle: false,
            has_body: false,
            has_content: false,
            has_picture: false,
            body_count: 0,
            placeholders: Vec::new(),
            shapes: Vec::new(),
        }
    }

    #[test]
    fn test_mapping_first_match_wins() {
        let layouts = vec![
            layout(0, "Title Slide"),
            layout(1, "Title and Content"),
            layout(2, "Title and Content Alt"),
            layout(3, "Section Header"),
        ];
        let mapping = LayoutMapping::from_layouts(&layouts);
        assert_eq!(mapping.title, 0);
        assert_eq!(mapping.content, 1);
        assert_eq!(mapping.section, 3);
        assert_eq!(mapping.summary, 1);
    }

    #[test]
    fn test_mapping_fallback_chain() {
        let layouts = vec![layout(0, "Title Slide")];
        let mapping = LayoutMapping::from_layouts(&layouts);
        // No content layout: default index 1.
        assert_eq!(mapping.content, 1);
        assert_eq!(mapping.section, 1);
        assert_eq!(mapping.closing, 1);
        assert_eq!(mapping.title_only, 1);
        assert_eq!(mapping.layout_for(SlideKind::Quote), 1);
    }

    #[test]
    fn test_closing_prefers_section() {
        let layouts = vec![
            layout(0, "Title Slide"),
            layout(1, "Title and Content"),
            layout(2, "Section Header"),
        ];
        let mapping = LayoutMapping::from_layouts(&layouts);
        assert_eq!(mapping.closing, 2);
    }
}
