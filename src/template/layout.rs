//! Slide layout parsing and categorization.

use crate::Result;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;
use std::ops::Range;

/// Placeholder type, from the `p:ph` type attribute.
///
/// An omitted type attribute means a content placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderKind {
    Title,
    CenterTitle,
    Subtitle,
    Body,
    Object,
    Picture,
    Other,
}

impl PlaceholderKind {
    fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some("title") => Self::Title,
            Some("ctrTitle") => Self::CenterTitle,
            Some("subTitle") => Self::Subtitle,
            Some("body") => Self::Body,
            Some("pic") => Self::Picture,
            None => Self::Object,
            Some(_) => Self::Other,
        }
    }

    #[inline]
    pub fn is_title(&self) -> bool {
        matches!(self, Self::Title | Self::CenterTitle)
    }
}

/// A placeholder declared by a layout, with its geometry in EMU.
#[derive(Debug, Clone, Serialize)]
pub struct Placeholder {
    pub kind: PlaceholderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cx: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cy: Option<i64>,
}

/// Kind of a top-level shape in a layout's shape tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Placeholder,
    TextBox,
    AutoShape,
    Picture,
    Other,
}

/// One top-level shape with the byte spans the cleaner needs to rewrite
/// the source XML in place.
#[derive(Debug, Clone)]
pub struct ShapeInfo {
    pub name: String,
    pub kind: ShapeKind,
    pub placeholder: Option<Placeholder>,
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub cx: Option<i64>,
    pub cy: Option<i64>,
    /// Byte range of the whole shape element in the layout XML.
    pub(crate) span: Range<usize>,
    /// Byte range of the first `a:off` element, if any.
    pub(crate) off_span: Option<Range<usize>>,
    /// Byte range of the first `a:ext` element, if any.
    pub(crate) ext_span: Option<Range<usize>>,
}

/// Layout category used for slide-type matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCategory {
    Title,
    Content,
    Section,
    Agenda,
    Closing,
    TwoColumn,
    ThreeColumn,
    Code,
    Quote,
    Photo,
    Blank,
    TitleOnly,
    Unknown,
}

impl LayoutCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Content => "content",
            Self::Section => "section",
            Self::Agenda => "agenda",
            Self::Closing => "closing",
            Self::TwoColumn => "two_column",
            Self::ThreeColumn => "three_column",
            Self::Code => "code",
            Self::Quote => "quote",
            Self::Photo => "photo",
            Self::Blank => "blank",
            Self::TitleOnly => "title_only",
            Self::Unknown => "unknown",
        }
    }
}

/// Analysis of one slide layout.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutInfo {
    pub index: usize,
    pub name: String,
    pub category: LayoutCategory,
    pub has_title: bool,
    pub has_subtitle: bool,
    pub has_body: bool,
    pub has_content: bool,
    pub has_picture: bool,
    pub body_count: usize,
    pub placeholders: Vec<Placeholder>,
    #[serde(skip)]
    pub(crate) shapes: Vec<ShapeInfo>,
}

impl LayoutInfo {
    /// The title placeholder, if the layout declares one.
    pub fn title_placeholder(&self) -> Option<&Placeholder> {
        self.placeholders.iter().find(|ph| ph.kind.is_title())
    }
}

struct ShapeBuilder {
    kind: ShapeKind,
    name: String,
    placeholder_kind: Option<PlaceholderKind>,
    placeholder_idx: Option<u32>,
    x: Option<i64>,
    y: Option<i64>,
    cx: Option<i64>,
    cy: Option<i64>,
    start: usize,
    off_span: Option<Range<usize>>,
    ext_span: Option<Range<usize>>,
}

impl ShapeBuilder {
    fn new(kind: ShapeKind, start: usize) -> Self {
        Self {
            kind,
            name: String::new(),
            placeholder_kind: None,
            placeholder_idx: None,
            x: None,
            y: None,
            cx: None,
            cy: None,
            start,
            off_span: None,
            ext_span: None,
        }
    }

    fn build(self, end: usize) -> ShapeInfo {
        let placeholder = self.placeholder_kind.map(|kind| Placeholder {
            kind,
            idx: self.placeholder_idx,
            x: self.x,
            y: self.y,
            cx: self.cx,
            cy: self.cy,
        });
        let kind = if placeholder.is_some() {
            ShapeKind::Placeholder
        } else {
            self.kind
        };
        ShapeInfo {
            name: self.name,
            kind,
            placeholder,
            x: self.x,
            y: self.y,
            cx: self.cx,
            cy: self.cy,
            span: self.start..end,
            off_span: self.off_span,
            ext_span: self.ext_span,
        }
    }
}

fn get_attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

/// Parse one slide layout part into its analysis.
///
/// Top-level shapes of the `p:spTree` are recorded with their byte spans
/// so the cleaning pass can drop or move them without re-serializing the
/// whole document.
pub fn parse_layout(xml: &str, index: usize) -> Result<LayoutInfo> {
    let mut reader = Reader::from_str(xml);
    let mut name = format!("Layout_{index}");
    let mut shapes: Vec<ShapeInfo> = Vec::new();

    let mut in_sp_tree = false;
    let mut current: Option<ShapeBuilder> = None;
    let mut shape_depth = 0usize;

    loop {
        let event_start = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = e.name();
                let tag = tag.as_ref();
                if let Some(builder) = current.as_mut() {
                    shape_depth += 1;
                    inspect_shape_child(builder, tag, e, event_start, None);
                } else {
                    match tag {
                        b"p:cSld" => {
                            if let Some(value) = get_attr(e, b"name")
                                && !value.is_empty()
                            {
                                name = value;
                            }
                        },
                        b"p:spTree" => in_sp_tree = true,
                        b"p:sp" | b"p:pic" | b"p:graphicFrame" | b"p:cxnSp" if in_sp_tree => {
                            let kind = match tag {
                                b"p:sp" => ShapeKind::AutoShape,
                                b"p:pic" => ShapeKind::Picture,
                                _ => ShapeKind::Other,
                            };
                            current = Some(ShapeBuilder::new(kind, event_start));
                            shape_depth = 1;
                        },
                        _ => {},
                    }
                }
            },
            Ok(Event::Empty(ref e)) => {
                if let Some(builder) = current.as_mut() {
                    let tag = e.name();
                    let end = reader.buffer_position() as usize;
                    inspect_shape_child(builder, tag.as_ref(), e, event_start, Some(end));
                }
            },
            Ok(Event::End(ref e)) => {
                if current.is_some() {
                    shape_depth -= 1;
                    if shape_depth == 0 {
                        let end = reader.buffer_position() as usize;
                        if let Some(builder) = current.take() {
                            shapes.push(builder.build(end));
                        }
                    }
                } else if e.name().as_ref() == b"p:spTree" {
                    in_sp_tree = false;
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {},
        }
    }

    let placeholders: Vec<Placeholder> = shapes
        .iter()
        .filter_map(|shape| shape.placeholder.clone())
        .collect();

    let has_title = placeholders.iter().any(|ph| ph.kind.is_title());
    let has_subtitle = placeholders
        .iter()
        .any(|ph| ph.kind == PlaceholderKind::Subtitle);
    let body_count = placeholders
        .iter()
        .filter(|ph| ph.kind == PlaceholderKind::Body)
        .count();
    let has_body = body_count > 0;
    let has_content = placeholders
        .iter()
        .any(|ph| ph.kind == PlaceholderKind::Object);
    let has_picture = placeholders
        .iter()
        .any(|ph| ph.kind == PlaceholderKind::Picture);

    let category = categorize(&name, has_title, has_subtitle, has_body, has_content);

    Ok(LayoutInfo {
        index,
        name,
        category,
        has_title,
        has_subtitle,
        has_body,
        has_content,
        has_picture,
        body_count,
        placeholders,
        shapes,
    })
}

fn inspect_shape_child(
    builder: &mut ShapeBuilder,
    tag: &[u8],
    e: &BytesStart<'_>,
    start: usize,
    end: Option<usize>,
) {
    match tag {
        b"p:cNvPr" => {
            if let Some(value) = get_attr(e, b"name") {
                builder.name = value;
            }
        },
        b"p:cNvSpPr" => {
            if get_attr(e, b"txBox").as_deref() == Some("1") {
                builder.kind = ShapeKind::TextBox;
            }
        },
        b"p:ph" => {
            builder.placeholder_kind =
                Some(PlaceholderKind::from_attr(get_attr(e, b"type").as_deref()));
            builder.placeholder_idx = get_attr(e, b"idx").and_then(|v| v.parse().ok());
        },
        b"a:off" if builder.x.is_none() => {
            builder.x = get_attr(e, b"x").and_then(|v| v.parse().ok());
            builder.y = get_attr(e, b"y").and_then(|v| v.parse().ok());
            if let Some(end) = end {
                builder.off_span = Some(start..end);
            }
        },
        b"a:ext" if builder.cx.is_none() => {
            builder.cx = get_attr(e, b"cx").and_then(|v| v.parse().ok());
            builder.cy = get_attr(e, b"cy").and_then(|v| v.parse().ok());
            if let Some(end) = end {
                builder.ext_span = Some(start..end);
            }
        },
        _ => {},
    }
}

/// Categorize a layout by name keywords, then by placeholder shape.
///
/// Order matters: more specific name patterns win over general ones, and
/// only unnamed layouts fall through to the placeholder-flag rules.
pub fn categorize(
    name: &str,
    has_title: bool,
    has_subtitle: bool,
    has_body: bool,
    has_content: bool,
) -> LayoutCategory {
    let name_lower = name.to_lowercase();

    if name_lower.contains("closing") {
        LayoutCategory::Closing
    } else if name_lower.contains("title slide")
        || name_lower.contains("タイトル スライド")
        || name_lower.contains("タイトルスライド")
    {
        LayoutCategory::Title
    } else if name_lower.contains("section")
        || name_lower.contains("セクション")
        || name_lower.contains("divider")
    {
        LayoutCategory::Section
    } else if name_lower.contains("agenda") || name_lower.contains("アジェンダ") {
        LayoutCategory::Agenda
    } else if name_lower.contains("title and content") || name_lower.contains("タイトルとコンテンツ")
    {
        LayoutCategory::Content
    } else if name_lower.contains("two column")
        || name_lower.contains("2列")
        || name_lower.contains("2 column")
    {
        LayoutCategory::TwoColumn
    } else if name_lower.contains("three column")
        || name_lower.contains("3列")
        || name_lower.contains("3 column")
    {
        LayoutCategory::ThreeColumn
    } else if name_lower.contains("code") || name_lower.contains("developer") {
        LayoutCategory::Code
    } else if name_lower.contains("quote") {
        LayoutCategory::Quote
    } else if name_lower.contains("photo")
        || name_lower.contains("picture")
        || name_lower.contains("image")
        || name_lower.contains("50/50")
    {
        LayoutCategory::Photo
    } else if name_lower.contains("blank") || name_lower.contains("白紙") {
        LayoutCategory::Blank
    } else if name_lower.contains("title only") {
        LayoutCategory::TitleOnly
    } else if has_title && (has_body || has_content) {
        LayoutCategory::Content
    } else if has_title && has_subtitle && !has_body {
        LayoutCategory::Title
    } else {
        LayoutCategory::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT_XML: &str = r#"<?xml version="1.0"?>
<p:sldLayout xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
  <p:cSld name="Title and Content">
    <p:spTree>
      <p:sp>
        <p:nvSpPr>
          <p:cNvPr id="2" name="Title 1"/>
          <p:nvPr><p:ph type="title"/></p:nvPr>
        </p:nvSpPr>
        <p:spPr>
          <a:xfrm><a:off x="838200" y="365125"/><a:ext cx="10515600" cy="1325563"/></a:xfrm>
        </p:spPr>
      </p:sp>
      <p:sp>
        <p:nvSpPr>
          <p:cNvPr id="3" name="Content Placeholder 2"/>
          <p:nvPr><p:ph idx="1"/></p:nvPr>
        </p:nvSpPr>
        <p:spPr/>
      </p:sp>
      <p:sp>
        <p:nvSpPr>
          <p:cNvPr id="4" name="Decoration"/>
          <p:cNvSpPr/>
          <p:nvPr/>
        </p:nvSpPr>
        <p:spPr>
          <a:xfrm><a:off x="0" y="0"/><a:ext cx="457200" cy="6858000"/></a:xfrm>
        </p:spPr>
      </p:sp>
    </p:spTree>
  </p:cSld>
</p:sldLayout>"#;

    #[test]
    fn test_parse_layout_placeholders_and_name() {
        let info = parse_layout(LAYOUT_XML, 1).unwrap();
        assert_eq!(info.name, "Title and Content");
        assert_eq!(info.category, LayoutCategory::Content);
        assert!(info.has_title);
        assert!(info.has_content);
        assert_eq!(info.placeholders.len(), 2);
        assert_eq!(info.shapes.len(), 3);

        let title = info.title_placeholder().unwrap();
        assert_eq!(title.x, Some(838_200));
        assert_eq!(title.cx, Some(10_515_600));
    }

    #[test]
    fn test_shape_spans_cover_elements() {
        let info = parse_layout(LAYOUT_XML, 0).unwrap();
        for shape in &info.shapes {
            let slice = &LAYOUT_XML[shape.span.clone()];
            assert!(slice.trim_start().starts_with("<p:sp"));
            assert!(slice.trim_end().ends_with("</p:sp>"));
        }
        let decoration = &info.shapes[2];
        assert_eq!(decoration.kind, ShapeKind::AutoShape);
        let off = decoration.off_span.clone().unwrap();
        assert!(LAYOUT_XML[off].contains("a:off"));
    }

    #[test]
    fn test_categorize_name_priority() {
        assert_eq!(
            categorize("Closing Title Slide", true, true, false, false),
            LayoutCategory::Closing
        );
        assert_eq!(
            categorize("タイトル スライド", false, false, false, false),
            LayoutCategory::Title
        );
        assert_eq!(
            categorize("Section Divider", false, false, false, false),
            LayoutCategory::Section
        );
        assert_eq!(
            categorize("2 Column with Image", false, false, false, false),
            LayoutCategory::TwoColumn
        );
    }

    #[test]
    fn test_categorize_flag_fallbacks() {
        assert_eq!(
            categorize("Custom 7", true, false, true, false),
            LayoutCategory::Content
        );
        assert_eq!(
            categorize("Custom 8", true, true, false, false),
            LayoutCategory::Title
        );
        assert_eq!(
            categorize("Custom 9", false, false, false, false),
            LayoutCategory::Unknown
        );
    }
}
