//! CSS subset parser and style resolution
//!
//! Parses the subset of CSS that influences pagination:
//! - Inline styling: `font-weight`, `font-style`, `text-decoration`
//! - Block styling: `text-align`, `margin*`, `padding*`
//! - Selectors: tag, class, `tag.class`, and comma-separated lists of those
//!
//! Descendant/child combinators, pseudo-classes, ids, attribute selectors and
//! `@` rules are skipped rather than rejected; chapters routinely ship
//! stylesheets full of them.

extern crate alloc;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::TypesetError;

/// Maximum number of classes considered per element.
pub const MAX_CLASSES: usize = 8;

/// Font weight
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum FontWeight {
    /// Normal weight (400)
    #[default]
    Normal,
    /// Bold weight (700)
    Bold,
}

/// Font style
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum FontStyle {
    /// Upright text
    #[default]
    Normal,
    /// Italic text
    Italic,
}

/// Text decoration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum TextDecoration {
    /// No decoration
    #[default]
    None,
    /// Underlined text
    Underline,
}

/// Text alignment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum TextAlign {
    /// Justified
    #[default]
    Justify,
    /// Left-aligned
    Left,
    /// Centered
    Center,
    /// Right-aligned
    Right,
}

/// A CSS length
#[derive(Clone, Copy, Debug, PartialEq)]
#[non_exhaustive]
pub enum Length {
    /// Absolute pixels
    Px(f32),
    /// Multiple of the em size
    Em(f32),
    /// Percentage of the viewport width
    Percent(f32),
}

impl Length {
    /// Resolve to pixels.
    pub fn to_px(self, em_px: f32, viewport_width: i32) -> i32 {
        let px = match self {
            Length::Px(v) => v,
            Length::Em(v) => v * em_px,
            Length::Percent(v) => v * viewport_width as f32 / 100.0,
        };
        round_px(px)
    }
}

/// Per-edge lengths for margin and padding
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Edges {
    /// Top edge
    pub top: Option<Length>,
    /// Right edge
    pub right: Option<Length>,
    /// Bottom edge
    pub bottom: Option<Length>,
    /// Left edge
    pub left: Option<Length>,
}

impl Edges {
    fn is_empty(&self) -> bool {
        self.top.is_none() && self.right.is_none() && self.bottom.is_none() && self.left.is_none()
    }

    fn merge(&mut self, other: &Edges) {
        if other.top.is_some() {
            self.top = other.top;
        }
        if other.right.is_some() {
            self.right = other.right;
        }
        if other.bottom.is_some() {
            self.bottom = other.bottom;
        }
        if other.left.is_some() {
            self.left = other.left;
        }
    }
}

/// A set of CSS property values
///
/// All fields are optional; `None` means "not specified", which is distinct
/// from an explicit `normal`/`none`. Style merging depends on that
/// distinction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CssStyle {
    /// Font weight (normal or bold)
    pub font_weight: Option<FontWeight>,
    /// Font style (normal or italic)
    pub font_style: Option<FontStyle>,
    /// Text decoration (none or underline)
    pub text_decoration: Option<TextDecoration>,
    /// Text alignment
    pub text_align: Option<TextAlign>,
    /// Margins
    pub margin: Edges,
    /// Paddings
    pub padding: Edges,
}

impl CssStyle {
    /// Create an empty style (all properties unset)
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if any property is set
    pub fn is_empty(&self) -> bool {
        self.font_weight.is_none()
            && self.font_style.is_none()
            && self.text_decoration.is_none()
            && self.text_align.is_none()
            && self.margin.is_empty()
            && self.padding.is_empty()
    }

    /// Whether any inline (weight/style/decoration) property is set
    pub fn has_inline_styling(&self) -> bool {
        self.font_weight.is_some() || self.font_style.is_some() || self.text_decoration.is_some()
    }

    /// Merge another style into this one (other's values take precedence)
    pub fn merge(&mut self, other: &CssStyle) {
        if other.font_weight.is_some() {
            self.font_weight = other.font_weight;
        }
        if other.font_style.is_some() {
            self.font_style = other.font_style;
        }
        if other.text_decoration.is_some() {
            self.text_decoration = other.text_decoration;
        }
        if other.text_align.is_some() {
            self.text_align = other.text_align;
        }
        self.margin.merge(&other.margin);
        self.padding.merge(&other.padding);
    }
}

/// Resolves markup elements to CSS property values.
///
/// `class_attr` is the raw `class` attribute (possibly empty) and
/// `style_attr` the raw inline `style` attribute.
pub trait StyleResolver {
    /// Resolve the style of one element.
    fn resolve_element(&self, tag: &str, class_attr: &str, style_attr: Option<&str>) -> CssStyle;
}

/// A CSS selector (subset)
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum CssSelector {
    /// Tag selector (e.g., `p`, `h1`)
    Tag(String),
    /// Class selector (e.g., `.chapter-title`)
    Class(String),
    /// Tag + class selector (e.g., `p.intro`)
    TagClass(String, String),
}

impl CssSelector {
    /// Check if this selector matches a given tag name and class list
    pub fn matches(&self, tag: &str, classes: &[&str]) -> bool {
        match self {
            CssSelector::Tag(t) => t.eq_ignore_ascii_case(tag),
            CssSelector::Class(c) => classes.contains(&c.as_str()),
            CssSelector::TagClass(t, c) => {
                t.eq_ignore_ascii_case(tag) && classes.contains(&c.as_str())
            }
        }
    }
}

/// A single CSS rule (selector + declarations)
#[derive(Clone, Debug, PartialEq)]
pub struct CssRule {
    /// The selector for this rule
    pub selector: CssSelector,
    /// The style declarations
    pub style: CssStyle,
}

/// A parsed CSS stylesheet
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stylesheet {
    /// All rules in document order
    pub rules: Vec<CssRule>,
}

impl Stylesheet {
    /// Create an empty stylesheet
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the computed style for an element given its tag and classes
    ///
    /// Applies matching rules in document order (later rules override).
    pub fn resolve(&self, tag: &str, classes: &[&str]) -> CssStyle {
        let mut style = CssStyle::new();
        for rule in &self.rules {
            if rule.selector.matches(tag, classes) {
                style.merge(&rule.style);
            }
        }
        style
    }

    /// Append all rules of another stylesheet (later rules win).
    pub fn extend(&mut self, other: Stylesheet) {
        self.rules.extend(other.rules);
    }

    /// Get the number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the stylesheet is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl StyleResolver for Stylesheet {
    fn resolve_element(&self, tag: &str, class_attr: &str, style_attr: Option<&str>) -> CssStyle {
        let mut classes: heapless::Vec<&str, MAX_CLASSES> = heapless::Vec::new();
        for class in class_attr.split_ascii_whitespace() {
            if classes.push(class).is_err() {
                break;
            }
        }

        let mut style = self.resolve(tag, &classes);
        if let Some(inline) = style_attr {
            // Inline declarations never fail; malformed ones are skipped.
            if let Ok(inline_style) = parse_inline_style(inline) {
                style.merge(&inline_style);
            }
        }
        style
    }
}

/// Parse a CSS stylesheet string into a `Stylesheet`
pub fn parse_stylesheet(css: &str) -> Result<Stylesheet, TypesetError> {
    let mut stylesheet = Stylesheet::new();
    let mut pos = 0;
    let bytes = css.as_bytes();

    while pos < bytes.len() {
        pos = skip_whitespace_and_comments(css, pos);
        if pos >= bytes.len() {
            break;
        }

        // Statement at-rules (`@charset`, `@import`, `@namespace`) end at `;`.
        if bytes[pos] == b'@' {
            let semi = css[pos..].find(';').map(|i| pos + i);
            let brace = css[pos..].find('{').map(|i| pos + i);
            if let Some(semi) = semi {
                if brace.map_or(true, |brace| semi < brace) {
                    log::debug!("skipping at-rule '{}'", css[pos..semi].trim());
                    pos = semi + 1;
                    continue;
                }
            }
        }

        let brace_start = match css[pos..].find('{') {
            Some(i) => pos + i,
            None => break,
        };
        let prelude = css[pos..brace_start].trim();

        if prelude.starts_with('@') {
            pos = skip_block(css, brace_start)?;
            continue;
        }

        let brace_end = match css[brace_start + 1..].find('}') {
            Some(i) => brace_start + 1 + i,
            None => return Err(TypesetError::Css("Unclosed CSS rule block".into())),
        };

        let style = parse_declarations(&css[brace_start + 1..brace_end]);
        pos = brace_end + 1;

        if prelude.is_empty() {
            continue;
        }
        if style.is_empty() {
            continue;
        }

        for part in prelude.split(',') {
            match parse_selector(part)? {
                Some(selector) => stylesheet.rules.push(CssRule {
                    selector,
                    style: style.clone(),
                }),
                None => log::debug!("skipping unsupported selector '{}'", part.trim()),
            }
        }
    }

    Ok(stylesheet)
}

/// Parse an inline `style` attribute value into a `CssStyle`
///
/// Example: `"font-weight: bold; margin-top: 10px"`
pub fn parse_inline_style(style_attr: &str) -> Result<CssStyle, TypesetError> {
    Ok(parse_declarations(style_attr))
}

// -- Internal parsing helpers -------------------------------------------------

/// Skip whitespace and CSS comments (`/* ... */`)
fn skip_whitespace_and_comments(css: &str, mut pos: usize) -> usize {
    let bytes = css.as_bytes();
    while pos < bytes.len() {
        if bytes[pos].is_ascii_whitespace() {
            pos += 1;
        } else if pos + 1 < bytes.len() && bytes[pos] == b'/' && bytes[pos + 1] == b'*' {
            match css[pos + 2..].find("*/") {
                Some(end) => pos = pos + 2 + end + 2,
                None => return bytes.len(),
            }
        } else {
            break;
        }
    }
    pos
}

/// Skip a brace block starting at `open`, honouring nesting. Returns the
/// position after the matching `}`.
fn skip_block(css: &str, open: usize) -> Result<usize, TypesetError> {
    let mut depth = 0usize;
    for (i, b) in css.as_bytes()[open..].iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(open + i + 1);
                }
            }
            _ => {}
        }
    }
    Err(TypesetError::Css("Unclosed CSS at-rule block".into()))
}

/// Parse a single selector. `Ok(None)` means valid but unsupported.
fn parse_selector(s: &str) -> Result<Option<CssSelector>, TypesetError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    if s.contains(|c: char| {
        c.is_ascii_whitespace() || matches!(c, '>' | '+' | '~' | ':' | '[' | '#' | '*')
    }) {
        return Ok(None);
    }

    if let Some(class) = s.strip_prefix('.') {
        if class.is_empty() {
            return Err(TypesetError::Css("Empty class selector".into()));
        }
        if class.contains('.') {
            return Ok(None);
        }
        Ok(Some(CssSelector::Class(class.into())))
    } else if let Some(dot_pos) = s.find('.') {
        let tag = &s[..dot_pos];
        let class = &s[dot_pos + 1..];
        if class.is_empty() {
            return Err(TypesetError::Css(format!("Invalid selector: {}", s)));
        }
        if class.contains('.') {
            return Ok(None);
        }
        Ok(Some(CssSelector::TagClass(tag.into(), class.into())))
    } else {
        Ok(Some(CssSelector::Tag(s.into())))
    }
}

/// Parse CSS declarations (the part inside `{ ... }`)
fn parse_declarations(declarations: &str) -> CssStyle {
    let mut style = CssStyle::new();

    for decl in declarations.split(';') {
        let decl = decl.trim();
        if decl.is_empty() {
            continue;
        }

        let colon_pos = match decl.find(':') {
            Some(pos) => pos,
            None => continue,
        };

        let property = decl[..colon_pos].trim().to_ascii_lowercase();
        let value = decl[colon_pos + 1..]
            .trim()
            .trim_end_matches("!important")
            .trim()
            .to_ascii_lowercase();

        match property.as_str() {
            "font-weight" => {
                style.font_weight = match value.as_str() {
                    "bold" | "bolder" | "600" | "700" | "800" | "900" => Some(FontWeight::Bold),
                    "normal" | "lighter" | "100" | "200" | "300" | "400" | "500" => {
                        Some(FontWeight::Normal)
                    }
                    _ => None,
                };
            }
            "font-style" => {
                style.font_style = match value.as_str() {
                    "italic" | "oblique" => Some(FontStyle::Italic),
                    "normal" => Some(FontStyle::Normal),
                    _ => None,
                };
            }
            "text-decoration" | "text-decoration-line" => {
                style.text_decoration = if value.split_ascii_whitespace().any(|v| v == "underline")
                {
                    Some(TextDecoration::Underline)
                } else if value == "none" {
                    Some(TextDecoration::None)
                } else {
                    None
                };
            }
            "text-align" => {
                style.text_align = match value.as_str() {
                    "left" | "start" => Some(TextAlign::Left),
                    "center" => Some(TextAlign::Center),
                    "right" | "end" => Some(TextAlign::Right),
                    "justify" => Some(TextAlign::Justify),
                    _ => None,
                };
            }
            "margin" => apply_edge_shorthand(&mut style.margin, &value),
            "margin-top" => style.margin.top = parse_length(&value),
            "margin-right" => style.margin.right = parse_length(&value),
            "margin-bottom" => style.margin.bottom = parse_length(&value),
            "margin-left" => style.margin.left = parse_length(&value),
            "padding" => apply_edge_shorthand(&mut style.padding, &value),
            "padding-top" => style.padding.top = parse_length(&value),
            "padding-right" => style.padding.right = parse_length(&value),
            "padding-bottom" => style.padding.bottom = parse_length(&value),
            "padding-left" => style.padding.left = parse_length(&value),
            _ => {
                // Unsupported property
            }
        }
    }

    style
}

/// Apply a 1–4 value `margin`/`padding` shorthand.
fn apply_edge_shorthand(edges: &mut Edges, value: &str) {
    let mut parts: heapless::Vec<Option<Length>, 4> = heapless::Vec::new();
    for part in value.split_ascii_whitespace() {
        if parts.push(parse_length(part)).is_err() {
            return;
        }
    }
    let (top, right, bottom, left) = match parts.as_slice() {
        [all] => (*all, *all, *all, *all),
        [vertical, horizontal] => (*vertical, *horizontal, *vertical, *horizontal),
        [top, horizontal, bottom] => (*top, *horizontal, *bottom, *horizontal),
        [top, right, bottom, left] => (*top, *right, *bottom, *left),
        _ => return,
    };
    edges.top = top;
    edges.right = right;
    edges.bottom = bottom;
    edges.left = left;
}

/// Parse a length (`px`, `em`, `rem`, `%`, or a bare number taken as px)
fn parse_length(value: &str) -> Option<Length> {
    let value = value.trim();
    if value == "auto" {
        return None;
    }
    if let Some(px) = value.strip_suffix("px") {
        px.trim().parse::<f32>().ok().map(Length::Px)
    } else if let Some(rem) = value.strip_suffix("rem") {
        rem.trim().parse::<f32>().ok().map(Length::Em)
    } else if let Some(em) = value.strip_suffix("em") {
        em.trim().parse::<f32>().ok().map(Length::Em)
    } else if let Some(pct) = value.strip_suffix('%') {
        pct.trim().parse::<f32>().ok().map(Length::Percent)
    } else {
        value.parse::<f32>().ok().map(Length::Px)
    }
}

/// Round to the nearest pixel without `std` float intrinsics.
pub(crate) fn round_px(v: f32) -> i32 {
    if v >= 0.0 {
        (v + 0.5) as i32
    } else {
        (v - 0.5) as i32
    }
}
