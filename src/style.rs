//! Word and paragraph styles
//!
//! [`WordStyle`] is the per-word font selection (bold/italic/underline
//! bitmask). [`BlockStyle`] carries the paragraph-level alignment, spacing and
//! indent that the layout engine and page assembler consume.

use core::ops::BitOr;

use crate::css::{CssStyle, FontStyle, FontWeight, TextAlign, TextDecoration};

/// Font style of a single word
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
pub struct WordStyle(u8);

impl WordStyle {
    /// No bold, italic or underline
    pub const REGULAR: WordStyle = WordStyle(0);
    /// Bold
    pub const BOLD: WordStyle = WordStyle(1);
    /// Italic
    pub const ITALIC: WordStyle = WordStyle(2);
    /// Underline
    pub const UNDERLINE: WordStyle = WordStyle(4);

    /// Raw bit representation
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Check if style is bold
    pub fn is_bold(self) -> bool {
        self.0 & Self::BOLD.0 != 0
    }

    /// Check if style is italic
    pub fn is_italic(self) -> bool {
        self.0 & Self::ITALIC.0 != 0
    }

    /// Check if style is underlined
    pub fn is_underline(self) -> bool {
        self.0 & Self::UNDERLINE.0 != 0
    }

    /// Apply bold flag to current style
    pub fn with_bold(self, bold: bool) -> Self {
        self.with_bit(Self::BOLD, bold)
    }

    /// Apply italic flag to current style
    pub fn with_italic(self, italic: bool) -> Self {
        self.with_bit(Self::ITALIC, italic)
    }

    /// Apply underline flag to current style
    pub fn with_underline(self, underline: bool) -> Self {
        self.with_bit(Self::UNDERLINE, underline)
    }

    fn with_bit(self, bit: WordStyle, on: bool) -> Self {
        if on {
            WordStyle(self.0 | bit.0)
        } else {
            WordStyle(self.0 & !bit.0)
        }
    }
}

impl BitOr for WordStyle {
    type Output = WordStyle;

    fn bitor(self, rhs: WordStyle) -> WordStyle {
        WordStyle(self.0 | rhs.0)
    }
}

/// One open element's contribution to the effective word style.
///
/// `None` leaves the axis to the enclosing frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct StyleFrame {
    /// Element depth at which the frame was pushed
    pub depth: usize,
    /// Bold override
    pub bold: Option<bool>,
    /// Italic override
    pub italic: Option<bool>,
    /// Underline override
    pub underline: Option<bool>,
}

impl StyleFrame {
    /// Frame at `depth` with the inline axes taken from `css`.
    pub fn from_css(depth: usize, css: &CssStyle) -> Self {
        Self {
            depth,
            bold: css.font_weight.map(|w| w == FontWeight::Bold),
            italic: css.font_style.map(|s| s == FontStyle::Italic),
            underline: css
                .text_decoration
                .map(|d| d == TextDecoration::Underline),
        }
    }

    /// Whether the frame sets any axis.
    pub fn is_empty(&self) -> bool {
        self.bold.is_none() && self.italic.is_none() && self.underline.is_none()
    }

    /// Apply this frame's overrides on top of `style`.
    pub fn apply(&self, mut style: WordStyle) -> WordStyle {
        if let Some(bold) = self.bold {
            style = style.with_bold(bold);
        }
        if let Some(italic) = self.italic {
            style = style.with_italic(italic);
        }
        if let Some(underline) = self.underline {
            style = style.with_underline(underline);
        }
        style
    }
}

/// Paragraph-level style
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BlockStyle {
    /// Horizontal alignment
    pub alignment: TextAlign,
    /// Whether `alignment` was set explicitly (CSS or a heading rule)
    pub text_align_defined: bool,
    /// Top margin in pixels
    pub margin_top: i32,
    /// Bottom margin in pixels
    pub margin_bottom: i32,
    /// Left margin in pixels
    pub margin_left: i32,
    /// Right margin in pixels
    pub margin_right: i32,
    /// Top padding in pixels
    pub padding_top: i32,
    /// Bottom padding in pixels
    pub padding_bottom: i32,
    /// Left padding in pixels
    pub padding_left: i32,
    /// Right padding in pixels
    pub padding_right: i32,
    /// Prefix the first word with two em spaces
    pub first_line_indent: bool,
}

impl BlockStyle {
    /// Style with only an alignment.
    pub fn aligned(alignment: TextAlign) -> Self {
        Self {
            alignment,
            ..Default::default()
        }
    }

    /// Resolve a block style from CSS.
    ///
    /// `em_px` is the em size used for `em` lengths; percentages resolve
    /// against `viewport_width`. `default_align` applies when CSS leaves
    /// `text-align` unset.
    pub fn from_css(
        css: &CssStyle,
        em_px: f32,
        default_align: TextAlign,
        viewport_width: i32,
    ) -> Self {
        let px = |len: Option<crate::css::Length>| {
            len.map(|l| l.to_px(em_px, viewport_width)).unwrap_or(0)
        };
        Self {
            alignment: css.text_align.unwrap_or(default_align),
            text_align_defined: css.text_align.is_some(),
            margin_top: px(css.margin.top),
            margin_bottom: px(css.margin.bottom),
            margin_left: px(css.margin.left),
            margin_right: px(css.margin.right),
            padding_top: px(css.padding.top),
            padding_bottom: px(css.padding.bottom),
            padding_left: px(css.padding.left),
            padding_right: px(css.padding.right),
            first_line_indent: false,
        }
    }

    /// Merge a child block style into this (parent) style.
    ///
    /// Spacing is summed. Alignment and the indent flag come from the child
    /// when it defines its alignment, otherwise from the parent.
    pub fn combined_with(&self, child: &BlockStyle) -> BlockStyle {
        let (alignment, text_align_defined, first_line_indent) = if child.text_align_defined {
            (child.alignment, true, child.first_line_indent)
        } else {
            (
                self.alignment,
                self.text_align_defined,
                self.first_line_indent,
            )
        };
        BlockStyle {
            alignment,
            text_align_defined,
            margin_top: self.margin_top + child.margin_top,
            margin_bottom: self.margin_bottom + child.margin_bottom,
            margin_left: self.margin_left + child.margin_left,
            margin_right: self.margin_right + child.margin_right,
            padding_top: self.padding_top + child.padding_top,
            padding_bottom: self.padding_bottom + child.padding_bottom,
            padding_left: self.padding_left + child.padding_left,
            padding_right: self.padding_right + child.padding_right,
            first_line_indent,
        }
    }

    /// Horizontal offset of the content box.
    pub fn left_inset(&self) -> i32 {
        self.margin_left + self.padding_left
    }

    /// Total horizontal space taken by margins and paddings.
    pub fn horizontal_inset(&self) -> i32 {
        self.left_inset() + self.margin_right + self.padding_right
    }

    /// Vertical space before the first line.
    pub fn top_spacing(&self) -> i32 {
        self.margin_top + self.padding_top
    }

    /// Vertical space after the last line.
    pub fn bottom_spacing(&self) -> i32 {
        self.margin_bottom + self.padding_bottom
    }

    /// Whether the first-line indent applies under this alignment.
    pub fn wants_indent(&self) -> bool {
        self.first_line_indent && matches!(self.alignment, TextAlign::Left | TextAlign::Justify)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::parse_inline_style;

    #[test]
    fn test_word_style_flags() {
        let s = WordStyle::REGULAR.with_bold(true).with_italic(true);
        assert!(s.is_bold());
        assert!(s.is_italic());
        assert!(!s.is_underline());
        assert_eq!(s, WordStyle::BOLD | WordStyle::ITALIC);
        assert_eq!(s.with_bold(false), WordStyle::ITALIC);
        assert_eq!(WordStyle::default(), WordStyle::REGULAR);
    }

    #[test]
    fn test_frame_apply_only_set_axes() {
        let frame = StyleFrame {
            depth: 3,
            bold: Some(false),
            italic: None,
            underline: Some(true),
        };
        let base = WordStyle::BOLD | WordStyle::ITALIC;
        assert_eq!(frame.apply(base), WordStyle::ITALIC | WordStyle::UNDERLINE);
        assert!(!frame.is_empty());
        assert!(StyleFrame::default().is_empty());
    }

    #[test]
    fn test_frame_from_css() {
        let css = parse_inline_style("font-weight: bold; text-decoration: none").unwrap();
        let frame = StyleFrame::from_css(2, &css);
        assert_eq!(frame.bold, Some(true));
        assert_eq!(frame.italic, None);
        assert_eq!(frame.underline, Some(false));
    }

    #[test]
    fn test_block_from_css_resolves_lengths() {
        let css = parse_inline_style("margin: 1em 10%; padding-left: 4px").unwrap();
        let block = BlockStyle::from_css(&css, 20.0, TextAlign::Justify, 400);
        assert_eq!(block.alignment, TextAlign::Justify);
        assert!(!block.text_align_defined);
        assert_eq!(block.margin_top, 20);
        assert_eq!(block.margin_left, 40);
        assert_eq!(block.left_inset(), 44);
        assert_eq!(block.horizontal_inset(), 84);
    }

    #[test]
    fn test_combined_with_child_alignment_wins() {
        let mut parent = BlockStyle::aligned(TextAlign::Justify);
        parent.margin_top = 5;
        parent.first_line_indent = true;
        let mut child = BlockStyle::aligned(TextAlign::Center);
        child.text_align_defined = true;
        child.margin_top = 7;

        let merged = parent.combined_with(&child);
        assert_eq!(merged.alignment, TextAlign::Center);
        assert!(!merged.first_line_indent);
        assert_eq!(merged.margin_top, 12);
    }

    #[test]
    fn test_combined_with_undefined_child_keeps_parent() {
        let mut parent = BlockStyle::aligned(TextAlign::Right);
        parent.text_align_defined = true;
        let child = BlockStyle::aligned(TextAlign::Left);
        let merged = parent.combined_with(&child);
        assert_eq!(merged.alignment, TextAlign::Right);
        assert!(merged.text_align_defined);
    }

    #[test]
    fn test_wants_indent() {
        let mut style = BlockStyle::aligned(TextAlign::Left);
        assert!(!style.wants_indent());
        style.first_line_indent = true;
        assert!(style.wants_indent());
        style.alignment = TextAlign::Center;
        assert!(!style.wants_indent());
    }
}
