//! Paragraph layout engine
//!
//! Turns the words of a [`TextBlock`] into positioned [`Line`]s:
//! minimum-badness line breaking (dynamic programming over the paragraph,
//! right to left), CJK gap exemption, gap-based justification and the
//! first-line indent. Words are moved out of the block line by line, so a
//! block held back by `include_last_line = false` keeps only its tail.

extern crate alloc;

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::classify::{is_cjk_paragraph, is_cjk_split, is_cjk_word, is_invisible, EM_SPACE};
use crate::css::TextAlign;
use crate::style::{BlockStyle, WordStyle};
use crate::text_block::TextBlock;

/// Share of CJK words (percent) above which a paragraph counts as CJK.
pub const DEFAULT_CJK_PARAGRAPH_PERCENT: u8 = 60;

/// Two em spaces prefixed to the first word of an indented paragraph.
pub const INDENT_PREFIX: &str = "\u{2003}\u{2003}";

/// Font metrics for text measurement
///
/// Implementations must be deterministic for the duration of a layout pass.
pub trait FontMetrics {
    /// Advance width of `text` in pixels
    fn text_width(&self, text: &str, style: WordStyle) -> i32;
    /// Width of a single space in pixels
    fn space_width(&self, style: WordStyle) -> i32;
    /// Line advance in pixels
    fn line_height(&self) -> i32;
    /// Distance from the top of the line box to the baseline
    fn ascender(&self, style: WordStyle) -> i32;
}

impl<T: FontMetrics + ?Sized> FontMetrics for &T {
    fn text_width(&self, text: &str, style: WordStyle) -> i32 {
        (**self).text_width(text, style)
    }

    fn space_width(&self, style: WordStyle) -> i32 {
        (**self).space_width(style)
    }

    fn line_height(&self) -> i32 {
        (**self).line_height()
    }

    fn ascender(&self, style: WordStyle) -> i32 {
        (**self).ascender(style)
    }
}

/// Fixed-cell metrics
///
/// Every visible character takes one cell, CJK characters two, zero-width
/// formatting characters none.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonospaceMetrics {
    /// Cell width in pixels
    pub char_width: i32,
    /// Cell width for bold text
    pub bold_char_width: i32,
    /// Line advance in pixels
    pub line_height: i32,
    /// Baseline offset in pixels
    pub ascender: i32,
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        // FONT_10X20 with a 26px line
        Self {
            char_width: 10,
            bold_char_width: 10,
            line_height: 26,
            ascender: 16,
        }
    }
}

impl MonospaceMetrics {
    /// Metrics with equal regular and bold cells
    pub fn new(char_width: i32, line_height: i32) -> Self {
        Self {
            char_width,
            bold_char_width: char_width,
            line_height,
            ascender: line_height * 4 / 5,
        }
    }

    /// Set the bold cell width
    pub fn with_bold_char_width(mut self, width: i32) -> Self {
        self.bold_char_width = width;
        self
    }

    fn cell(&self, style: WordStyle) -> i32 {
        if style.is_bold() {
            self.bold_char_width
        } else {
            self.char_width
        }
    }
}

impl FontMetrics for MonospaceMetrics {
    fn text_width(&self, text: &str, style: WordStyle) -> i32 {
        let cell = self.cell(style);
        text.chars()
            .map(|ch| {
                if is_invisible(ch) {
                    0
                } else if is_cjk_split(ch) {
                    cell * 2
                } else {
                    cell
                }
            })
            .sum()
    }

    fn space_width(&self, style: WordStyle) -> i32 {
        self.cell(style)
    }

    fn line_height(&self) -> i32 {
        self.line_height
    }

    fn ascender(&self, _style: WordStyle) -> i32 {
        self.ascender
    }
}

/// A word placed on a line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PositionedWord {
    /// Word text
    pub text: String,
    /// Font style
    pub style: WordStyle,
    /// X offset from the start of the content box
    pub x: i32,
    /// No inter-word space precedes this word (CJK or continuation)
    pub attached: bool,
}

/// A single laid-out line of text
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    /// Words in reading order
    pub words: Vec<PositionedWord>,
    /// Style of the paragraph the line belongs to
    pub style: BlockStyle,
}

impl Line {
    /// Get the text content, with a space wherever the layout put a gap
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, word) in self.words.iter().enumerate() {
            if i > 0 && !word.attached {
                out.push(' ');
            }
            out.push_str(&word.text);
        }
        out
    }

    /// Check if line has no words
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Number of words on the line
    pub fn len(&self) -> usize {
        self.words.len()
    }
}

/// Minimum-badness line breaks.
///
/// `gaps[j]` is the base gap before word `j` (ignored for `j == 0`), and
/// `continues[j]` forbids a break between `j - 1` and `j`. Returns the
/// exclusive end index of every line. A word that fits nowhere gets its own
/// line and the rest of the paragraph still breaks optimally.
pub fn compute_line_breaks(
    width: i32,
    widths: &[i32],
    gaps: &[i32],
    continues: &[bool],
) -> Vec<usize> {
    let n = widths.len();
    if n == 0 {
        return Vec::new();
    }

    let width = i64::from(width);
    let mut dp = vec![0i64; n];
    // Index of the last word on the best line starting at i
    let mut ans = vec![0usize; n];
    ans[n - 1] = n - 1;

    for i in (0..n.saturating_sub(1)).rev() {
        let mut used = 0i64;
        let mut best: Option<(i64, usize)> = None;

        for j in i..n {
            if j > i {
                used += i64::from(gaps[j]);
            }
            used += i64::from(widths[j]);
            if used > width {
                break;
            }
            if j + 1 < n && continues[j + 1] {
                continue;
            }

            let cost = if j == n - 1 {
                0
            } else {
                let spare = width - used;
                spare.saturating_mul(spare).saturating_add(dp[j + 1])
            };
            if best.map_or(true, |(c, _)| cost < c) {
                best = Some((cost, j));
            }
        }

        match best {
            Some((cost, j)) => {
                dp[i] = cost;
                ans[i] = j;
            }
            None => {
                ans[i] = i;
                dp[i] = dp[i + 1];
            }
        }
    }

    let mut breaks = Vec::new();
    let mut current = 0;
    while current < n {
        let next = (ans[current] + 1).max(current + 1);
        breaks.push(next);
        current = next;
    }
    breaks
}

/// Paragraph layout over a font metrics provider
pub struct LayoutEngine<'a, M: FontMetrics + ?Sized> {
    metrics: &'a M,
    cjk_paragraph_percent: u8,
}

impl<'a, M: FontMetrics + ?Sized> LayoutEngine<'a, M> {
    /// Create a layout engine
    pub fn new(metrics: &'a M) -> Self {
        Self {
            metrics,
            cjk_paragraph_percent: DEFAULT_CJK_PARAGRAPH_PERCENT,
        }
    }

    /// Set the CJK paragraph threshold (percent of words)
    pub fn with_cjk_paragraph_percent(mut self, percent: u8) -> Self {
        self.cjk_paragraph_percent = percent;
        self
    }

    /// Lay out `block` at `width` pixels, handing each line to `on_line`.
    ///
    /// With `include_last_line = false` the final line's words stay in the
    /// block so they can be re-broken once more words arrive. Returns the
    /// number of lines emitted.
    pub fn layout_block<F>(
        &self,
        block: &mut TextBlock,
        width: i32,
        include_last_line: bool,
        mut on_line: F,
    ) -> usize
    where
        F: FnMut(Line),
    {
        if width <= 0 || block.is_empty() {
            return 0;
        }

        let style = *block.style();
        if style.wants_indent() && !block.indent_applied() {
            if let Some(first) = block.words_mut().front_mut() {
                first.text.insert_str(0, INDENT_PREFIX);
            }
            block.mark_indent_applied();
        }

        let space = self.metrics.space_width(WordStyle::REGULAR);
        let n = block.len();
        let mut widths = Vec::with_capacity(n);
        let mut cjk = Vec::with_capacity(n);
        let mut continues = Vec::with_capacity(n);
        for word in block.words() {
            widths.push(self.metrics.text_width(&word.text, word.style));
            cjk.push(is_cjk_word(&word.text));
            continues.push(word.continues);
        }
        let cjk_count = cjk.iter().filter(|c| **c).count();
        let cjk_paragraph = is_cjk_paragraph(cjk_count, n, self.cjk_paragraph_percent);

        let gaps: Vec<i32> = (0..n)
            .map(|j| {
                if j == 0 || continues[j] || cjk[j - 1] || cjk[j] {
                    0
                } else {
                    space
                }
            })
            .collect();

        let breaks = compute_line_breaks(width, &widths, &gaps, &continues);
        let line_count = if include_last_line {
            breaks.len()
        } else {
            breaks.len() - 1
        };

        let mut start = 0;
        for (index, &end) in breaks.iter().take(line_count).enumerate() {
            let is_last = index + 1 == breaks.len();
            let xs = self.position_line(
                &style,
                width,
                &widths[start..end],
                &gaps[start..end],
                &cjk[start..end],
                &continues[start..end],
                is_last,
                cjk_paragraph,
            );
            let words = block
                .take_front(end - start)
                .zip(xs)
                .enumerate()
                .map(|(k, (word, x))| PositionedWord {
                    attached: k > 0 && gaps[start + k] == 0,
                    text: word.text,
                    style: word.style,
                    x,
                })
                .collect();
            on_line(Line { words, style });
            start = end;
        }

        line_count
    }

    /// X positions for one line. `gaps[0]` is ignored.
    #[allow(clippy::too_many_arguments)]
    fn position_line(
        &self,
        style: &BlockStyle,
        width: i32,
        widths: &[i32],
        gaps: &[i32],
        cjk: &[bool],
        continues: &[bool],
        is_last: bool,
        cjk_paragraph: bool,
    ) -> Vec<i32> {
        let count = widths.len();
        let word_sum: i32 = widths.iter().sum();
        let gap_sum: i32 = gaps.iter().skip(1).sum();
        let spare = (width - (word_sum + gap_sum)).max(0);

        let stretch = !is_last && count >= 2;
        let adjustable = |k: usize| -> bool {
            if !stretch || continues[k] {
                return false;
            }
            match style.alignment {
                TextAlign::Justify => true,
                TextAlign::Left => cjk_paragraph && (cjk[k - 1] || cjk[k]),
                _ => false,
            }
        };
        let adjustable_count = (1..count).filter(|&k| adjustable(k)).count() as i32;
        let (per_gap, mut remainder) = if adjustable_count > 0 {
            (spare / adjustable_count, spare % adjustable_count)
        } else {
            (0, 0)
        };

        let mut x = match style.alignment {
            TextAlign::Right => spare,
            TextAlign::Center => spare / 2,
            _ => 0,
        };
        let mut xs = Vec::with_capacity(count);
        for k in 0..count {
            if k > 0 {
                let mut gap = gaps[k];
                if adjustable(k) {
                    gap += per_gap;
                    if remainder > 0 {
                        gap += 1;
                        remainder -= 1;
                    }
                }
                x += gap;
            }
            xs.push(x);
            x += widths[k];
        }
        xs
    }
}

/// Whether `text` begins with the paragraph indent.
pub fn has_indent(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next() == Some(EM_SPACE) && chars.next() == Some(EM_SPACE)
}
