//! Page assembly
//!
//! Stacks laid-out lines vertically and seals a [`Page`] whenever the next
//! line would cross the viewport height.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

use crate::layout::Line;
use crate::style::BlockStyle;

/// A line placed on a page
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageLine {
    /// The laid-out line
    pub line: Line,
    /// Left offset of the paragraph's content box
    pub x: i32,
    /// Top of the line box
    pub y: i32,
}

/// A single page of laid-out content
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    /// Page number (1-indexed)
    pub page_number: usize,
    /// Lines on this page, top to bottom
    pub lines: Vec<PageLine>,
}

impl Page {
    /// Create a new empty page
    pub fn new(page_number: usize) -> Self {
        Self {
            page_number,
            lines: Vec::new(),
        }
    }

    /// Check if page has no lines
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Get number of lines on page
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Text of every line, top to bottom
    pub fn line_texts(&self) -> Vec<String> {
        self.lines.iter().map(|l| l.line.text()).collect()
    }
}

/// Vertical cursor over the current page
#[derive(Debug)]
pub struct PageAssembler {
    viewport_height: i32,
    line_height: i32,
    extra_paragraph_spacing: bool,
    page: Page,
    next_y: i32,
    sealed: usize,
}

impl PageAssembler {
    /// Create an assembler for pages `viewport_height` pixels tall
    pub fn new(viewport_height: i32, line_height: i32, extra_paragraph_spacing: bool) -> Self {
        Self {
            viewport_height,
            line_height,
            extra_paragraph_spacing,
            page: Page::new(1),
            next_y: 0,
            sealed: 0,
        }
    }

    /// Line advance in pixels
    pub fn line_height(&self) -> i32 {
        self.line_height
    }

    /// Current vertical cursor
    pub fn cursor(&self) -> i32 {
        self.next_y
    }

    /// Number of pages handed to the sink so far
    pub fn pages_sealed(&self) -> usize {
        self.sealed
    }

    /// Advance past a paragraph's top margin and padding
    pub fn begin_block(&mut self, style: &BlockStyle) {
        self.next_y += style.margin_top.max(0) + style.padding_top.max(0);
    }

    /// Advance past a paragraph's bottom spacing
    pub fn end_block(&mut self, style: &BlockStyle) {
        self.next_y += style.margin_bottom.max(0) + style.padding_bottom.max(0);
        if self.extra_paragraph_spacing {
            self.next_y += self.line_height / 2;
        }
    }

    /// Place a line, sealing the current page first if it would overflow
    pub fn add_line<F: FnMut(Page)>(&mut self, line: Line, on_page: &mut F) {
        if self.next_y + self.line_height > self.viewport_height {
            if self.page.is_empty() {
                self.next_y = 0;
            } else {
                self.seal(on_page);
            }
        }

        let x = line.style.left_inset();
        self.page.lines.push(PageLine {
            line,
            x,
            y: self.next_y,
        });
        self.next_y += self.line_height;
    }

    /// Seal the last page if it holds any line
    pub fn finish<F: FnMut(Page)>(&mut self, on_page: &mut F) {
        if !self.page.is_empty() {
            self.seal(on_page);
        }
    }

    fn seal<F: FnMut(Page)>(&mut self, on_page: &mut F) {
        let next = Page::new(self.page.page_number + 1);
        let page = core::mem::replace(&mut self.page, next);
        self.next_y = 0;
        self.sealed += 1;
        on_page(page);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::TextAlign;
    use crate::layout::PositionedWord;
    use crate::style::WordStyle;

    fn line(text: &str, style: BlockStyle) -> Line {
        Line {
            words: alloc::vec![PositionedWord {
                text: text.into(),
                style: WordStyle::REGULAR,
                x: 0,
                attached: false,
            }],
            style,
        }
    }

    #[test]
    fn test_lines_stack_and_seal() {
        let mut asm = PageAssembler::new(60, 20, false);
        let mut pages = Vec::new();
        let mut sink = |p: Page| pages.push(p);
        let style = BlockStyle::default();
        for t in ["a", "b", "c", "d"] {
            asm.add_line(line(t, style), &mut sink);
        }
        asm.finish(&mut sink);

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[0].line_texts(), alloc::vec!["a", "b", "c"]);
        let ys: Vec<i32> = pages[0].lines.iter().map(|l| l.y).collect();
        assert_eq!(ys, alloc::vec![0, 20, 40]);
        assert_eq!(pages[1].page_number, 2);
        assert_eq!(pages[1].lines[0].y, 0);
    }

    #[test]
    fn test_block_spacing_and_inset() {
        let mut asm = PageAssembler::new(400, 20, true);
        let mut pages = Vec::new();
        let mut sink = |p: Page| pages.push(p);

        let mut style = BlockStyle::aligned(TextAlign::Left);
        style.margin_top = 5;
        style.padding_top = 3;
        style.margin_bottom = 4;
        style.margin_left = 7;
        style.padding_left = 2;

        asm.begin_block(&style);
        asm.add_line(line("x", style), &mut sink);
        asm.end_block(&style);
        assert_eq!(asm.cursor(), 8 + 20 + 4 + 10);
        asm.add_line(line("y", BlockStyle::default()), &mut sink);
        asm.finish(&mut sink);

        assert_eq!(pages[0].lines[0].x, 9);
        assert_eq!(pages[0].lines[0].y, 8);
        assert_eq!(pages[0].lines[1].y, 42);
        assert_eq!(pages[0].lines[1].x, 0);
    }

    #[test]
    fn test_empty_page_never_sealed() {
        let mut asm = PageAssembler::new(30, 20, false);
        let mut pages = Vec::new();
        let mut sink = |p: Page| pages.push(p);
        let mut style = BlockStyle::default();
        style.margin_top = 25;
        asm.begin_block(&style);
        asm.add_line(line("a", style), &mut sink);
        asm.finish(&mut sink);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].lines[0].y, 0);

        let mut asm = PageAssembler::new(30, 20, false);
        let mut sealed = Vec::new();
        asm.finish(&mut |p: Page| sealed.push(p));
        assert!(sealed.is_empty());
        assert_eq!(asm.pages_sealed(), 0);
    }
}
