//! Streaming XHTML chapter tokenizer
//!
//! [`ChapterParser`] is an event-driven state machine: element-open,
//! character-data and element-close events turn into styled words, words
//! accumulate into a [`TextBlock`] per paragraph, and paragraphs go through
//! the layout engine into pages as soon as a block ends or memory runs low.
//!
//! With the `std` feature, [`ChapterParser::parse_reader`] pulls events from
//! any `BufRead` with quick_xml. Callers with their own event source can
//! drive [`ChapterParser::start_element`], [`ChapterParser::character_data`]
//! and [`ChapterParser::end_element`] directly.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::classify::{
    decode_codepoint, is_cjk_split, is_invisible, is_word_boundary_byte, utf8_sequence_len,
    IDEOGRAPHIC_SPACE,
};
use crate::css::{round_px, CssStyle, StyleResolver, TextAlign};
use crate::layout::{FontMetrics, LayoutEngine, DEFAULT_CJK_PARAGRAPH_PERCENT};
use crate::page::{Page, PageAssembler};
use crate::streaming::{FlushPolicy, MemoryOracle, StreamingStats, Unbounded};
use crate::style::{BlockStyle, StyleFrame, WordStyle};
use crate::text_block::{TextBlock, Word};

#[cfg(feature = "std")]
use crate::error::TypesetError;

/// Capacity of the part-word buffer in bytes.
pub const WORD_BUFFER_CAPACITY: usize = 200;

const HEADER_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
const BLOCK_TAGS: &[&str] = &["p", "li", "div", "blockquote"];
const BOLD_TAGS: &[&str] = &["b", "strong"];
const ITALIC_TAGS: &[&str] = &["i", "em"];
const UNDERLINE_TAGS: &[&str] = &["u", "ins"];
const SKIP_TAGS: &[&str] = &["head", "script", "style"];

/// Bullet inserted at the start of every list item.
const BULLET: &str = "\u{2022}";

static UNBOUNDED: Unbounded = Unbounded;

/// Text substituted for content that is not laid out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placeholders {
    /// Shown instead of a table
    pub table: String,
    /// Shown for an image without alt text
    pub image: String,
    /// Shown for an image with alt text; `{alt}` is replaced by the text
    pub image_with_alt: String,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            table: String::from("[Table omitted]"),
            image: String::from("[Image]"),
            image_with_alt: String::from("[Image: {alt}]"),
        }
    }
}

impl Placeholders {
    /// Placeholder text for an image with the given alt attribute.
    pub fn image_text(&self, alt: Option<&str>) -> String {
        match alt.filter(|a| !a.is_empty()) {
            Some(alt) => self.image_with_alt.replace("{alt}", alt),
            None => self.image.clone(),
        }
    }
}

/// Chapter layout configuration
#[derive(Clone, Debug, PartialEq)]
pub struct ChapterOptions {
    /// Content width in pixels
    pub viewport_width: i32,
    /// Content height in pixels
    pub viewport_height: i32,
    /// Alignment for paragraphs whose CSS sets none
    pub paragraph_alignment: TextAlign,
    /// Multiplier on the font's line height
    pub line_compression: f32,
    /// Add half a line after every paragraph
    pub extra_paragraph_spacing: bool,
    /// Indent the first line of paragraphs by two em spaces
    pub first_line_indent: bool,
    /// Apply the chapter's CSS
    pub embedded_style: bool,
    /// Memory-pressure watermarks
    pub flush_policy: FlushPolicy,
    /// Share of CJK words that makes a paragraph CJK
    pub cjk_paragraph_percent: u8,
    /// Placeholder texts
    pub placeholders: Placeholders,
}

impl Default for ChapterOptions {
    fn default() -> Self {
        // 480x800 display minus margins, header and footer
        Self {
            viewport_width: 416,
            viewport_height: 715,
            paragraph_alignment: TextAlign::Justify,
            line_compression: 1.0,
            extra_paragraph_spacing: true,
            first_line_indent: false,
            embedded_style: true,
            flush_policy: FlushPolicy::default(),
            cjk_paragraph_percent: DEFAULT_CJK_PARAGRAPH_PERCENT,
            placeholders: Placeholders::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InlineAxis {
    Bold,
    Italic,
    Underline,
}

fn inline_axis(name: &str) -> Option<InlineAxis> {
    if BOLD_TAGS.contains(&name) {
        Some(InlineAxis::Bold)
    } else if ITALIC_TAGS.contains(&name) {
        Some(InlineAxis::Italic)
    } else if UNDERLINE_TAGS.contains(&name) {
        Some(InlineAxis::Underline)
    } else {
        None
    }
}

fn is_header_or_block(name: &str) -> bool {
    HEADER_TAGS.contains(&name) || BLOCK_TAGS.contains(&name) || name == "br"
}

fn is_pagebreak(attributes: &[(&str, &str)]) -> bool {
    attributes.iter().any(|(key, value)| {
        (*key == "role" && *value == "doc-pagebreak")
            || (*key == "epub:type" && *value == "pagebreak")
    })
}

fn attribute<'v>(attributes: &[(&str, &'v str)], key: &str) -> Option<&'v str> {
    attributes
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, value)| *value)
}

/// Streaming chapter-to-pages state machine
pub struct ChapterParser<'a, M: FontMetrics + ?Sized, F: FnMut(Page)> {
    metrics: &'a M,
    styles: Option<&'a dyn StyleResolver>,
    memory: &'a dyn MemoryOracle,
    opts: ChapterOptions,
    on_page: F,
    depth: usize,
    skip_until: Option<usize>,
    frames: Vec<StyleFrame>,
    word_buf: heapless::Vec<u8, WORD_BUFFER_CAPACITY>,
    pending: heapless::Vec<u8, 4>,
    next_word_continues: bool,
    block: TextBlock,
    assembler: PageAssembler,
    stats: StreamingStats,
}

impl<'a, M, F> ChapterParser<'a, M, F>
where
    M: FontMetrics + ?Sized,
    F: FnMut(Page),
{
    /// Create a parser that hands every sealed page to `on_page`.
    pub fn new(metrics: &'a M, options: ChapterOptions, on_page: F) -> Self {
        let line_height =
            round_px(metrics.line_height() as f32 * options.line_compression).max(1);
        let assembler = PageAssembler::new(
            options.viewport_height,
            line_height,
            options.extra_paragraph_spacing,
        );
        let initial = BlockStyle {
            alignment: options.paragraph_alignment,
            text_align_defined: true,
            first_line_indent: options.first_line_indent,
            ..BlockStyle::default()
        };
        Self {
            metrics,
            styles: None,
            memory: &UNBOUNDED,
            opts: options,
            on_page,
            depth: 0,
            skip_until: None,
            frames: Vec::new(),
            word_buf: heapless::Vec::new(),
            pending: heapless::Vec::new(),
            next_word_continues: false,
            block: TextBlock::new(initial),
            assembler,
            stats: StreamingStats::default(),
        }
    }

    /// Resolve element styles through `styles`.
    pub fn with_styles(mut self, styles: &'a dyn StyleResolver) -> Self {
        self.styles = Some(styles);
        self
    }

    /// Read free heap from `oracle` when deciding on early flushes.
    pub fn with_memory_oracle(mut self, oracle: &'a dyn MemoryOracle) -> Self {
        self.memory = oracle;
        self
    }

    /// Statistics so far
    pub fn stats(&self) -> &StreamingStats {
        &self.stats
    }

    /// Current element depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Style applied to the next buffered word
    pub fn effective_style(&self) -> WordStyle {
        self.frames
            .iter()
            .fold(WordStyle::REGULAR, |style, frame| frame.apply(style))
    }

    fn skipping(&self) -> bool {
        self.skip_until.is_some_and(|d| d < self.depth)
    }

    fn em_px(&self) -> f32 {
        self.metrics.line_height() as f32 * self.opts.line_compression
    }

    /// Handle an element open. `attributes` are `(name, value)` pairs with
    /// entities already resolved.
    pub fn start_element(&mut self, name: &str, attributes: &[(&str, &str)]) {
        if self.skipping() {
            self.depth += 1;
            return;
        }

        if name == "table" {
            let text = self.opts.placeholders.table.clone();
            self.start_placeholder(&text);
            return;
        }

        if name == "img" {
            let text = self.opts.placeholders.image_text(attribute(attributes, "alt"));
            log::debug!("image alt: {}", text);
            self.start_placeholder(&text);
            return;
        }

        if SKIP_TAGS.contains(&name) || is_pagebreak(attributes) {
            self.skip_until = Some(self.depth);
            self.depth += 1;
            return;
        }

        let css = self.resolve_css(name, attributes);
        let em = self.em_px();
        let viewport_width = self.opts.viewport_width;

        if HEADER_TAGS.contains(&name) {
            let mut style = BlockStyle::from_css(&css, em, TextAlign::Center, viewport_width);
            style.text_align_defined = true;
            self.start_new_block(style);
            let mut frame = StyleFrame::from_css(self.depth, &css);
            frame.bold = Some(true);
            self.push_frame(frame);
        } else if BLOCK_TAGS.contains(&name) {
            let mut style =
                BlockStyle::from_css(&css, em, self.opts.paragraph_alignment, viewport_width);
            style.first_line_indent = self.opts.first_line_indent;
            self.start_new_block(style);
            let frame = StyleFrame::from_css(self.depth, &css);
            if !frame.is_empty() {
                self.push_frame(frame);
            }
            if name == "li" {
                self.push_word(Word::new(BULLET, WordStyle::REGULAR));
            }
        } else if name == "br" {
            self.flush_word();
            if !self.block.is_pristine() {
                let style = *self.block.style();
                self.start_new_block(style);
            }
        } else if let Some(axis) = inline_axis(name) {
            self.flush_word_continuing();
            let mut frame = StyleFrame::from_css(self.depth, &css);
            match axis {
                InlineAxis::Bold => frame.bold = Some(true),
                InlineAxis::Italic => frame.italic = Some(true),
                InlineAxis::Underline => frame.underline = Some(true),
            }
            self.push_frame(frame);
        } else if css.has_inline_styling() {
            self.flush_word_continuing();
            self.push_frame(StyleFrame::from_css(self.depth, &css));
        }

        self.depth += 1;
    }

    /// Handle raw character data. Sequences split across calls are joined.
    pub fn character_data(&mut self, data: &[u8]) {
        if self.skipping() {
            return;
        }

        let mut data = data;
        while !self.pending.is_empty() {
            let Some((&byte, rest)) = data.split_first() else {
                return;
            };
            if byte & 0xC0 != 0x80 {
                let pending = core::mem::take(&mut self.pending);
                self.append_bytes(&pending);
                break;
            }
            // cannot overflow: a sequence is at most four bytes
            let _ = self.pending.push(byte);
            data = rest;
            if self.pending.len() == utf8_sequence_len(self.pending[0]) {
                let sequence = core::mem::take(&mut self.pending);
                match decode_codepoint(&sequence) {
                    Some(ch) => self.handle_char(ch, &sequence),
                    None => self.append_bytes(&sequence),
                }
            }
        }

        let mut i = 0;
        while i < data.len() {
            let byte = data[i];
            if is_word_boundary_byte(byte) {
                self.flush_word();
                self.next_word_continues = false;
                i += 1;
                continue;
            }

            let len = utf8_sequence_len(byte);
            if i + len > data.len() {
                for &b in &data[i..] {
                    let _ = self.pending.push(b);
                }
                break;
            }

            let sequence = &data[i..i + len];
            match decode_codepoint(sequence) {
                Some(ch) => {
                    self.handle_char(ch, sequence);
                    i += len;
                }
                None => {
                    self.append_bytes(&data[i..i + 1]);
                    i += 1;
                }
            }
        }
    }

    /// Handle an element close.
    pub fn end_element(&mut self, name: &str) {
        if self.depth == 0 {
            return;
        }
        let closing = self.depth - 1;
        if self.skip_until.is_some_and(|d| d < closing) {
            self.depth -= 1;
            return;
        }

        let header_or_block = is_header_or_block(name);
        let placeholder = name == "table" || name == "img";
        let style_will_change = self.frames.last().is_some_and(|f| f.depth == closing);

        if self.has_buffered() {
            let is_inline = !header_or_block && !placeholder && self.depth != 1;
            let should_flush = style_will_change
                || header_or_block
                || inline_axis(name).is_some()
                || placeholder
                || self.depth == 1;
            if should_flush {
                self.flush_word();
                if is_inline {
                    self.next_word_continues = true;
                }
            }
        }

        self.depth -= 1;
        if self.skip_until == Some(self.depth) {
            self.skip_until = None;
        }
        if self.frames.last().is_some_and(|f| f.depth == self.depth) {
            self.frames.pop();
        }
    }

    /// Lay out the last paragraph, seal the last page and return statistics.
    pub fn finish(mut self) -> StreamingStats {
        self.flush_word();
        if !self.block.is_pristine() {
            self.make_pages();
        }
        self.assembler.finish(&mut self.on_page);
        self.stats.pages = self.assembler.pages_sealed();
        self.stats
    }

    fn resolve_css(&self, name: &str, attributes: &[(&str, &str)]) -> CssStyle {
        if !self.opts.embedded_style {
            return CssStyle::default();
        }
        match self.styles {
            Some(styles) => styles.resolve_element(
                name,
                attribute(attributes, "class").unwrap_or(""),
                attribute(attributes, "style"),
            ),
            None => CssStyle::default(),
        }
    }

    fn start_placeholder(&mut self, text: &str) {
        self.start_new_block(BlockStyle {
            alignment: TextAlign::Center,
            text_align_defined: true,
            ..BlockStyle::default()
        });
        self.push_frame(StyleFrame {
            depth: self.depth,
            italic: Some(true),
            ..StyleFrame::default()
        });
        self.depth += 1;
        self.character_data(text.as_bytes());
        self.skip_until = Some(self.depth - 1);
    }

    fn push_frame(&mut self, frame: StyleFrame) {
        match self.frames.last_mut() {
            Some(top) if top.depth == frame.depth => *top = frame,
            _ => self.frames.push(frame),
        }
    }

    fn has_buffered(&self) -> bool {
        !self.word_buf.is_empty() || !self.pending.is_empty()
    }

    fn handle_char(&mut self, ch: char, bytes: &[u8]) {
        if is_invisible(ch) {
            return;
        }
        if ch == IDEOGRAPHIC_SPACE {
            self.flush_word();
            self.next_word_continues = false;
            return;
        }
        if is_cjk_split(ch) {
            self.flush_word();
            self.next_word_continues = false;
            let word = Word::new(ch.to_string(), self.effective_style());
            self.push_word(word);
            return;
        }
        self.append_bytes(bytes);
    }

    fn append_bytes(&mut self, bytes: &[u8]) {
        if self.word_buf.extend_from_slice(bytes).is_err() {
            self.emit_buffered();
            self.next_word_continues = true;
            let _ = self.word_buf.extend_from_slice(bytes);
        }
    }

    fn flush_word_continuing(&mut self) {
        if self.has_buffered() {
            self.flush_word();
            self.next_word_continues = true;
        }
    }

    /// Emit the buffered word, including any incomplete trailing sequence.
    fn flush_word(&mut self) {
        if !self.pending.is_empty() {
            let pending = core::mem::take(&mut self.pending);
            self.append_bytes(&pending);
        }
        self.emit_buffered();
    }

    fn emit_buffered(&mut self) {
        if self.word_buf.is_empty() {
            return;
        }
        let text = String::from_utf8_lossy(&self.word_buf).into_owned();
        self.word_buf.clear();
        let word = Word {
            text,
            style: self.effective_style(),
            continues: core::mem::take(&mut self.next_word_continues),
        };
        self.push_word(word);
    }

    fn push_word(&mut self, word: Word) {
        self.block.push(word);
        self.stats.words += 1;
        self.flush_if_needed();
    }

    fn flush_if_needed(&mut self) {
        let words = self.block.len();
        if words == 0 {
            return;
        }
        let free = self.memory.free_heap_bytes();
        if let Some(reason) = self.opts.flush_policy.decide(words, free) {
            log::debug!(
                "flushing paragraph early ({:?}, words={}, free={})",
                reason,
                words,
                free
            );
            self.stats.record_flush(reason);
            self.begin_block_once();
            self.layout_block(reason.includes_last_line());
        }
    }

    /// Open a block boundary. Buffered text belongs to the block being left.
    fn start_new_block(&mut self, style: BlockStyle) {
        self.flush_word();
        self.next_word_continues = false;
        if self.block.is_pristine() {
            let merged = self.block.style().combined_with(&style);
            self.block.set_style(merged);
            return;
        }
        self.make_pages();
        self.block = TextBlock::new(style);
    }

    fn begin_block_once(&mut self) {
        if !self.block.started() {
            self.assembler.begin_block(self.block.style());
            self.block.mark_started();
        }
    }

    fn make_pages(&mut self) {
        let style = *self.block.style();
        self.begin_block_once();
        self.layout_block(true);
        self.assembler.end_block(&style);
    }

    fn layout_block(&mut self, include_last_line: bool) {
        let style = *self.block.style();
        let inset = style.horizontal_inset();
        let viewport_width = self.opts.viewport_width;
        let width = if inset < viewport_width {
            viewport_width - inset
        } else {
            viewport_width
        };

        let engine = LayoutEngine::new(self.metrics)
            .with_cjk_paragraph_percent(self.opts.cjk_paragraph_percent);
        let assembler = &mut self.assembler;
        let on_page = &mut self.on_page;
        let lines = engine.layout_block(&mut self.block, width, include_last_line, |line| {
            assembler.add_line(line, on_page);
        });
        self.stats.lines += lines;
        self.stats.pages = self.assembler.pages_sealed();
    }
}

#[cfg(feature = "std")]
mod driver {
    use super::*;

    use std::borrow::Cow;
    use std::io::BufRead;

    use quick_xml::escape::unescape;
    use quick_xml::events::{BytesStart, Event};
    use quick_xml::reader::Reader;

    /// Attributes the tokenizer looks at.
    const WANTED_ATTRIBUTES: &[&str] = &["class", "style", "alt", "role", "epub:type"];

    impl<'a, M, F> ChapterParser<'a, M, F>
    where
        M: FontMetrics + ?Sized,
        F: FnMut(Page),
    {
        /// Pull markup events from `source` until end of input.
        ///
        /// Pages completed along the way are already with the sink when an
        /// error is returned.
        pub fn parse_reader<R: BufRead>(&mut self, source: R) -> Result<(), TypesetError> {
            let mut reader = Reader::from_reader(source);
            reader.config_mut().trim_text(false);
            reader.config_mut().expand_empty_elements = false;

            let mut buf = Vec::new();
            loop {
                let event = match reader.read_event_into(&mut buf) {
                    Ok(event) => event,
                    Err(err) => {
                        let position = reader.buffer_position() as u64;
                        log::warn!("markup error at byte {}: {}", position, err);
                        return Err(xml_error(err, position));
                    }
                };
                match event {
                    Event::Start(e) => {
                        let name = decode(&reader, e.name().as_ref())?;
                        let owned = collect_attributes(&reader, &e)?;
                        let attributes = borrow_attributes(&owned);
                        self.start_element(&name, &attributes);
                    }
                    Event::Empty(e) => {
                        let name = decode(&reader, e.name().as_ref())?;
                        let owned = collect_attributes(&reader, &e)?;
                        let attributes = borrow_attributes(&owned);
                        self.start_element(&name, &attributes);
                        self.end_element(&name);
                    }
                    Event::End(e) => {
                        let name = decode(&reader, e.name().as_ref())?;
                        self.end_element(&name);
                    }
                    Event::Text(e) => self.character_data(&e),
                    Event::CData(e) => self.character_data(&e),
                    Event::GeneralRef(e) => {
                        let name = decode(&reader, &e)?;
                        match resolve_entity(&name) {
                            Some(text) => self.character_data(text.as_bytes()),
                            None => log::debug!("dropping unknown entity &{};", name),
                        }
                    }
                    Event::Eof => break,
                    // Comments, declarations, processing instructions, doctype
                    _ => {}
                }
                buf.clear();
            }

            self.stats.bytes_read = reader.buffer_position() as usize;
            Ok(())
        }

        /// Parse an in-memory chapter.
        pub fn parse_str(&mut self, html: &str) -> Result<(), TypesetError> {
            self.parse_reader(html.as_bytes())
        }
    }

    fn xml_error(err: quick_xml::Error, position: u64) -> TypesetError {
        match err {
            quick_xml::Error::Io(io) => TypesetError::Io(io.to_string()),
            other => TypesetError::Parse {
                position,
                message: other.to_string(),
            },
        }
    }

    fn decode<R>(reader: &Reader<R>, bytes: &[u8]) -> Result<String, TypesetError> {
        reader
            .decoder()
            .decode(bytes)
            .map(|s| s.into_owned())
            .map_err(|e| TypesetError::Parse {
                position: reader.buffer_position() as u64,
                message: format!("Decode error: {:?}", e),
            })
    }

    type OwnedAttributes = heapless::Vec<(&'static str, String), 5>;

    fn collect_attributes<R>(
        reader: &Reader<R>,
        element: &BytesStart<'_>,
    ) -> Result<OwnedAttributes, TypesetError> {
        let mut out = OwnedAttributes::new();
        for attr in element.attributes().flatten() {
            let key = attr.key.as_ref();
            let Some(&wanted) = WANTED_ATTRIBUTES.iter().find(|w| w.as_bytes() == key) else {
                continue;
            };
            let raw = decode(reader, &attr.value)?;
            let value = match unescape(&raw) {
                Ok(Cow::Owned(unescaped)) => unescaped,
                _ => raw,
            };
            if out.iter().all(|(k, _)| *k != wanted) {
                let _ = out.push((wanted, value));
            }
        }
        Ok(out)
    }

    fn borrow_attributes(owned: &OwnedAttributes) -> heapless::Vec<(&str, &str), 5> {
        owned
            .iter()
            .map(|(key, value)| (*key, value.as_str()))
            .collect()
    }

    /// Resolve an entity reference by name (without `&` and `;`).
    pub(super) fn resolve_entity(name: &str) -> Option<String> {
        let reference = format!("&{};", name);
        if let Ok(resolved) = unescape(&reference) {
            return Some(resolved.into_owned());
        }
        html_entity(name).map(String::from)
    }

    fn html_entity(name: &str) -> Option<&'static str> {
        let text = match name {
            "nbsp" => "\u{00A0}",
            "ensp" => "\u{2002}",
            "emsp" => "\u{2003}",
            "thinsp" => "\u{2009}",
            "shy" => "\u{00AD}",
            "mdash" => "\u{2014}",
            "ndash" => "\u{2013}",
            "hellip" => "\u{2026}",
            "lsquo" => "\u{2018}",
            "rsquo" => "\u{2019}",
            "ldquo" => "\u{201C}",
            "rdquo" => "\u{201D}",
            "laquo" => "\u{00AB}",
            "raquo" => "\u{00BB}",
            "bull" => "\u{2022}",
            "middot" => "\u{00B7}",
            "copy" => "\u{00A9}",
            "reg" => "\u{00AE}",
            "trade" => "\u{2122}",
            "deg" => "\u{00B0}",
            "times" => "\u{00D7}",
            "sect" => "\u{00A7}",
            "para" => "\u{00B6}",
            "dagger" => "\u{2020}",
            _ => return None,
        };
        Some(text)
    }
}

/// Paginate an in-memory chapter with default memory behavior.
#[cfg(feature = "std")]
pub fn paginate_chapter<M: FontMetrics + ?Sized>(
    html: &str,
    metrics: &M,
    options: ChapterOptions,
) -> Result<Vec<Page>, TypesetError> {
    let mut pages = Vec::new();
    let mut parser = ChapterParser::new(metrics, options, |page| pages.push(page));
    parser.parse_str(html)?;
    parser.finish();
    Ok(pages)
}

/// Paginate an in-memory chapter, resolving element styles through `styles`.
#[cfg(feature = "std")]
pub fn paginate_chapter_with_styles<M: FontMetrics + ?Sized>(
    html: &str,
    metrics: &M,
    styles: &dyn StyleResolver,
    options: ChapterOptions,
) -> Result<Vec<Page>, TypesetError> {
    let mut pages = Vec::new();
    let mut parser =
        ChapterParser::new(metrics, options, |page| pages.push(page)).with_styles(styles);
    parser.parse_str(html)?;
    parser.finish();
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::MonospaceMetrics;
    use crate::streaming::SimulatedHeap;

    fn metrics() -> MonospaceMetrics {
        MonospaceMetrics::new(10, 20)
    }

    fn options() -> ChapterOptions {
        ChapterOptions {
            viewport_width: 200,
            viewport_height: 100,
            paragraph_alignment: TextAlign::Left,
            extra_paragraph_spacing: false,
            ..ChapterOptions::default()
        }
    }

    fn words_of(pages: &[Page]) -> Vec<(String, WordStyle, bool)> {
        pages
            .iter()
            .flat_map(|p| p.lines.iter())
            .flat_map(|l| l.line.words.iter())
            .map(|w| (w.text.clone(), w.style, w.attached))
            .collect()
    }

    fn texts_of(pages: &[Page]) -> Vec<String> {
        pages.iter().flat_map(|p| p.line_texts()).collect()
    }

    #[test]
    fn test_handlers_style_flush_ordering() {
        let m = metrics();
        let mut pages = Vec::new();
        let mut parser = ChapterParser::new(&m, options(), |p| pages.push(p));
        parser.start_element("p", &[]);
        parser.start_element("b", &[]);
        parser.character_data(b"abc");
        parser.end_element("b");
        parser.character_data(b"def");
        parser.end_element("p");
        let stats = parser.finish();

        assert_eq!(stats.words, 2);
        let words = words_of(&pages);
        assert_eq!(words[0], ("abc".to_string(), WordStyle::BOLD, false));
        assert_eq!(words[1], ("def".to_string(), WordStyle::REGULAR, true));
    }

    #[test]
    fn test_utf8_split_across_calls() {
        let m = metrics();
        let mut pages = Vec::new();
        let mut parser = ChapterParser::new(&m, options(), |p| pages.push(p));
        let bytes = "café 中".as_bytes();
        // split inside "é" and inside "中"
        parser.start_element("p", &[]);
        parser.character_data(&bytes[..4]);
        parser.character_data(&bytes[4..7]);
        parser.character_data(&bytes[7..]);
        parser.end_element("p");
        parser.finish();

        let texts: Vec<String> = words_of(&pages).into_iter().map(|w| w.0).collect();
        assert_eq!(texts, vec!["café", "中"]);
    }

    #[test]
    fn test_incomplete_sequence_decoded_lossily_at_flush() {
        let m = metrics();
        let mut pages = Vec::new();
        let mut parser = ChapterParser::new(&m, options(), |p| pages.push(p));
        parser.start_element("p", &[]);
        parser.character_data(&[b'a', 0xE4, 0xB8]);
        parser.end_element("p");
        parser.finish();
        assert_eq!(words_of(&pages)[0].0, "a\u{FFFD}");
    }

    #[test]
    fn test_invisible_and_ideographic_space() {
        let m = metrics();
        let mut pages = Vec::new();
        let mut parser = ChapterParser::new(&m, options(), |p| pages.push(p));
        parser.start_element("p", &[]);
        parser.character_data("ab\u{200B}c\u{3000}de\u{00AD}f".as_bytes());
        parser.end_element("p");
        parser.finish();
        let texts: Vec<String> = words_of(&pages).into_iter().map(|w| w.0).collect();
        assert_eq!(texts, vec!["abc", "def"]);
    }

    #[test]
    fn test_long_word_split_at_buffer_capacity() {
        let m = MonospaceMetrics::new(1, 20);
        let mut pages = Vec::new();
        let opts = ChapterOptions {
            viewport_width: 1000,
            ..options()
        };
        let mut parser = ChapterParser::new(&m, opts, |p| pages.push(p));
        let long = "x".repeat(WORD_BUFFER_CAPACITY + 10);
        parser.start_element("p", &[]);
        parser.character_data(long.as_bytes());
        parser.end_element("p");
        parser.finish();

        let words = words_of(&pages);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].0.len(), WORD_BUFFER_CAPACITY);
        assert_eq!(words[1].0.len(), 10);
        assert!(words[1].2);
    }

    #[test]
    fn test_cjk_words_take_effective_style() {
        let m = metrics();
        let mut pages = Vec::new();
        let mut parser = ChapterParser::new(&m, options(), |p| pages.push(p));
        parser.start_element("p", &[]);
        parser.start_element("em", &[]);
        parser.character_data("中文".as_bytes());
        parser.end_element("em");
        parser.end_element("p");
        parser.finish();
        let words = words_of(&pages);
        assert_eq!(words.len(), 2);
        assert!(words.iter().all(|w| w.1 == WordStyle::ITALIC));
    }

    #[test]
    fn test_nested_frames_restore_style() {
        let m = metrics();
        let mut pages = Vec::new();
        let mut parser = ChapterParser::new(&m, options(), |p| pages.push(p));
        parser.start_element("p", &[]);
        parser.start_element("b", &[]);
        parser.character_data(b"one ");
        parser.start_element("i", &[]);
        assert_eq!(parser.effective_style(), WordStyle::BOLD | WordStyle::ITALIC);
        parser.character_data(b"two ");
        parser.end_element("i");
        assert_eq!(parser.effective_style(), WordStyle::BOLD);
        parser.character_data(b"three");
        parser.end_element("b");
        assert_eq!(parser.effective_style(), WordStyle::REGULAR);
        parser.end_element("p");
        parser.finish();

        let words = words_of(&pages);
        assert_eq!(words[0].1, WordStyle::BOLD);
        assert_eq!(words[1].1, WordStyle::BOLD | WordStyle::ITALIC);
        assert_eq!(words[2].1, WordStyle::BOLD);
    }

    #[test]
    fn test_critical_heap_emits_each_word() {
        let m = metrics();
        let heap = SimulatedHeap::new(1024);
        let mut pages = Vec::new();
        let mut parser =
            ChapterParser::new(&m, options(), |p| pages.push(p)).with_memory_oracle(&heap);
        parser.start_element("p", &[]);
        parser.character_data(b"alpha beta gamma");
        parser.end_element("p");
        let stats = parser.finish();

        assert_eq!(texts_of(&pages), vec!["alpha", "beta", "gamma"]);
        assert_eq!(stats.critical_heap_flushes, 3);
        assert_eq!(stats.lines, 3);
    }

    #[test]
    fn test_empty_document_yields_no_pages() {
        let m = metrics();
        let mut pages = Vec::new();
        let mut parser = ChapterParser::new(&m, options(), |p| pages.push(p));
        parser.start_element("html", &[]);
        parser.start_element("body", &[]);
        parser.character_data(b"  \n ");
        parser.end_element("body");
        parser.end_element("html");
        let stats = parser.finish();
        assert!(pages.is_empty());
        assert_eq!(stats.pages, 0);
    }

    #[test]
    fn test_placeholder_text() {
        let placeholders = Placeholders::default();
        assert_eq!(placeholders.image_text(None), "[Image]");
        assert_eq!(placeholders.image_text(Some("")), "[Image]");
        assert_eq!(placeholders.image_text(Some("A map")), "[Image: A map]");
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_entities_resolved() {
        assert_eq!(driver::resolve_entity("amp").as_deref(), Some("&"));
        assert_eq!(driver::resolve_entity("#233").as_deref(), Some("é"));
        assert_eq!(driver::resolve_entity("mdash").as_deref(), Some("\u{2014}"));
        assert_eq!(driver::resolve_entity("bogus"), None);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_parse_str_skips_head_and_scripts() {
        let html = "<html><head><title>Title</title><style>p { }</style></head>\
                    <body><p>Hello</p><script>var x;</script></body></html>";
        let pages = paginate_chapter(html, &metrics(), options()).unwrap();
        assert_eq!(texts_of(&pages), vec!["Hello"]);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_mismatched_tags_rejected() {
        let html = "<p>Text with <em>italic</p>";
        let err = paginate_chapter(html, &metrics(), options()).unwrap_err();
        assert!(matches!(err, TypesetError::Parse { .. }));
    }
}
