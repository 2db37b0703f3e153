//! embedded-graphics renderer for `mu-typeset` pages.
//!
//! [`MonoFontBackend`] doubles as the [`FontMetrics`] the layout engine
//! measures with, so words land exactly where the fonts draw them.

use embedded_graphics::{
    mono_font::{
        ascii::{FONT_6X13_ITALIC, FONT_7X13_BOLD, FONT_8X13, FONT_9X15_BOLD},
        MonoFont, MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Line, PrimitiveStyle},
    text::Text,
};
use mu_typeset::{FontMetrics, Page, PositionedWord, WordStyle};

/// Font abstraction used by the renderer's text path.
///
/// Implementors measure text for layout and draw single words.
pub trait FontBackend: FontMetrics {
    /// Draw `text` with its baseline at `origin`. Returns the advance in pixels.
    fn draw_word<D>(
        &self,
        display: &mut D,
        text: &str,
        style: WordStyle,
        origin: Point,
    ) -> Result<i32, D::Error>
    where
        D: DrawTarget<Color = BinaryColor>;
}

/// Mono-font backend over the embedded-graphics ASCII fonts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonoFontBackend {
    line_height: i32,
}

impl Default for MonoFontBackend {
    fn default() -> Self {
        Self { line_height: 20 }
    }
}

impl MonoFontBackend {
    /// Backend with a custom line advance.
    pub fn with_line_height(line_height: i32) -> Self {
        Self { line_height }
    }

    fn font_for(style: WordStyle) -> &'static MonoFont<'static> {
        match (style.is_bold(), style.is_italic()) {
            (true, true) => &FONT_7X13_BOLD,
            (true, false) => &FONT_9X15_BOLD,
            (false, true) => &FONT_6X13_ITALIC,
            (false, false) => &FONT_8X13,
        }
    }

    fn advance(font: &MonoFont<'_>) -> i32 {
        (font.character_size.width + font.character_spacing) as i32
    }
}

impl FontMetrics for MonoFontBackend {
    fn text_width(&self, text: &str, style: WordStyle) -> i32 {
        text.chars().count() as i32 * Self::advance(Self::font_for(style))
    }

    fn space_width(&self, style: WordStyle) -> i32 {
        Self::advance(Self::font_for(style))
    }

    fn line_height(&self) -> i32 {
        self.line_height
    }

    fn ascender(&self, style: WordStyle) -> i32 {
        Self::font_for(style).baseline as i32
    }
}

impl FontBackend for MonoFontBackend {
    fn draw_word<D>(
        &self,
        display: &mut D,
        text: &str,
        style: WordStyle,
        origin: Point,
    ) -> Result<i32, D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let font = Self::font_for(style);
        Text::new(text, origin, MonoTextStyle::new(font, BinaryColor::On)).draw(display)?;
        Ok(self.text_width(text, style))
    }
}

/// embedded-graphics backend configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EgRenderConfig {
    /// Clear display before drawing page.
    pub clear_first: bool,
    /// Top-left corner of the content area on the display.
    pub origin: Point,
    /// Distance from baseline to the underline rule.
    pub underline_offset: i32,
}

impl Default for EgRenderConfig {
    fn default() -> Self {
        // 32px side margins and a 45px header on a 480x800 panel
        Self {
            clear_first: true,
            origin: Point::new(32, 45),
            underline_offset: 2,
        }
    }
}

/// Page renderer for embedded-graphics targets.
#[derive(Clone, Copy, Debug, Default)]
pub struct EgRenderer<B = MonoFontBackend> {
    cfg: EgRenderConfig,
    backend: B,
}

impl EgRenderer<MonoFontBackend> {
    /// Create renderer with config.
    pub fn new(cfg: EgRenderConfig) -> Self {
        Self {
            cfg,
            backend: MonoFontBackend::default(),
        }
    }
}

impl<B> EgRenderer<B>
where
    B: FontBackend,
{
    /// Create renderer with config and backend.
    pub fn with_backend(cfg: EgRenderConfig, backend: B) -> Self {
        Self { cfg, backend }
    }

    /// Font backend, also usable as layout metrics.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Render a page to a draw target.
    pub fn render_page<D>(&self, page: &Page, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        if self.cfg.clear_first {
            display.clear(BinaryColor::Off)?;
        }
        for placed in &page.lines {
            let left = self.cfg.origin.x + placed.x;
            let top = self.cfg.origin.y + placed.y;
            for word in &placed.line.words {
                self.draw_word(display, word, left, top)?;
            }
        }
        Ok(())
    }

    fn draw_word<D>(
        &self,
        display: &mut D,
        word: &PositionedWord,
        left: i32,
        top: i32,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let x = left + word.x;
        let baseline = top + self.backend.ascender(word.style);
        let advance = self
            .backend
            .draw_word(display, &word.text, word.style, Point::new(x, baseline))?;

        if word.style.is_underline() && advance > 0 {
            let y = baseline + self.cfg.underline_offset;
            Line::new(Point::new(x, y), Point::new(x + advance - 1, y))
                .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
                .draw(display)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_graphics::mock_display::MockDisplay;
    use mu_typeset::{BlockStyle, ChapterOptions, PageLine};
    use std::{cell::RefCell, rc::Rc};

    #[derive(Default)]
    struct PixelCaptureDisplay {
        size: Size,
        on_pixels: Vec<Point>,
    }

    impl PixelCaptureDisplay {
        fn with_size(width: u32, height: u32) -> Self {
            Self {
                size: Size::new(width, height),
                on_pixels: Vec::new(),
            }
        }
    }

    impl OriginDimensions for PixelCaptureDisplay {
        fn size(&self) -> Size {
            self.size
        }
    }

    impl DrawTarget for PixelCaptureDisplay {
        type Color = BinaryColor;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            for Pixel(point, color) in pixels {
                if color == BinaryColor::On {
                    self.on_pixels.push(point);
                }
            }
            Ok(())
        }
    }

    #[derive(Clone, Debug, Default)]
    struct BackendSpy {
        runs: Rc<RefCell<Vec<(String, WordStyle, Point)>>>,
    }

    impl FontMetrics for BackendSpy {
        fn text_width(&self, text: &str, _style: WordStyle) -> i32 {
            text.chars().count() as i32
        }

        fn space_width(&self, _style: WordStyle) -> i32 {
            1
        }

        fn line_height(&self) -> i32 {
            4
        }

        fn ascender(&self, _style: WordStyle) -> i32 {
            3
        }
    }

    impl FontBackend for BackendSpy {
        fn draw_word<D>(
            &self,
            _display: &mut D,
            text: &str,
            style: WordStyle,
            origin: Point,
        ) -> Result<i32, D::Error>
        where
            D: DrawTarget<Color = BinaryColor>,
        {
            self.runs
                .borrow_mut()
                .push((text.to_string(), style, origin));
            Ok(self.text_width(text, style))
        }
    }

    fn word(text: &str, style: WordStyle, x: i32) -> PositionedWord {
        PositionedWord {
            text: text.into(),
            style,
            x,
            attached: false,
        }
    }

    fn page(lines: Vec<(i32, i32, Vec<PositionedWord>)>) -> Page {
        let mut page = Page::new(1);
        for (x, y, words) in lines {
            page.lines.push(PageLine {
                line: mu_typeset::Line {
                    words,
                    style: BlockStyle::default(),
                },
                x,
                y,
            });
        }
        page
    }

    fn cfg_at_origin() -> EgRenderConfig {
        EgRenderConfig {
            clear_first: false,
            origin: Point::zero(),
            underline_offset: 2,
        }
    }

    #[test]
    fn mono_metrics_follow_font_per_style() {
        let backend = MonoFontBackend::default();
        assert_eq!(backend.text_width("abc", WordStyle::REGULAR), 24);
        assert_eq!(backend.text_width("abc", WordStyle::BOLD), 27);
        assert_eq!(backend.text_width("abc", WordStyle::ITALIC), 18);
        assert_eq!(
            backend.text_width("abc", WordStyle::BOLD | WordStyle::ITALIC),
            21
        );
        assert_eq!(backend.text_width("abc", WordStyle::UNDERLINE), 24);
        assert_eq!(backend.space_width(WordStyle::REGULAR), 8);
        assert_eq!(backend.line_height(), 20);
    }

    #[test]
    fn renders_word_without_error() {
        let mut display = MockDisplay::new();
        display.set_allow_overdraw(true);
        let renderer = EgRenderer::new(cfg_at_origin());
        let page = page(vec![(0, 0, vec![word("Hi", WordStyle::REGULAR, 0)])]);

        assert!(renderer.render_page(&page, &mut display).is_ok());
        assert!(display.affected_area().size.width > 0);
    }

    #[test]
    fn words_are_drawn_at_line_and_word_offsets() {
        let backend = BackendSpy::default();
        let runs = Rc::clone(&backend.runs);
        let cfg = EgRenderConfig {
            origin: Point::new(5, 7),
            ..cfg_at_origin()
        };
        let renderer = EgRenderer::with_backend(cfg, backend);
        let page = page(vec![
            (
                2,
                0,
                vec![
                    word("ab", WordStyle::REGULAR, 0),
                    word("cd", WordStyle::BOLD, 3),
                ],
            ),
            (0, 4, vec![word("ef", WordStyle::ITALIC, 1)]),
        ]);

        let mut display = PixelCaptureDisplay::with_size(64, 64);
        renderer.render_page(&page, &mut display).unwrap();

        assert_eq!(
            *runs.borrow(),
            vec![
                ("ab".to_string(), WordStyle::REGULAR, Point::new(7, 10)),
                ("cd".to_string(), WordStyle::BOLD, Point::new(10, 10)),
                ("ef".to_string(), WordStyle::ITALIC, Point::new(6, 14)),
            ]
        );
        assert!(display.on_pixels.is_empty());
    }

    #[test]
    fn underline_draws_rule_below_baseline() {
        let backend = BackendSpy::default();
        let renderer = EgRenderer::with_backend(cfg_at_origin(), backend);
        let page = page(vec![(0, 0, vec![word("abcd", WordStyle::UNDERLINE, 1)])]);

        let mut display = PixelCaptureDisplay::with_size(32, 32);
        renderer.render_page(&page, &mut display).unwrap();

        // baseline 3, rule 2px below, 4px long starting at x = 1
        let mut pixels = display.on_pixels.clone();
        pixels.sort_by_key(|p| p.x);
        assert_eq!(
            pixels,
            vec![
                Point::new(1, 5),
                Point::new(2, 5),
                Point::new(3, 5),
                Point::new(4, 5)
            ]
        );
    }

    #[test]
    fn paginated_chapter_renders_inside_content_area() {
        let backend = MonoFontBackend::default();
        let options = ChapterOptions {
            viewport_width: 200,
            viewport_height: 100,
            ..ChapterOptions::default()
        };
        let pages = mu_typeset::paginate_chapter(
            "<h1>Title</h1><p>Some <b>bold</b> and <i>italic</i> <u>text</u> that wraps \
             across a few lines of the page.</p>",
            &backend,
            options,
        )
        .unwrap();
        assert!(!pages.is_empty());

        let renderer = EgRenderer::new(EgRenderConfig {
            origin: Point::new(10, 10),
            ..EgRenderConfig::default()
        });
        for page in &pages {
            let mut display = PixelCaptureDisplay::with_size(220, 120);
            renderer.render_page(page, &mut display).unwrap();
            assert!(!display.on_pixels.is_empty());
            assert!(display
                .on_pixels
                .iter()
                .all(|p| p.x >= 10 && p.x < 210 && p.y >= 10 && p.y < 115));
        }
    }
}
