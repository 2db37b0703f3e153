//! Paragraph accumulator
//!
//! A [`TextBlock`] collects the words of one paragraph until the tokenizer
//! hands it to the layout engine, either at a block boundary or when the
//! flush policy fires. Layout drains words from the front, so a partially
//! laid-out block keeps only its unbroken tail.

extern crate alloc;

use alloc::collections::VecDeque;
use alloc::string::String;

use crate::style::{BlockStyle, WordStyle};

/// One renderable unit of text
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Word {
    /// Word text (no ASCII whitespace)
    pub text: String,
    /// Font style
    pub style: WordStyle,
    /// Joins the previous word with no gap
    pub continues: bool,
}

impl Word {
    /// Create a word that starts a new visual run
    pub fn new(text: impl Into<String>, style: WordStyle) -> Self {
        Self {
            text: text.into(),
            style,
            continues: false,
        }
    }

    /// Create a word that continues the previous word's run
    pub fn continuing(text: impl Into<String>, style: WordStyle) -> Self {
        Self {
            text: text.into(),
            style,
            continues: true,
        }
    }
}

/// Words of a paragraph plus its block style
#[derive(Clone, Debug, Default)]
pub struct TextBlock {
    words: VecDeque<Word>,
    style: BlockStyle,
    words_added: bool,
    indent_applied: bool,
    started: bool,
}

impl TextBlock {
    /// Create an empty block
    pub fn new(style: BlockStyle) -> Self {
        Self {
            words: VecDeque::new(),
            style,
            words_added: false,
            indent_applied: false,
            started: false,
        }
    }

    /// Append a word
    pub fn push(&mut self, word: Word) {
        self.words.push_back(word);
        self.words_added = true;
    }

    /// Append a word from its parts
    pub fn add_word(&mut self, text: impl Into<String>, style: WordStyle, continues: bool) {
        self.push(Word {
            text: text.into(),
            style,
            continues,
        });
    }

    /// Number of words not yet laid out
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Check if no words are pending
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// A block that never received a word.
    ///
    /// A block drained by a partial flush is empty but not pristine.
    pub fn is_pristine(&self) -> bool {
        !self.words_added
    }

    /// Paragraph style
    pub fn style(&self) -> &BlockStyle {
        &self.style
    }

    /// Replace the paragraph style
    pub fn set_style(&mut self, style: BlockStyle) {
        self.style = style;
    }

    /// Pending words, front first
    pub fn words(&self) -> &VecDeque<Word> {
        &self.words
    }

    pub(crate) fn words_mut(&mut self) -> &mut VecDeque<Word> {
        &mut self.words
    }

    /// Remove the next `n` words
    pub(crate) fn take_front(&mut self, n: usize) -> impl Iterator<Item = Word> + '_ {
        let n = n.min(self.words.len());
        self.words.drain(..n)
    }

    /// Whether the first-line indent was already prefixed
    pub fn indent_applied(&self) -> bool {
        self.indent_applied
    }

    pub(crate) fn mark_indent_applied(&mut self) {
        self.indent_applied = true;
    }

    /// Whether the block's top spacing was already placed on a page
    pub fn started(&self) -> bool {
        self.started
    }

    pub(crate) fn mark_started(&mut self) {
        self.started = true;
    }
}
