//! mu-typeset -- Memory-bounded chapter typesetting for e-readers
//!
//! Converts an XHTML chapter into fixed-size pages of positioned, styled
//! words, streaming all the way: markup is consumed event by event, words
//! accumulate per paragraph, and paragraphs are broken into lines (minimum
//! badness, CJK-aware, justified) and stacked onto pages as soon as they end
//! or the heap runs low.
//!
//! # Features
//!
//! - `std` (default) -- quick-xml driver (`parse_reader`, `paginate_chapter`)
//! - `cli` -- the `mu-typeset` debugging binary
//!
//! Without `std` the crate only needs `alloc`; drive
//! [`ChapterParser`] from your own markup events.
//!
//! # Example
//!
//! ```
//! # #[cfg(feature = "std")] {
//! use mu_typeset::{paginate_chapter, ChapterOptions, MonospaceMetrics};
//!
//! let metrics = MonospaceMetrics::new(10, 20);
//! let pages = paginate_chapter("<p>Hello <b>world</b></p>", &metrics, ChapterOptions::default())
//!     .unwrap();
//! assert_eq!(pages.len(), 1);
//! assert_eq!(pages[0].line_texts(), vec!["Hello world"]);
//! # }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![deny(clippy::large_enum_variant, clippy::large_stack_arrays, clippy::redundant_clone)]
#![warn(
    clippy::box_collection,
    clippy::needless_collect,
    clippy::map_clone,
    clippy::implicit_clone,
    clippy::inefficient_to_string
)]

extern crate alloc;

pub mod classify;
pub mod css;
pub mod error;
pub mod layout;
pub mod page;
pub mod streaming;
pub mod style;
pub mod text_block;
pub mod tokenizer;

// Re-export key types for convenience
pub use css::{parse_inline_style, parse_stylesheet, CssStyle, StyleResolver, Stylesheet, TextAlign};
pub use error::TypesetError;
pub use layout::{FontMetrics, LayoutEngine, Line, MonospaceMetrics, PositionedWord};
pub use page::{Page, PageAssembler, PageLine};
pub use streaming::{
    FlushPolicy, FlushReason, MemoryOracle, SimulatedHeap, StreamingStats, Unbounded,
};
pub use style::{BlockStyle, StyleFrame, WordStyle};
pub use text_block::{TextBlock, Word};
pub use tokenizer::{ChapterOptions, ChapterParser, Placeholders};
#[cfg(feature = "std")]
pub use tokenizer::{paginate_chapter, paginate_chapter_with_styles};
