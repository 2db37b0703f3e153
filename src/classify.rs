//! Codepoint classification for word segmentation and gap handling
//!
//! Pure functions over bytes and codepoints. The tokenizer uses the
//! *split* set to cut CJK text into one word per character; the layout engine
//! uses the *layout* set together with the spacing set to decide whether a
//! word takes part in inter-word spacing.

/// Ideographic space, treated as a word boundary but never buffered.
pub const IDEOGRAPHIC_SPACE: char = '\u{3000}';

/// Em space, used for the two-character paragraph indent.
pub const EM_SPACE: char = '\u{2003}';

/// ASCII whitespace that acts as a hard word boundary.
///
/// Only space, tab, CR and LF count; non-breaking spaces stay inside words.
pub fn is_word_boundary_byte(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

/// Length of a UTF-8 sequence from its lead byte.
///
/// Continuation bytes and invalid lead bytes report 1 so a decoder always
/// makes progress.
pub fn utf8_sequence_len(lead: u8) -> usize {
    if lead & 0x80 == 0 {
        1
    } else if lead & 0xE0 == 0xC0 {
        2
    } else if lead & 0xF0 == 0xE0 {
        3
    } else if lead & 0xF8 == 0xF0 {
        4
    } else {
        1
    }
}

/// Decode exactly one codepoint from `bytes`.
///
/// Returns `None` when the bytes are not a single valid UTF-8 sequence.
pub fn decode_codepoint(bytes: &[u8]) -> Option<char> {
    let s = core::str::from_utf8(bytes).ok()?;
    let mut chars = s.chars();
    let ch = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    Some(ch)
}

/// Zero-width and formatting codepoints that fonts cannot render.
pub fn is_invisible(ch: char) -> bool {
    matches!(
        ch as u32,
        0xFEFF
            | 0x200B..=0x200F
            | 0x2060
            | 0x00AD
            | 0x034F
            | 0x061C
            | 0x2066..=0x2069
            | 0x202A..=0x202E
    )
}

/// CJK codepoints that become single-character words during tokenization.
///
/// Covers unified ideographs and extension A, CJK symbols and punctuation,
/// hiragana, katakana, compatibility ideographs and fullwidth forms.
pub fn is_cjk_split(ch: char) -> bool {
    matches!(
        ch as u32,
        0x4E00..=0x9FFF
            | 0x3400..=0x4DBF
            | 0x3000..=0x303F
            | 0x3040..=0x309F
            | 0x30A0..=0x30FF
            | 0xF900..=0xFAFF
            | 0xFF00..=0xFFEF
    )
}

/// CJK codepoints for layout classification.
///
/// The split set plus General Punctuation, so a standalone dash, ellipsis,
/// curly quote or bullet sits flush against its neighbours.
pub fn is_cjk_layout(ch: char) -> bool {
    is_cjk_split(ch) || matches!(ch as u32, 0x2000..=0x206F)
}

/// Spacing codepoints ignored when classifying a word for layout.
pub fn is_cjk_spacing(ch: char) -> bool {
    matches!(ch as u32, 0x20 | 0x2000..=0x200B | 0x3000)
}

/// Whether a word takes no inter-word space in layout.
///
/// A word is CJK when it holds at least one CJK codepoint and no other
/// visible codepoint. A non-empty word made only of spacing codepoints also
/// counts.
pub fn is_cjk_word(word: &str) -> bool {
    let mut has_cjk = false;
    let mut has_other = false;
    let mut spacing_only = true;

    for ch in word.chars() {
        if is_cjk_spacing(ch) {
            continue;
        }
        spacing_only = false;
        if is_cjk_layout(ch) {
            has_cjk = true;
        } else {
            has_other = true;
        }
    }

    (has_cjk && !has_other) || (spacing_only && !word.is_empty())
}

/// Whether `cjk_words` out of `total` reach `percent` percent.
pub fn is_cjk_paragraph(cjk_words: usize, total: usize, percent: u8) -> bool {
    if total == 0 {
        return false;
    }
    cjk_words * 100 >= total * percent as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_sequence_len() {
        assert_eq!(utf8_sequence_len(b'a'), 1);
        assert_eq!(utf8_sequence_len(0xC3), 2);
        assert_eq!(utf8_sequence_len(0xE4), 3);
        assert_eq!(utf8_sequence_len(0xF0), 4);
        // continuation byte
        assert_eq!(utf8_sequence_len(0x80), 1);
        assert_eq!(utf8_sequence_len(0xFF), 1);
    }

    #[test]
    fn test_decode_codepoint() {
        assert_eq!(decode_codepoint(b"a"), Some('a'));
        assert_eq!(decode_codepoint("中".as_bytes()), Some('中'));
        assert_eq!(decode_codepoint(&[0xE4, 0xB8]), None);
        assert_eq!(decode_codepoint(b"ab"), None);
        assert_eq!(decode_codepoint(b""), None);
    }

    #[test]
    fn test_invisible_set() {
        for ch in ['\u{FEFF}', '\u{200B}', '\u{200D}', '\u{00AD}', '\u{2067}', '\u{202C}'] {
            assert!(is_invisible(ch), "{:?}", ch);
        }
        assert!(!is_invisible('a'));
        assert!(!is_invisible('\u{00A0}'));
        assert!(!is_invisible(IDEOGRAPHIC_SPACE));
    }

    #[test]
    fn test_cjk_split_ranges() {
        for ch in ['中', '㐀', '。', 'あ', 'カ', '豈', '！'] {
            assert!(is_cjk_split(ch), "{:?}", ch);
        }
        assert!(!is_cjk_split('a'));
        assert!(!is_cjk_split('é'));
        assert!(!is_cjk_split('\u{201C}'));
    }

    #[test]
    fn test_cjk_word_classification() {
        assert!(is_cjk_word("中"));
        assert!(is_cjk_word("\u{2003}\u{2003}中"));
        assert!(!is_cjk_word("中a"));
        assert!(!is_cjk_word("hello"));
        assert!(!is_cjk_word("\u{2003}\u{2003}hello"));
        assert!(is_cjk_word("\u{3000}"));
        assert!(!is_cjk_word(""));
    }

    #[test]
    fn test_general_punctuation_is_cjk_for_layout() {
        for ch in ['\u{2014}', '\u{2026}', '\u{201C}', '\u{2022}', '中'] {
            assert!(is_cjk_layout(ch), "{:?}", ch);
        }
        assert!(!is_cjk_layout('a'));
        assert!(!is_cjk_layout('\u{1F600}'));
        assert!(is_cjk_word("\u{2014}"));
        assert!(is_cjk_word("\u{2026}"));
        assert!(!is_cjk_word("\u{201C}Hi\u{201D}"));
    }

    #[test]
    fn test_cjk_paragraph_threshold() {
        assert!(is_cjk_paragraph(6, 10, 60));
        assert!(!is_cjk_paragraph(5, 10, 60));
        assert!(!is_cjk_paragraph(0, 0, 60));
        assert!(is_cjk_paragraph(3, 3, 60));
    }
}
