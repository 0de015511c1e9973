//! Terminal display width for a single grapheme cluster (EGC).
//!
//! Per the Non-goals of this engine, full Unicode script handling is out of
//! scope; width accounting is limited to the common case of ASCII/narrow
//! glyphs (1 cell), CJK/fullwidth glyphs (2 cells), and a conservative
//! widening for sequences that visibly carry an emoji presentation signal
//! (extended pictographic codepoints, regional indicators). Combining marks
//! contribute no width of their own.

const ZWJ: char = '\u{200D}';

fn is_regional_indicator(c: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&c)
}

fn is_extended_pictographic(c: char) -> bool {
    ('\u{1F300}'..='\u{1FAFF}').contains(&c) || ('\u{2600}'..='\u{27BF}').contains(&c)
}

fn is_combining_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036F}').contains(&c)
        || ('\u{1AB0}'..='\u{1AFF}').contains(&c)
        || ('\u{20D0}'..='\u{20FF}').contains(&c)
}

/// Display width in terminal cells of a single grapheme cluster.
///
/// Precondition: `egc` is a single grapheme cluster (callers segment first).
pub fn egc_width(egc: &str) -> u16 {
    if egc.is_empty() {
        return 0;
    }
    let mut saw_wide_signal = false;
    let mut base_width: Option<u16> = None;
    for c in egc.chars() {
        if is_combining_mark(c) || c == ZWJ {
            continue;
        }
        if is_extended_pictographic(c) || is_regional_indicator(c) {
            saw_wide_signal = true;
        }
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(1) as u16;
        base_width = Some(base_width.map_or(w, |acc| acc.max(w)));
    }
    let width = base_width.unwrap_or(1);
    if saw_wide_signal { width.max(2) } else { width }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii() {
        assert_eq!(egc_width("a"), 1);
    }

    #[test]
    fn wide_cjk() {
        assert_eq!(egc_width("界"), 2);
    }

    #[test]
    fn emoji_basic() {
        assert_eq!(egc_width("😀"), 2);
    }

    #[test]
    fn combining_acute_no_extra_width() {
        assert_eq!(egc_width("e\u{0301}"), 1);
    }

    #[test]
    fn flag_sequence() {
        assert_eq!(egc_width("🇺🇸"), 2);
    }

    #[test]
    fn zwj_family_sequence() {
        assert_eq!(egc_width("👨‍👩‍👧‍👦"), 2);
    }
}
