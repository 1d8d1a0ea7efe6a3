//! Slug normalization for output filenames.
//!
//! Every converted file is named after its source stem run through
//! [`slugify`]. The transform has to stay byte-for-byte stable: libraries
//! converted by earlier releases are re-run against their own output, and a
//! changed slug would produce a second copy of every image instead of being
//! recognized as "already converted".
//!
//! ## Steps
//!
//! 1. Lowercase.
//! 2. Canonical decomposition (NFD), then drop combining diacritical marks
//!    (`U+0300..=U+036F`), so `é` becomes `e`.
//! 3. Drop everything that is not `a-z`, `0-9`, whitespace or `-`, then trim
//!    surrounding whitespace.
//! 4. Collapse each run of whitespace and/or hyphens into a single `-`.
//!
//! Examples:
//! - `"Café Déjà-vu!"` → `"cafe-deja-vu"`
//! - `"IMG_2041 (copy)"` → `"img2041-copy"`
//! - `"   ---   "` → `""`

use unicode_normalization::UnicodeNormalization;

/// Combining Diacritical Marks block.
const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036F}';

/// Whitespace as ECMAScript `\s` and `String.prototype.trim` define it.
///
/// Differs from [`char::is_whitespace`]: U+FEFF counts, U+0085 does not.
fn is_separator_space(c: char) -> bool {
    matches!(
        c,
        '\t'..='\r'
            | ' '
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// Convert free text into a lowercase, accent-free, dash-separated token.
///
/// Total and pure. May return an empty string (empty input, or input made
/// only of punctuation); callers decide what an empty slug means.
pub fn slugify(input: &str) -> String {
    let kept: String = input
        .to_lowercase()
        .nfd()
        .filter(|c| !COMBINING_MARKS.contains(c))
        .filter(|&c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || is_separator_space(c) || c == '-'
        })
        .collect();

    let mut slug = String::with_capacity(kept.len());
    let mut in_separator = false;
    for c in kept.trim_matches(is_separator_space).chars() {
        if is_separator_space(c) || c == '-' {
            if !in_separator {
                slug.push('-');
                in_separator = true;
            }
        } else {
            slug.push(c);
            in_separator = false;
        }
    }

    // A lone separator carries no name.
    if slug == "-" {
        slug.clear();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_accents_and_punctuation() {
        assert_eq!(slugify("Café Déjà-vu!"), "cafe-deja-vu");
    }

    #[test]
    fn empty_input() {
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn only_separators_is_empty() {
        assert_eq!(slugify("   ---   "), "");
        assert_eq!(slugify("-"), "");
        assert_eq!(slugify(" - \t - "), "");
    }

    #[test]
    fn only_punctuation_is_empty() {
        assert_eq!(slugify("!!!???"), "");
        assert_eq!(slugify("日本語"), "");
    }

    #[test]
    fn lowercases() {
        assert_eq!(slugify("PHOTO"), "photo");
        assert_eq!(slugify("Photo2024"), "photo2024");
    }

    #[test]
    fn underscores_and_dots_are_dropped_not_separators() {
        assert_eq!(slugify("IMG_2041"), "img2041");
        assert_eq!(slugify("my.holiday.pic"), "myholidaypic");
    }

    #[test]
    fn brackets_removed_space_kept_as_dash() {
        assert_eq!(slugify("IMG_2041 (copy)"), "img2041-copy");
    }

    #[test]
    fn collapses_mixed_separator_runs() {
        assert_eq!(slugify("a - - b"), "a-b");
        assert_eq!(slugify("a\t\n b"), "a-b");
        assert_eq!(slugify("a---b"), "a-b");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(slugify("  hello world  "), "hello-world");
    }

    #[test]
    fn keeps_edge_hyphens_next_to_content() {
        assert_eq!(slugify("-a-"), "-a-");
        assert_eq!(slugify("--draft"), "-draft");
    }

    #[test]
    fn punctuation_removal_can_expose_whitespace_edges() {
        // "!" is removed before trimming, so the space before it is trimmed too.
        assert_eq!(slugify("sunset !"), "sunset");
    }

    #[test]
    fn decomposes_precomposed_letters() {
        assert_eq!(slugify("Ærøskøbing Ñandú"), "rskbing-nandu");
        assert_eq!(slugify("Crème Brûlée"), "creme-brulee");
        assert_eq!(slugify("Ångström"), "angstrom");
    }

    #[test]
    fn already_decomposed_input() {
        assert_eq!(slugify("e\u{0301}te\u{0301}"), "ete");
    }

    #[test]
    fn unicode_whitespace_is_a_separator() {
        assert_eq!(slugify("a\u{00A0}b"), "a-b");
    }

    #[test]
    fn byte_order_mark_is_whitespace() {
        assert_eq!(slugify("a\u{FEFF}b"), "a-b");
        assert_eq!(slugify("\u{FEFF}photo\u{FEFF}"), "photo");
    }

    #[test]
    fn next_line_control_is_not_whitespace() {
        assert_eq!(slugify("a\u{0085}b"), "ab");
    }

    #[test]
    fn idempotent() {
        let inputs = [
            "",
            "   ---   ",
            "Café Déjà-vu!",
            "-a-",
            "IMG_2041 (copy)",
            "  Über  --  Größe  ",
            "x",
            "日本語 photo",
            "--",
        ];
        for input in inputs {
            let once = slugify(input);
            assert_eq!(slugify(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn output_alphabet() {
        let slug = slugify("Ünïcödé — “quotes” & ‘more’ 123");
        assert!(
            slug.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
            "unexpected characters in {slug:?}"
        );
        assert!(!slug.contains("--"));
    }
}
