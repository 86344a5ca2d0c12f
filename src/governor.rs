//! Response size governor
//!
//! Every tool result passes through [`bound`] before it leaves the dispatch
//! surface. Lengths are counted in Unicode scalar values, never bytes.

/// Maximum characters returned by any tool
pub const CHARACTER_LIMIT: usize = 25_000;

const PAGINATED_NOTICE: &str = "\n\n[Response truncated at 25000 characters. Use filters or pagination to refine results.]";
const PLAIN_NOTICE: &str =
    "\n\n[Response truncated at 25000 characters. Original content was longer.]";

/// Cap `text` at [`CHARACTER_LIMIT`] characters
///
/// Text within the limit is returned unchanged. Otherwise the first
/// `CHARACTER_LIMIT` characters are kept and a fixed notice is appended; the
/// notice points at pagination when the producing operation is paginated.
pub fn bound(text: String, paginated: bool) -> String {
    match text.char_indices().nth(CHARACTER_LIMIT) {
        None => text,
        Some((cut, _)) => {
            let notice = if paginated { PAGINATED_NOTICE } else { PLAIN_NOTICE };
            let mut out = String::with_capacity(cut + notice.len());
            out.push_str(&text[..cut]);
            out.push_str(notice);
            out
        }
    }
}

/// First `max_chars` characters of `input`, with a flag telling whether
/// anything was cut
pub fn truncate_chars(input: &str, max_chars: usize) -> (&str, bool) {
    match input.char_indices().nth(max_chars) {
        Some((cut, _)) => (&input[..cut], true),
        None => (input, false),
    }
}

#[cfg(test)]
mod tests {
    use super::{CHARACTER_LIMIT, bound, truncate_chars};

    #[test]
    fn text_within_limit_is_unchanged() {
        let text = "a".repeat(CHARACTER_LIMIT);
        assert_eq!(bound(text.clone(), true), text);
        assert_eq!(bound(String::new(), false), "");
    }

    #[test]
    fn oversized_paginated_text_points_at_pagination() {
        let out = bound("x".repeat(CHARACTER_LIMIT + 10), true);
        assert!(out.starts_with(&"x".repeat(CHARACTER_LIMIT)));
        assert!(out.ends_with(
            "\n\n[Response truncated at 25000 characters. Use filters or pagination to refine results.]"
        ));
        assert_eq!(out.chars().filter(|c| *c == 'x').count(), CHARACTER_LIMIT);
    }

    #[test]
    fn oversized_plain_text_uses_generic_notice() {
        let out = bound("y".repeat(40_000), false);
        assert!(out.ends_with("[Response truncated at 25000 characters. Original content was longer.]"));
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "é".repeat(CHARACTER_LIMIT);
        assert_eq!(bound(text.clone(), false), text);

        let over = "日".repeat(CHARACTER_LIMIT + 1);
        let out = bound(over, false);
        assert_eq!(out.chars().take_while(|c| *c == '日').count(), CHARACTER_LIMIT);
    }

    #[test]
    fn truncation_is_deterministic() {
        let text = "ab".repeat(20_000);
        assert_eq!(bound(text.clone(), true), bound(text, true));
    }

    #[test]
    fn within_limit_output_is_a_fixed_point() {
        let once = bound("short".to_owned(), true);
        assert_eq!(bound(once.clone(), true), once);
    }

    #[test]
    fn truncate_chars_reports_cut() {
        assert_eq!(truncate_chars("hello", 10), ("hello", false));
        assert_eq!(truncate_chars("héllo", 2), ("hé", true));
    }
}
