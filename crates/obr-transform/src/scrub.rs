//! Text normalization applied to every extracted value.

use std::borrow::Cow;

/// Collapses whitespace runs to single spaces, trims, and lower-cases.
pub fn scrub(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for word in value.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out.to_lowercase()
}

/// Scrubs raw bytes, decoding them as UTF-8 first.
///
/// Invalid sequences become U+FFFD.
pub fn scrub_bytes(value: &[u8]) -> String {
    let text: Cow<'_, str> = String::from_utf8_lossy(value);
    scrub(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scrub_collapses_and_lowercases() {
        assert_eq!(scrub("  Acme   Widgets\tLTD \n"), "acme widgets ltd");
        assert_eq!(scrub("123 Main St,\r\n Springfield"), "123 main st, springfield");
    }

    #[test]
    fn test_scrub_empty_and_blank() {
        assert_eq!(scrub(""), "");
        assert_eq!(scrub(" \t\u{a0} "), "");
    }

    #[test]
    fn test_scrub_non_ascii() {
        assert_eq!(scrub("CAFÉ  DU  MONDE"), "café du monde");
    }

    #[test]
    fn test_scrub_bytes() {
        assert_eq!(scrub_bytes(b"  ACME\n"), "acme");
        assert_eq!(scrub_bytes(b"Caf\xE9"), "caf\u{fffd}");
    }

    proptest! {
        #[test]
        fn scrub_is_idempotent(value in "[ \t\n\u{a0}\\PC]{0,40}") {
            let once = scrub(&value);
            prop_assert_eq!(scrub(&once), once.clone());
        }

        #[test]
        fn scrubbed_text_has_no_edge_or_double_spaces(value in "[ \t\na-zA-Z]{0,40}") {
            let out = scrub(&value);
            prop_assert!(!out.starts_with(' ') && !out.ends_with(' '));
            prop_assert!(!out.contains("  "));
        }
    }
}
