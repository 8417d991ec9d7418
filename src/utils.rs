//! Utility functions for displaying and converting words.
//!

use std::borrow::Cow;

use anyhow::Result;
use bytes::Bytes;

use crate::{Word, WordCount};

/// Read an entire [`Bytes`] slice into a [`String`].
///
/// Returns an error if the slice contains invalid UTF-8.
pub fn string_from_bytes(buf: Bytes) -> Result<String> {
    Ok(String::from_utf8(buf.as_ref().into())?)
}

/// Borrow a word as text for display. Invalid UTF-8 is replaced rather
/// than rejected.
#[inline]
pub fn word_to_str(word: &Word) -> Cow<'_, str> {
    String::from_utf8_lossy(word)
}

/// Renders a list of pairs the way the pipeline traces them, one
/// `(word, count)` per line.
pub fn format_counts<'a>(counts: impl IntoIterator<Item = &'a WordCount>) -> String {
    itertools::join(counts.into_iter().map(|wc| format!("  {wc}")), "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lossy_display_keeps_valid_words() {
        assert_eq!(word_to_str(&Bytes::from("gato")), "gato");
        assert_eq!(word_to_str(&Bytes::from_static(b"\xffa")), "\u{fffd}a");
    }

    #[test]
    fn formats_one_pair_per_line() {
        let counts = [WordCount::new("a", 3), WordCount::new("b", 1)];
        assert_eq!(format_counts(&counts), "  (a, 3)\n  (b, 1)");
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert!(string_from_bytes(Bytes::from_static(b"\xff")).is_err());
    }
}
