//! A MapReduce-compatible implementation of word count.
//!

use anyhow::Result;

use crate::Word;

/// Splits on whitespace. Tokens are kept exactly as written.
pub fn tokenize(text: &str) -> Vec<Word> {
    text.split_whitespace()
        .map(|word| Word::copy_from_slice(word.as_bytes()))
        .collect()
}

/// Keeps maximal runs of alphanumeric characters, dropping punctuation.
/// Case is preserved.
pub fn tokenize_alphanumeric(text: &str) -> Vec<Word> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|word| Word::copy_from_slice(word.as_bytes()))
        .collect()
}

pub fn reduce(_word: &Word, counts: Box<dyn Iterator<Item = u64> + '_>) -> Result<u64> {
    Ok(counts.sum())
}
