use fnv::FnvHashMap;

use crate::{Word, WordCount};

/// A growable word -> count mapping that remembers the order in which
/// words were first inserted.
///
/// Entries live in a `Vec` in first-seen order; an FNV index maps each word
/// to its position, so lookups stay O(1) however large the vocabulary gets.
#[derive(Clone, Default, Debug)]
pub struct FrequencyTable {
    entries: Vec<WordCount>,
    index: FnvHashMap<Word, usize>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` to `word`, inserting it at the end if it was not yet
    /// present.
    pub fn add(&mut self, word: &Word, count: u64) {
        match self.index.get(word) {
            Some(&pos) => self.entries[pos].count += count,
            None => {
                self.index.insert(word.clone(), self.entries.len());
                self.entries.push(WordCount {
                    word: word.clone(),
                    count,
                });
            }
        }
    }

    /// Records one more occurrence of `word`.
    #[inline]
    pub fn increment(&mut self, word: &Word) {
        self.add(word, 1)
    }

    pub fn get(&self, word: &[u8]) -> Option<u64> {
        self.index.get(word).map(|&pos| self.entries[pos].count)
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|wc| wc.count).sum()
    }

    /// Iterates over the entries in first-seen order.
    pub fn iter(&self) -> std::slice::Iter<'_, WordCount> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[WordCount] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<WordCount> {
        self.entries
    }
}

impl PartialEq for FrequencyTable {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for FrequencyTable {}

impl<'a> IntoIterator for &'a FrequencyTable {
    type Item = &'a WordCount;
    type IntoIter = std::slice::Iter<'a, WordCount>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
