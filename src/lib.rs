//! A local, multi-threaded MapReduce (lite) word counter.
//!
//! A corpus of words is split into contiguous chunks that are counted in
//! parallel by mappers. A single-threaded shuffle merges the local counts
//! and hands every distinct word to exactly one reducer, and the reducers
//! then finalize their partitions in parallel. See [`engine`] for the phases.

use std::fmt;

use bytes::Bytes;

pub mod config;
pub mod engine;
pub mod error;
pub mod standalone;
pub mod utils;
pub mod workload;

pub use config::PipelineConfig;
pub use engine::{sequential_count, Pipeline, PipelineOutput};
pub use error::PipelineError;

/////////////////////////////////////////////////////////////////////////////
// MapReduce application types
/////////////////////////////////////////////////////////////////////////////

/// A single word of the corpus.
///
/// Words are opaque keys: two words are the same word only if their bytes
/// are identical. No case folding or other normalization takes place.
pub type Word = Bytes;

/// A tokenize function turns raw input text into the words of a corpus,
/// in the order they occur.
pub type TokenizeFn = fn(text: &str) -> Vec<Word>;

/// A reduce function takes in a word and an iterator over the counts a
/// reducer received for that word. It returns an [`anyhow::Result`]
/// containing the finalized count.
///
/// The function must be associative over its inputs, since the shuffle
/// has already summed every mapper's counts by the time a reducer runs.
pub type ReduceFn =
    fn(word: &Word, counts: Box<dyn Iterator<Item = u64> + '_>) -> anyhow::Result<u64>;

/// A word count application.
#[derive(Copy, Clone)]
pub struct Workload {
    pub tokenize_fn: TokenizeFn,
    pub reduce_fn: ReduceFn,
}

impl Default for Workload {
    fn default() -> Self {
        Workload {
            tokenize_fn: workload::wc::tokenize,
            reduce_fn: workload::wc::reduce,
        }
    }
}

impl fmt::Debug for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workload").finish_non_exhaustive()
    }
}

/////////////////////////////////////////////////////////////////////////////
// Word counts
/////////////////////////////////////////////////////////////////////////////

/// A word together with the number of times it was seen.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct WordCount {
    /// The word.
    pub word: Word,
    /// How often the word occurred. Always at least 1.
    pub count: u64,
}

impl WordCount {
    /// Construct a new pair from the given word and count.
    pub fn new(word: impl Into<Word>, count: u64) -> Self {
        Self {
            word: word.into(),
            count,
        }
    }

    /// Get the word of this pair.
    ///
    /// This method is cheap, since [`Bytes`] are cheaply cloneable.
    #[inline]
    pub fn word(&self) -> Word {
        self.word.clone()
    }
}

impl fmt::Display for WordCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", utils::word_to_str(&self.word), self.count)
    }
}

/// Builds a corpus out of anything that converts into words.
///
/// ```
/// let corpus = mrl_wordcount::corpus_from(["a", "b", "a"]);
/// assert_eq!(corpus.len(), 3);
/// ```
pub fn corpus_from<I, S>(words: I) -> Vec<Word>
where
    I: IntoIterator<Item = S>,
    S: Into<Word>,
{
    words.into_iter().map(Into::into).collect()
}

/// Counts the words of `corpus` with the MapReduce pipeline, using the
/// default word count workload.
///
/// ```
/// use mrl_wordcount::{corpus_from, count_words, PipelineConfig};
///
/// let corpus = corpus_from(["a", "b", "a", "c", "b", "a"]);
/// let output = count_words(&corpus, PipelineConfig::new(2, 2)).unwrap();
/// assert_eq!(output.total(), 6);
/// assert_eq!(output.get(b"a"), Some(3));
/// ```
pub fn count_words(corpus: &[Word], config: PipelineConfig) -> Result<PipelineOutput, PipelineError> {
    Pipeline::new(config)?.run(corpus)
}
