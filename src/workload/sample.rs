//! The built-in demo corpus.

use crate::{corpus_from, Word};

/// 56 words over a six-word vocabulary.
pub const SAMPLE_CORPUS: [&str; 56] = [
    "gato", "perro", "gato", "casa", "perro", "arbol", "gato", "casa",
    "perro", "sol", "luna", "gato", "perro", "casa", "arbol", "sol",
    "gato", "perro", "luna", "casa", "gato", "arbol", "perro", "sol",
    "casa", "gato", "perro", "luna", "arbol", "gato", "casa", "sol",
    "perro", "gato", "casa", "arbol", "perro", "sol", "gato", "luna",
    "casa", "perro", "gato", "arbol", "sol", "perro", "gato", "casa",
    "luna", "perro", "gato", "casa", "arbol", "sol", "gato", "perro",
];

pub fn sample_corpus() -> Vec<Word> {
    corpus_from(SAMPLE_CORPUS)
}
