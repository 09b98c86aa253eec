//! Lemmatization of Russian text
//!
//! This module turns page and query text into lemmas (dictionary base
//! forms), which are the keys of the inverted index.
//!
//! # Components
//!
//! - `Morphology`: read-only model mapping a word to its readings
//! - `RussianMorphology`: dictionary file + function word table + stemmer
//! - `Lemmatizer`: text preprocessing, `analyze` and `lemma_set`

mod lemmatizer;
mod morphology;

pub use lemmatizer::Lemmatizer;
pub use morphology::{Morphology, MorphologyError, PartOfSpeech, RussianMorphology, WordForm};
