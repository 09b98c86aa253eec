use crate::lemma::morphology::Morphology;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Turns raw text into lemmas
///
/// Lemmatization is a pure function of the text and the loaded model, so a
/// single `Lemmatizer` can be shared behind an `Arc` by every crawl task and
/// the search engine without further locking.
#[derive(Clone)]
pub struct Lemmatizer {
    morphology: Arc<dyn Morphology>,
}

impl Lemmatizer {
    pub fn new<M: Morphology + 'static>(morphology: M) -> Self {
        Self {
            morphology: Arc::new(morphology),
        }
    }

    /// Splits text into lowercase Cyrillic words
    ///
    /// Every character outside `а-яё` and whitespace becomes a space before
    /// splitting, so punctuation, digits and Latin words disappear.
    pub fn words(text: &str) -> Vec<String> {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .map(|c| {
                if is_russian_letter(c) || c.is_whitespace() {
                    c
                } else {
                    ' '
                }
            })
            .collect();

        cleaned.split_whitespace().map(str::to_string).collect()
    }

    /// Counts lemma occurrences in a text
    ///
    /// Function words and words the morphology cannot read are skipped.
    pub fn analyze(&self, text: &str) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for word in Self::words(text) {
            if let Some(lemma) = self.lemma_of(&word) {
                *counts.entry(lemma).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Returns the distinct lemmas of a text
    pub fn lemma_set(&self, text: &str) -> HashSet<String> {
        Self::words(text)
            .iter()
            .filter_map(|word| self.lemma_of(word))
            .collect()
    }

    /// Returns true if any reading of the word is a conjunction, preposition
    /// or interjection
    pub fn is_function_word(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        self.morphology
            .forms(&word)
            .iter()
            .any(|form| form.part_of_speech.is_function_word())
    }

    /// Primary lemma of a single lowercase word
    fn lemma_of(&self, word: &str) -> Option<String> {
        let forms = self.morphology.forms(word);
        if forms.iter().any(|form| form.part_of_speech.is_function_word()) {
            return None;
        }
        forms
            .into_iter()
            .next()
            .map(|form| form.normal_form)
            .filter(|lemma| !lemma.is_empty())
    }
}

fn is_russian_letter(c: char) -> bool {
    matches!(c, 'а'..='я' | 'ё')
}
