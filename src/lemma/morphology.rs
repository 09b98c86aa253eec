//! Morphology model for Russian words
//!
//! A [`Morphology`] maps a lowercase word to its possible base forms. The
//! reference model combines an optional dictionary file, a built-in table of
//! function words, and a Snowball stemmer for everything else.

use crate::config::MorphologyConfig;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while loading a morphology dictionary
#[derive(Debug, Error)]
pub enum MorphologyError {
    #[error("Failed to read dictionary {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed dictionary entry at line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Grammatical part of speech, following the OpenCorpora tag set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartOfSpeech {
    Noun,
    Adjective,
    ShortAdjective,
    Comparative,
    Verb,
    Infinitive,
    Participle,
    ShortParticiple,
    Gerund,
    Numeral,
    Adverb,
    Pronoun,
    Predicative,
    Preposition,
    Conjunction,
    Particle,
    Interjection,
    /// Produced by the stemmer fallback, which knows nothing about grammar
    Unknown,
}

impl PartOfSpeech {
    /// Parses an OpenCorpora part-of-speech tag such as `NOUN` or `PREP`
    pub fn from_tag(tag: &str) -> Option<Self> {
        let pos = match tag {
            "NOUN" => Self::Noun,
            "ADJF" => Self::Adjective,
            "ADJS" => Self::ShortAdjective,
            "COMP" => Self::Comparative,
            "VERB" => Self::Verb,
            "INFN" => Self::Infinitive,
            "PRTF" => Self::Participle,
            "PRTS" => Self::ShortParticiple,
            "GRND" => Self::Gerund,
            "NUMR" => Self::Numeral,
            "ADVB" => Self::Adverb,
            "NPRO" => Self::Pronoun,
            "PRED" => Self::Predicative,
            "PREP" => Self::Preposition,
            "CONJ" => Self::Conjunction,
            "PRCL" => Self::Particle,
            "INTJ" => Self::Interjection,
            _ => return None,
        };
        Some(pos)
    }

    /// Returns true for the parts of speech that are never indexed
    pub fn is_function_word(&self) -> bool {
        matches!(
            self,
            Self::Conjunction | Self::Preposition | Self::Interjection
        )
    }
}

/// One morphological reading of a word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordForm {
    pub normal_form: String,
    pub part_of_speech: PartOfSpeech,
}

impl WordForm {
    pub fn new(normal_form: impl Into<String>, part_of_speech: PartOfSpeech) -> Self {
        Self {
            normal_form: normal_form.into(),
            part_of_speech,
        }
    }
}

/// A read-only morphology model
///
/// Implementations must be safe to query from many tasks at once.
pub trait Morphology: Send + Sync {
    /// Returns every known reading of a lowercase word
    ///
    /// The first entry is the primary reading. An empty vector means the
    /// word is unknown.
    fn forms(&self, word: &str) -> Vec<WordForm>;
}

const PREPOSITIONS: &[&str] = &[
    "без", "безо", "в", "вместо", "вне", "внутри", "во", "возле", "вокруг", "вдоль", "для",
    "до", "за", "из", "изо", "к", "ко", "кроме", "между", "мимо", "на", "над", "надо", "о",
    "об", "обо", "около", "от", "ото", "перед", "передо", "по", "под", "подо", "после", "при",
    "про", "против", "ради", "с", "сквозь", "со", "среди", "у", "через",
];

const CONJUNCTIONS: &[&str] = &[
    "а", "будто", "да", "если", "зато", "и", "ибо", "или", "либо", "но", "однако", "пока",
    "причем", "причём", "словно", "также", "тоже", "хотя", "чтобы", "что", "чем",
];

const INTERJECTIONS: &[&str] = &[
    "ага", "ай", "ах", "ого", "ой", "ох", "тьфу", "увы", "ура", "ух", "фу", "эй", "эх",
];

/// Dictionary-backed Russian morphology with a stemmer fallback
pub struct RussianMorphology {
    dictionary: HashMap<String, Vec<WordForm>>,
    function_words: HashMap<&'static str, PartOfSpeech>,
    stemmer: Option<Stemmer>,
}

impl RussianMorphology {
    /// Creates a model with only the built-in function word table
    ///
    /// Every other word is reduced with the Snowball Russian stemmer, so the
    /// lemma stored for it is a stem rather than a dictionary base form:
    /// "кошки" and "кошка" are both indexed as "кошк". Queries go through
    /// the same model and reach the same stem. Load a dictionary with
    /// [`RussianMorphology::load`] to store real base forms.
    pub fn builtin() -> Self {
        let mut function_words = HashMap::new();
        for (words, pos) in [
            (PREPOSITIONS, PartOfSpeech::Preposition),
            (CONJUNCTIONS, PartOfSpeech::Conjunction),
            (INTERJECTIONS, PartOfSpeech::Interjection),
        ] {
            for word in words {
                function_words.insert(*word, pos);
            }
        }

        Self {
            dictionary: HashMap::new(),
            function_words,
            stemmer: Some(Stemmer::create(Algorithm::Russian)),
        }
    }

    /// Creates a model from `(form, normal_form, part_of_speech)` entries
    ///
    /// Several entries for one form keep their order; the first becomes the
    /// primary reading.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, S, PartOfSpeech)>,
        S: AsRef<str>,
    {
        let mut model = Self::builtin();
        for (form, normal, pos) in entries {
            model.add_entry(form.as_ref(), normal.as_ref(), pos);
        }
        model
    }

    /// Loads a tab-separated dictionary file
    ///
    /// Each non-blank line that does not start with `#` holds
    /// `form<TAB>normal_form<TAB>TAG` with an OpenCorpora tag.
    pub fn load(path: &Path) -> Result<Self, MorphologyError> {
        let content = fs::read_to_string(path).map_err(|source| MorphologyError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut model = Self::builtin();
        let mut entries = 0usize;

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            if fields.len() != 3 {
                return Err(MorphologyError::Parse {
                    line: index + 1,
                    message: format!("expected 3 tab-separated fields, found {}", fields.len()),
                });
            }

            let pos = PartOfSpeech::from_tag(fields[2]).ok_or_else(|| MorphologyError::Parse {
                line: index + 1,
                message: format!("unknown part of speech tag '{}'", fields[2]),
            })?;

            model.add_entry(fields[0], fields[1], pos);
            entries += 1;
        }

        info!("Loaded {} dictionary entries from {}", entries, path.display());
        Ok(model)
    }

    /// Builds the model described by the `[morphology]` config section
    pub fn from_config(config: &MorphologyConfig) -> Result<Self, MorphologyError> {
        let model = match &config.dictionary_path {
            Some(path) => Self::load(path)?,
            None => Self::builtin(),
        };
        Ok(model.with_stemming(config.stem_unknown_words))
    }

    /// Enables or disables the stemmer fallback for unknown words
    pub fn with_stemming(mut self, enabled: bool) -> Self {
        self.stemmer = if enabled {
            Some(Stemmer::create(Algorithm::Russian))
        } else {
            None
        };
        self
    }

    /// Number of distinct word forms in the dictionary
    pub fn dictionary_len(&self) -> usize {
        self.dictionary.len()
    }

    fn add_entry(&mut self, form: &str, normal: &str, pos: PartOfSpeech) {
        self.dictionary
            .entry(form.to_lowercase())
            .or_default()
            .push(WordForm::new(normal.to_lowercase(), pos));
    }
}

impl Morphology for RussianMorphology {
    fn forms(&self, word: &str) -> Vec<WordForm> {
        if let Some(forms) = self.dictionary.get(word) {
            return forms.clone();
        }

        if let Some(pos) = self.function_words.get(word) {
            return vec![WordForm::new(word, *pos)];
        }

        match &self.stemmer {
            Some(stemmer) => {
                let stem = stemmer.stem(word);
                if stem.is_empty() {
                    Vec::new()
                } else {
                    vec![WordForm::new(stem.into_owned(), PartOfSpeech::Unknown)]
                }
            }
            None => {
                debug!("No morphology reading for '{}'", word);
                Vec::new()
            }
        }
    }
}
