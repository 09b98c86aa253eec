//! Snippet rendering for search results
//!
//! A snippet is assembled from up to three sources, in order, until it
//! reaches [`SNIPPET_BUDGET`] characters:
//! 1. the meta description, with query words bolded
//! 2. anchor texts that contain a query term
//! 3. a short window of page text around each term still missing
//!
//! All lengths and offsets count characters, not bytes.

use crate::crawler::ParsedPage;
use crate::lemma::Lemmatizer;

/// Soft length limit of a snippet in characters
pub const SNIPPET_BUDGET: usize = 220;

/// Placed between snippet parts
pub const SEPARATOR: &str = " ... ";

const WINDOW_BEFORE: usize = 20;
const WINDOW_AFTER: usize = 30;

/// Splits a query into the terms a snippet highlights
///
/// Terms are the lowercase Cyrillic words of the query minus
/// conjunctions, prepositions and interjections. Punctuation and other
/// scripts are dropped the same way they are dropped from page text.
pub fn query_terms(query: &str, lemmatizer: &Lemmatizer) -> Vec<String> {
    Lemmatizer::words(query)
        .into_iter()
        .filter(|word| !lemmatizer.is_function_word(word))
        .collect()
}

/// Renders the snippet of one page
pub fn build_snippet(page: &ParsedPage, terms: &[String]) -> String {
    let mut snippet = Snippet::default();

    if let Some(description) = &page.description {
        snippet.push(mark_bold(description, terms));
    }

    for anchor in &page.anchor_texts {
        if snippet.is_full() {
            break;
        }
        let text = anchor.to_lowercase();
        if terms.iter().any(|term| text.contains(term.as_str())) {
            snippet.push(mark_bold(&text, terms));
        }
    }

    let text = normalize_text(&page.text);
    for term in terms {
        if snippet.is_full() {
            break;
        }
        if snippet.contains(term) {
            continue;
        }
        if let Some(window) = context_window(&text, term) {
            snippet.push(window);
        }
    }

    snippet.text
}

/// Wraps every word that starts with a query term in `<b>` tags
///
/// Comparison is case-insensitive; the original spelling is kept.
pub fn mark_bold(text: &str, terms: &[String]) -> String {
    text.split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            if terms.iter().any(|term| lower.starts_with(term.as_str())) {
                format!("<b>{}</b>", word)
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Default)]
struct Snippet {
    text: String,
    chars: usize,
}

impl Snippet {
    fn push(&mut self, part: String) {
        if part.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push_str(SEPARATOR);
            self.chars += SEPARATOR.chars().count();
        }
        self.chars += part.chars().count();
        self.text.push_str(&part);
    }

    fn is_full(&self) -> bool {
        self.chars > SNIPPET_BUDGET
    }

    fn contains(&self, term: &str) -> bool {
        self.text.to_lowercase().contains(term)
    }
}

/// Lowercases text and keeps only Cyrillic letters and single spaces
fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if matches!(c, 'а'..='я' | 'ё') { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text around the first occurrence of `term`, with the term bolded
fn context_window(text: &str, term: &str) -> Option<String> {
    let byte_index = text.find(term)?;

    let chars: Vec<char> = text.chars().collect();
    let start = text[..byte_index].chars().count();
    let term_len = term.chars().count();
    let end = start + term_len;

    let window_start = start.saturating_sub(WINDOW_BEFORE);
    let window_end = (end + WINDOW_AFTER).min(chars.len());

    let before: String = chars[window_start..start].iter().collect();
    let matched: String = chars[start..end].iter().collect();
    let after: String = chars[end..window_end].iter().collect();

    Some(format!(
        "{}<b>{}</b>{}",
        before.trim_start(),
        matched,
        after.trim_end()
    ))
}
