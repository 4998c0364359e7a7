//! Banned word list repository.

use rolapet_common::{AppError, AppResult};

use crate::collections;
use crate::store::{Document, Store};

/// Ordered list of lowercase banned words.
#[derive(Clone)]
pub struct BannedWordRepository {
    doc: Document<Vec<String>>,
}

impl BannedWordRepository {
    /// Create a new banned word repository.
    #[must_use]
    pub fn new(store: &Store) -> Self {
        Self {
            doc: store.document(collections::BANNED_WORDS),
        }
    }

    /// All banned words in insertion order.
    pub async fn all(&self) -> AppResult<Vec<String>> {
        self.doc.load().await
    }

    /// Add a word, lowercased. Fails with `Duplicate` if already listed.
    pub async fn add(&self, word: &str) -> AppResult<String> {
        let word = word.to_lowercase();
        self.doc
            .modify(move |words| {
                if words.contains(&word) {
                    return Err(AppError::Duplicate(format!("banned word {word}")));
                }
                words.push(word.clone());
                Ok(word)
            })
            .await
    }

    /// Remove a word, matched lowercased. Fails with `NotFound` if absent.
    pub async fn remove(&self, word: &str) -> AppResult<()> {
        let word = word.to_lowercase();
        self.doc
            .modify(move |words| {
                let before = words.len();
                words.retain(|w| *w != word);
                if words.len() == before {
                    return Err(AppError::NotFound(format!("banned word {word}")));
                }
                Ok(())
            })
            .await
    }

    /// Seed the list if it has never been written.
    pub async fn init_if_absent(&self, words: &[String]) -> AppResult<bool> {
        let words: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        self.doc.init_if_absent(&words).await
    }
}
