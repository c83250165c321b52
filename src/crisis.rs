//! Crisis language gate
//!
//! A fast substring scan of the latest message against the crisis phrase list.
//! False negatives are accepted; the list is kept narrow so ordinary anxious
//! language never trips it.

use crate::phrases::{PhraseBook, PhraseKind};
use tracing::debug;

/// Detector for crisis-level language
pub struct CrisisDetector<'a> {
    phrases: &'a PhraseBook,
}

impl<'a> CrisisDetector<'a> {
    pub fn new(phrases: &'a PhraseBook) -> Self {
        Self { phrases }
    }

    /// Whether the message contains crisis language
    pub fn detect(&self, message: &str) -> bool {
        match self.phrases.list(PhraseKind::Crisis).find(message) {
            Some(phrase) => {
                debug!(phrase, "crisis language detected");
                true
            }
            None => false,
        }
    }
}
