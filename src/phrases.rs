//! Phrase lists
//!
//! Every language cue the engine reacts to lives in a [`PhraseBook`] that can be
//! replaced per deployment or locale. Matching is case-insensitive substring
//! matching, nothing smarter.

use serde::{Deserialize, Serialize};

/// Which list a phrase belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhraseKind {
    /// Self-harm, medical emergency, violence, real aircraft danger
    Crisis,
    /// Doom framing about the flight itself
    Catastrophic,
    /// Language of an active panic episode
    Panic,
    /// Asking for a real person or pilot
    HumanRequest,
    /// Curiosity about how things work
    TechnicalCue,
    /// Reflective or spiritual framing
    ReflectiveCue,
}

/// A lower-cased list of phrases matched by substring
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct PhraseList {
    phrases: Vec<String>,
}

impl From<Vec<String>> for PhraseList {
    fn from(phrases: Vec<String>) -> Self {
        Self::new(phrases)
    }
}

impl From<PhraseList> for Vec<String> {
    fn from(list: PhraseList) -> Self {
        list.phrases
    }
}

impl PhraseList {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// First phrase contained in `text`, if any
    pub fn find(&self, text: &str) -> Option<&str> {
        if text.trim().is_empty() {
            return None;
        }
        let haystack = normalize_text(text);
        self.phrases
            .iter()
            .find(|p| haystack.contains(p.as_str()))
            .map(String::as_str)
    }

    pub fn matches(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.phrases.iter().map(String::as_str)
    }
}

/// Lower-case and fold typographic apostrophes so "we’re" matches "we're"
fn normalize_text(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

/// All phrase lists the engine consults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhraseBook {
    pub crisis: PhraseList,
    pub catastrophic: PhraseList,
    pub panic: PhraseList,
    pub human_request: PhraseList,
    pub technical_cues: PhraseList,
    pub reflective_cues: PhraseList,
}

impl PhraseBook {
    pub fn list(&self, kind: PhraseKind) -> &PhraseList {
        match kind {
            PhraseKind::Crisis => &self.crisis,
            PhraseKind::Catastrophic => &self.catastrophic,
            PhraseKind::Panic => &self.panic,
            PhraseKind::HumanRequest => &self.human_request,
            PhraseKind::TechnicalCue => &self.technical_cues,
            PhraseKind::ReflectiveCue => &self.reflective_cues,
        }
    }

    pub fn matches(&self, kind: PhraseKind, text: &str) -> bool {
        self.list(kind).matches(text)
    }
}

impl Default for PhraseBook {
    fn default() -> Self {
        Self {
            // Kept narrow: ordinary anxious language ("my heart is racing",
            // "I feel sick") must not land here.
            crisis: PhraseList::new([
                "kill myself",
                "killing myself",
                "end my life",
                "want to die",
                "wanna die",
                "suicide",
                "suicidal",
                "hurt myself",
                "harm myself",
                "better off dead",
                "chest pain",
                "having a heart attack",
                "having a stroke",
                "having a seizure",
                "can't feel my arm",
                "cant feel my arm",
                "passed out",
                "can't wake",
                "not breathing",
                "stopped breathing",
                "hurt someone",
                "kill someone",
                "kill them all",
                "i have a weapon",
                "i have a knife",
                "i have a gun",
                "there's a bomb",
                "open the door mid",
                "open the emergency door",
                "smoke in the cabin",
                "fire in the cabin",
                "engine is on fire",
                "engine on fire",
            ]),
            catastrophic: PhraseList::new([
                "going down",
                "going to crash",
                "gonna crash",
                "we're crashing",
                "we are crashing",
                "plane is falling",
                "falling out of the sky",
                "we're all going to die",
                "we are all going to die",
                "we're going to die",
                "going to die",
                "this is the end",
                "we won't make it",
                "never going to land",
                "something is wrong with the plane",
            ]),
            panic: PhraseList::new([
                "can't breathe",
                "cant breathe",
                "panic attack",
                "panicking",
                "freaking out",
                "losing it",
                "losing my mind",
                "can't calm down",
                "get me off",
                "need to get off",
            ]),
            human_request: PhraseList::new([
                "real pilot",
                "talk to the pilot",
                "speak to the pilot",
                "talk to a human",
                "speak to a human",
                "real person",
                "actual person",
                "talk to someone real",
                "are you a bot",
                "human please",
            ]),
            technical_cues: PhraseList::new([
                "how does",
                "how do planes",
                "why does the",
                "what is that noise",
                "what was that sound",
                "physics",
                "aerodynamic",
                "lift",
                "altitude",
                "knots",
                "autopilot",
                "flaps",
                "how many engines",
                "statistic",
            ]),
            reflective_cues: PhraseList::new([
                "pray",
                "in god",
                "god's plan",
                "universe",
                "meditat",
                "spirit",
                "faith",
                "soul",
                "mindful",
                "surrender",
                "let go",
            ]),
        }
    }
}
