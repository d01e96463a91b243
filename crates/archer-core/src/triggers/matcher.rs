//! Case-folded substring matching over bilingual keyword lists.

use serde::{Deserialize, Serialize};

/// A bilingual keyword list attached to a trigger.
///
/// Matching is plain substring containment over the case-folded message, for
/// both lists. English keywords are folded too, so declarations may use any
/// casing; Chinese keywords pass through folding unchanged. There is no word
/// segmentation: `"prefer"` matches inside `"preference"`. Keyword authors
/// pick phrases long enough to avoid accidental hits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordSet {
    /// English keywords and phrases.
    #[serde(default)]
    pub english: Vec<String>,
    /// Chinese keywords and phrases.
    #[serde(default)]
    pub chinese: Vec<String>,
}

impl KeywordSet {
    /// Create a bilingual keyword set.
    pub fn new(english: Vec<String>, chinese: Vec<String>) -> Self {
        Self { english, chinese }
    }

    /// Create a set with English keywords only.
    pub fn english_only(english: Vec<String>) -> Self {
        Self {
            english,
            chinese: Vec::new(),
        }
    }

    /// Whether the set is empty. Empty sets never match.
    pub fn is_empty(&self) -> bool {
        self.english.is_empty() && self.chinese.is_empty()
    }

    /// Whether any keyword occurs in `message`.
    pub fn matches(&self, message: &str) -> bool {
        let folded = message.to_lowercase();
        self.all_keywords()
            .any(|kw| folded.contains(&kw.to_lowercase()))
    }

    /// Every keyword that occurs in `message`, in declaration order with the
    /// English list first. Keywords are returned exactly as declared.
    pub fn matched_keywords(&self, message: &str) -> Vec<String> {
        let folded = message.to_lowercase();
        self.all_keywords()
            .filter(|kw| folded.contains(&kw.to_lowercase()))
            .cloned()
            .collect()
    }

    fn all_keywords(&self) -> impl Iterator<Item = &String> {
        self.english.iter().chain(self.chinese.iter())
    }
}
