//! Tiered memory facts and the per-user fact collection.
//!
//! A [`MemoryFact`] is one remembered statement about a user. Its [`MemoryTier`]
//! decides durability: `core` facts never expire, `important` facts live 90
//! days, `context` facts live 30 days. Expiration is data, not a background
//! job: [`UserMemory::sweep_expired`] is a pure filter the caller runs when it
//! chooses.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use super::category::FactCategory;

/// Durability tier of a remembered fact.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MemoryTier {
    /// Permanent facts (name, family members, allergies). Never expire.
    Core,
    /// Durable but revisable facts. Expire 90 days after creation.
    Important,
    /// Conversational context. Expires 30 days after creation.
    Context,
}

impl MemoryTier {
    /// Lifetime of a fact in this tier, measured from `created_at`.
    ///
    /// `None` means the fact never expires.
    pub fn expires_after(&self) -> Option<Duration> {
        match self {
            Self::Core => None,
            Self::Important => Some(Duration::days(90)),
            Self::Context => Some(Duration::days(30)),
        }
    }
}

/// A single remembered statement about a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryFact {
    /// Unique identifier within the owning user's collection.
    pub id: String,
    /// The remembered statement.
    pub content: String,
    /// Classification of the fact.
    pub category: FactCategory,
    /// Durability tier; fixes the expiration policy.
    pub tier: MemoryTier,
    /// Extraction confidence in `[0, 1]`.
    pub confidence: f64,
    /// When the fact was created.
    pub created_at: DateTime<Utc>,
    /// Last time the fact was surfaced into a context.
    pub last_used_at: DateTime<Utc>,
    /// How many times the fact has been surfaced.
    pub use_count: u32,
    /// Expiration instant; `None` for core facts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the fact came from automatic extraction rather than an
    /// explicit user statement.
    pub auto_extracted: bool,
    /// Keywords associated with the fact at extraction time.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Free-text provenance (message excerpt, "user settings page", ...).
    pub source: String,
    /// MD5 of `content`, used to skip duplicate auto-extracted facts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl MemoryFact {
    /// Create a new fact. `expires_at` is derived from the tier and
    /// `confidence` starts at 1.0.
    pub fn new(content: impl Into<String>, category: FactCategory, tier: MemoryTier) -> Self {
        let content = content.into();
        let now = Utc::now();
        let hash = format!("{:x}", md5::compute(content.as_bytes()));
        Self {
            id: Uuid::new_v4().to_string(),
            content,
            category,
            tier,
            confidence: 1.0,
            created_at: now,
            last_used_at: now,
            use_count: 0,
            expires_at: tier.expires_after().map(|d| now + d),
            auto_extracted: false,
            keywords: Vec::new(),
            source: String::new(),
            hash: Some(hash),
        }
    }

    /// Set the extraction confidence, clamped to `[0, 1]`.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Set the associated keywords.
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    /// Set the provenance text.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Mark the fact as automatically extracted.
    pub fn with_auto_extracted(mut self, auto_extracted: bool) -> Self {
        self.auto_extracted = auto_extracted;
        self
    }

    /// Move the fact to another tier, recomputing `expires_at` from
    /// `created_at` so the core-never-expires invariant holds.
    pub fn set_tier(&mut self, tier: MemoryTier) {
        self.tier = tier;
        self.expires_at = tier.expires_after().map(|d| self.created_at + d);
    }

    /// A fact is expired iff it has an expiration instant at or before `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    /// Substring match against the fact content, case-folded, any term.
    pub fn matches_terms(&self, terms: &[String]) -> bool {
        let folded = self.content.to_lowercase();
        terms.iter().any(|t| folded.contains(&t.to_lowercase()))
    }

    /// Record that the fact was surfaced into a context.
    pub fn mark_used(&mut self, now: DateTime<Utc>) {
        self.use_count += 1;
        self.last_used_at = now;
    }
}

/// Aggregate statistics for one user's fact collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Number of stored facts.
    pub total_facts: usize,
    /// Rough token footprint of all fact contents.
    pub token_usage: u64,
    /// When the expiration sweep last ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cleanup: Option<DateTime<Utc>>,
}

/// Rough token estimate at ~4 characters per token.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

/// One user's fact collection, created lazily on first access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMemory {
    /// Owning user.
    pub user_id: String,
    /// The facts, order-irrelevant.
    pub facts: Vec<MemoryFact>,
    /// Aggregate statistics.
    pub stats: MemoryStats,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl UserMemory {
    /// Create an empty collection for a user.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            facts: Vec::new(),
            stats: MemoryStats::default(),
            updated_at: Utc::now(),
        }
    }

    /// Insert a fact, replacing any existing fact with the same id.
    pub fn add_fact(&mut self, fact: MemoryFact) {
        match self.facts.iter_mut().find(|f| f.id == fact.id) {
            Some(existing) => *existing = fact,
            None => self.facts.push(fact),
        }
        self.updated_at = Utc::now();
        self.recount();
    }

    /// Remove a fact by id. Returns whether anything was removed.
    pub fn remove_fact(&mut self, fact_id: &str) -> bool {
        let before = self.facts.len();
        self.facts.retain(|f| f.id != fact_id);
        let removed = self.facts.len() != before;
        if removed {
            self.updated_at = Utc::now();
            self.recount();
        }
        removed
    }

    /// Find a fact with the given content hash, if any.
    pub fn find_by_hash(&self, hash: &str) -> Option<&MemoryFact> {
        self.facts
            .iter()
            .find(|f| f.hash.as_deref() == Some(hash))
    }

    /// Drop expired facts. Pure filter over the collection; running it twice
    /// with the same `now` leaves the same facts as running it once.
    ///
    /// Returns the number of facts removed.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.facts.len();
        self.facts.retain(|f| !f.is_expired(now));
        let removed = before - self.facts.len();
        self.stats.last_cleanup = Some(now);
        if removed > 0 {
            self.updated_at = now;
        }
        self.recount();
        removed
    }

    /// Facts whose content contains any of the given terms (case-folded
    /// substring match, same policy as the keyword matcher). No ranking.
    pub fn retrieve(&self, terms: &[String]) -> Vec<MemoryFact> {
        self.facts
            .iter()
            .filter(|f| f.matches_terms(terms))
            .cloned()
            .collect()
    }

    /// Bump `use_count`/`last_used_at` on the listed facts.
    pub fn record_use(&mut self, fact_ids: &[String], now: DateTime<Utc>) {
        for fact in &mut self.facts {
            if fact_ids.iter().any(|id| *id == fact.id) {
                fact.mark_used(now);
            }
        }
        self.updated_at = now;
    }

    /// Recompute `stats` from the current facts.
    pub fn recount(&mut self) {
        self.stats.total_facts = self.facts.len();
        self.stats.token_usage = self
            .facts
            .iter()
            .map(|f| estimate_tokens(&f.content))
            .sum();
    }
}
