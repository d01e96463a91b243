//! Trigger definitions, dispatch context, and dispatch outcomes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use super::matcher::KeywordSet;
use crate::error::ArcherResult;

/// Which pipeline a trigger feeds.
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
pub enum TriggerCategory {
    /// The user wants the assistant to do something now (search, generate).
    Intention,
    /// The message carries something worth remembering or recalling.
    Memory,
}

/// Input handed to a trigger action when it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerContext {
    /// User whose message fired the trigger.
    pub user_id: String,
    /// Conversation the message belongs to, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// The original message text, unmodified.
    pub message: String,
}

impl TriggerContext {
    /// Create a context for a message outside any conversation.
    pub fn new(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            conversation_id: None,
            message: message.into(),
        }
    }

    /// Attach the conversation id.
    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }
}

/// What a trigger action produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerOutcome {
    /// Human-readable one-liner describing what happened.
    pub summary: String,
    /// Structured payload for the caller, shape owned by the action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl TriggerOutcome {
    /// Create an outcome with just a summary.
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            payload: None,
        }
    }

    /// Attach a structured payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Behavior attached to a trigger.
///
/// Implementations are registered once at startup and shared behind `Arc`,
/// so they must be `Send + Sync`. Actions receive the full context and may
/// perform I/O; errors propagate to the dispatcher, which decides whether to
/// isolate or surface them.
#[async_trait]
pub trait TriggerAction: Send + Sync {
    /// Run the action for a message that matched the trigger's keywords.
    async fn run(&self, context: &TriggerContext) -> ArcherResult<TriggerOutcome>;
}

/// A keyword trigger: an id, a category, a keyword set, and an optional
/// action to run on match.
#[derive(Clone)]
pub struct KeywordTrigger {
    /// Unique id, e.g. `"intention.web_search"`.
    pub kind: String,
    /// Pipeline the trigger feeds.
    pub category: TriggerCategory,
    /// Bilingual keyword list that decides matching.
    pub keywords: KeywordSet,
    /// Short description for diagnostics.
    pub description: String,
    /// Action to run on match; triggers may be match-only.
    pub action: Option<Arc<dyn TriggerAction>>,
}

impl KeywordTrigger {
    /// Create an action-less trigger.
    pub fn new(kind: impl Into<String>, category: TriggerCategory, keywords: KeywordSet) -> Self {
        Self {
            kind: kind.into(),
            category,
            keywords,
            description: String::new(),
            action: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach the action to run on match.
    pub fn with_action(mut self, action: Arc<dyn TriggerAction>) -> Self {
        self.action = Some(action);
        self
    }

    /// Whether an action is attached.
    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }
}

impl fmt::Debug for KeywordTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeywordTrigger")
            .field("kind", &self.kind)
            .field("category", &self.category)
            .field("keywords", &self.keywords)
            .field("description", &self.description)
            .field("action", &self.action.is_some())
            .finish()
    }
}

/// Result of checking one registered trigger against a message.
///
/// Non-matches are included so callers can see the full decision, not just
/// the hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerCheck {
    /// Trigger id.
    pub kind: String,
    /// Pipeline the trigger feeds.
    pub category: TriggerCategory,
    /// Whether any keyword matched.
    pub matched: bool,
    /// Keywords that matched, in declaration order.
    pub matched_keywords: Vec<String>,
}

/// Terminal state of one action inside a dispatch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// The action ran and returned an outcome.
    Completed {
        /// What the action produced.
        outcome: TriggerOutcome,
    },
    /// The trigger matched but has no action attached.
    Skipped {
        /// Why nothing ran.
        reason: String,
    },
    /// The action returned an error.
    Failed {
        /// Error message from the action.
        error: String,
    },
}

/// One trigger's entry in a dispatch report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchEntry {
    /// Trigger id.
    pub kind: String,
    /// Pipeline the trigger feeds.
    pub category: TriggerCategory,
    /// What happened.
    pub outcome: DispatchOutcome,
}

/// Aggregate result of running every matched trigger for one message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchReport {
    /// One entry per executed trigger, in execution order.
    pub entries: Vec<DispatchEntry>,
}

impl DispatchReport {
    /// Entries whose action completed.
    pub fn completed(&self) -> impl Iterator<Item = &DispatchEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, DispatchOutcome::Completed { .. }))
    }

    /// Entries whose action failed.
    pub fn failed(&self) -> impl Iterator<Item = &DispatchEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, DispatchOutcome::Failed { .. }))
    }

    /// Whether every entry completed (an empty report counts as success).
    pub fn is_all_completed(&self) -> bool {
        self.failed().next().is_none()
            && !self
                .entries
                .iter()
                .any(|e| matches!(e.outcome, DispatchOutcome::Skipped { .. }))
    }
}
