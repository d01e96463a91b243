//! The immutable trigger registry and its builder.

use tracing::{debug, info};

use super::types::{KeywordTrigger, TriggerCategory};

/// Builder for a [`TriggerRegistry`]. Registration order is preserved and
/// becomes the check/dispatch order.
#[derive(Default)]
pub struct TriggerRegistryBuilder {
    triggers: Vec<KeywordTrigger>,
}

impl TriggerRegistryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trigger. Re-registering an existing `kind` replaces the
    /// trigger in place, keeping its original position.
    pub fn register(mut self, trigger: KeywordTrigger) -> Self {
        if trigger.keywords.is_empty() {
            debug!(kind = %trigger.kind, "registering trigger with empty keyword set");
        }
        match self.triggers.iter_mut().find(|t| t.kind == trigger.kind) {
            Some(existing) => *existing = trigger,
            None => self.triggers.push(trigger),
        }
        self
    }

    /// Freeze the registry. After this point the trigger set cannot change;
    /// share it behind `Arc` for concurrent dispatch.
    pub fn build(self) -> TriggerRegistry {
        info!(triggers = self.triggers.len(), "trigger registry built");
        TriggerRegistry {
            triggers: self.triggers,
        }
    }
}

/// The full set of keyword triggers, fixed at startup.
pub struct TriggerRegistry {
    triggers: Vec<KeywordTrigger>,
}

impl TriggerRegistry {
    /// Start building a registry.
    pub fn builder() -> TriggerRegistryBuilder {
        TriggerRegistryBuilder::new()
    }

    /// Look up a trigger by id.
    pub fn get(&self, kind: &str) -> Option<&KeywordTrigger> {
        self.triggers.iter().find(|t| t.kind == kind)
    }

    /// All triggers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &KeywordTrigger> {
        self.triggers.iter()
    }

    /// Triggers in one category, registration order preserved.
    pub fn in_category(
        &self,
        category: TriggerCategory,
    ) -> impl Iterator<Item = &KeywordTrigger> {
        self.triggers.iter().filter(move |t| t.category == category)
    }

    /// Number of registered triggers.
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}
