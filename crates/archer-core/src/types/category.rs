//! Category types for fact classification.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Classification of a remembered fact.
///
/// These categories cover the domains the assistant remembers about a family
/// member. They serialize to snake_case for storage compatibility.
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
pub enum FactCategory {
    /// Identity details: name, age, birthday, contact info.
    Profile,
    /// Likes, dislikes, styles, habits.
    Preference,
    /// Ongoing projects and activities.
    Project,
    /// Tools, devices, software the user works with.
    Technical,
    /// Family members, friends, pets.
    Relationship,
    /// Dietary restrictions, allergies, wellness.
    Health,
    /// Recurring events, routines, important dates.
    Schedule,
    /// Catch-all for anything else worth keeping.
    Misc,
}

impl FactCategory {
    /// Returns all category names as static strings.
    pub fn all_names() -> Vec<&'static str> {
        Self::iter().map(|c| c.into()).collect()
    }
}

impl Default for FactCategory {
    fn default() -> Self {
        Self::Misc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_category_display() {
        assert_eq!(FactCategory::Profile.to_string(), "profile");
        assert_eq!(FactCategory::Preference.to_string(), "preference");
        assert_eq!(FactCategory::Relationship.to_string(), "relationship");
        assert_eq!(FactCategory::Misc.to_string(), "misc");
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!(
            FactCategory::from_str("preference").unwrap(),
            FactCategory::Preference
        );
        assert_eq!(
            FactCategory::from_str("technical").unwrap(),
            FactCategory::Technical
        );
        assert!(FactCategory::from_str("invalid").is_err());
    }

    #[test]
    fn test_category_all_names() {
        let names = FactCategory::all_names();
        assert_eq!(names.len(), 8);
        assert!(names.contains(&"profile"));
        assert!(names.contains(&"schedule"));
    }

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&FactCategory::Health).unwrap();
        assert_eq!(json, "\"health\"");

        let parsed: FactCategory = serde_json::from_str("\"project\"").unwrap();
        assert_eq!(parsed, FactCategory::Project);
    }
}
