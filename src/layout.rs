//! Key Layout
//!
//! Maps collections onto backing-store keys:
//!
//! ```text
//! {collection_prefix}{id}   → JSON record object
//! index:{collection}        → JSON array of ids
//! ```
//!
//! The record prefix defaults to `"{collection}:"`. Overrides exist so that
//! data written under shorter prefixes (`log:`, `stat:`, ...) stays readable.
//! Index keys are never overridden.

use std::collections::HashMap;

use crate::constants::{COLLECTION_PREFIX_SEPARATOR, INDEX_KEY_PREFIX};

/// Well-known collection names.
pub mod collection {
    /// Client profiles
    pub const CLIENT: &str = "client";
    /// Exercise library entries
    pub const EXERCISE: &str = "exercise";
    /// Reusable workout templates
    pub const WORKOUT_TEMPLATE: &str = "workout_template";
    /// Completed workout logs
    pub const WORKOUT_LOG: &str = "workout_log";
    /// Nutrition log entries
    pub const NUTRITION_LOG: &str = "nutrition_log";
    /// Meal plans
    pub const MEAL_PLAN: &str = "meal_plan";
    /// Body measurements
    pub const BODY_STAT: &str = "body_stat";
    /// Progress photo metadata
    pub const PROGRESS_PHOTO: &str = "progress_photo";
    /// Chat messages
    pub const MESSAGE: &str = "message";
    /// Earned achievements
    pub const ACHIEVEMENT: &str = "achievement";
    /// Training programs
    pub const PROGRAM: &str = "program";
    /// Client groups
    pub const GROUP: &str = "group";
}

/// Record and index key construction for every collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyLayout {
    /// Custom record prefixes by collection
    prefixes: HashMap<String, String>,
}

impl KeyLayout {
    /// Layout with no overrides: every prefix is `"{collection}:"`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Layout used by the deployed fitness portal data.
    #[must_use]
    pub fn fitness_defaults() -> Self {
        use collection::*;

        Self::new()
            .with_prefix(CLIENT, "client:")
            .with_prefix(EXERCISE, "exercise:")
            .with_prefix(WORKOUT_TEMPLATE, "workout:")
            .with_prefix(WORKOUT_LOG, "log:")
            .with_prefix(NUTRITION_LOG, "nutrition:")
            .with_prefix(MEAL_PLAN, "meal:")
            .with_prefix(BODY_STAT, "stat:")
            .with_prefix(PROGRESS_PHOTO, "photo:")
            .with_prefix(MESSAGE, "message:")
            .with_prefix(ACHIEVEMENT, "achievement:")
            .with_prefix(PROGRAM, "program:")
            .with_prefix(GROUP, "group:")
    }

    /// Override the record prefix of one collection.
    #[must_use]
    pub fn with_prefix(mut self, collection: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.prefixes.insert(collection.into(), prefix.into());
        self
    }

    /// Record prefix for a collection.
    #[must_use]
    pub fn prefix(&self, collection: &str) -> String {
        match self.prefixes.get(collection) {
            Some(prefix) => prefix.clone(),
            None => format!("{collection}{COLLECTION_PREFIX_SEPARATOR}"),
        }
    }

    /// Key holding one record.
    #[must_use]
    pub fn record_key(&self, collection: &str, id: &str) -> String {
        format!("{}{id}", self.prefix(collection))
    }

    /// Key holding a collection's id index.
    #[must_use]
    pub fn index_key(collection: &str) -> String {
        format!("{INDEX_KEY_PREFIX}{collection}")
    }

    /// Collection name from an index key, if it is one.
    #[must_use]
    pub fn collection_from_index_key(key: &str) -> Option<&str> {
        key.strip_prefix(INDEX_KEY_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prefix() {
        let layout = KeyLayout::new();
        assert_eq!(layout.prefix("client"), "client:");
        assert_eq!(layout.record_key("client", "u1"), "client:u1");
        assert_eq!(layout.record_key("new_thing", "x"), "new_thing:x");
    }

    #[test]
    fn test_custom_prefix() {
        let layout = KeyLayout::new().with_prefix("workout_log", "log:");
        assert_eq!(layout.record_key("workout_log", "42"), "log:42");
        assert_eq!(layout.record_key("client", "u1"), "client:u1");
    }

    #[test]
    fn test_fitness_defaults() {
        let layout = KeyLayout::fitness_defaults();
        assert_eq!(layout.record_key(collection::WORKOUT_TEMPLATE, "a"), "workout:a");
        assert_eq!(layout.record_key(collection::BODY_STAT, "a"), "stat:a");
        assert_eq!(layout.record_key(collection::PROGRESS_PHOTO, "a"), "photo:a");
        assert_eq!(layout.record_key(collection::CLIENT, "a"), "client:a");
    }

    #[test]
    fn test_index_key_ignores_prefix_overrides() {
        assert_eq!(KeyLayout::index_key("workout_log"), "index:workout_log");
        assert_eq!(
            KeyLayout::collection_from_index_key("index:workout_log"),
            Some("workout_log")
        );
        assert_eq!(KeyLayout::collection_from_index_key("log:1"), None);
    }
}
