//! Destination storage capacity
//!
//! Raw extracted text is stored verbatim when it fits in the search-index
//! column; otherwise it goes through keyword reduction.

use crate::config::{StorageConfig, StorageEngine};

/// Characters a MySQL TEXT column holds
pub const MYSQL_TEXT_CAPACITY: usize = 65_535;

/// Characters kept in the Postgres keyword column (tsvector ceiling)
pub const POSTGRES_KEYWORD_CAPACITY: usize = 1_048_575;

/// Capacity of the engine's indexable-text storage, in characters
pub fn capacity_for(engine: StorageEngine) -> usize {
    match engine {
        StorageEngine::Mysql => MYSQL_TEXT_CAPACITY,
        StorageEngine::Postgres => POSTGRES_KEYWORD_CAPACITY,
    }
}

/// Whether `text` can be stored without reduction (strictly shorter than capacity)
pub fn fits(text: &str, engine: StorageEngine) -> bool {
    text.chars().count() < capacity_for(engine)
}

/// Capacity lookup for one configured destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPolicy {
    engine: StorageEngine,
    capacity: usize,
}

impl CapacityPolicy {
    pub fn new(engine: StorageEngine) -> Self {
        Self {
            engine,
            capacity: capacity_for(engine),
        }
    }

    /// Fixed capacity, regardless of engine
    pub fn with_capacity(engine: StorageEngine, capacity: usize) -> Self {
        Self { engine, capacity }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        match config.capacity_override {
            Some(capacity) => Self::with_capacity(config.engine, capacity),
            None => Self::new(config.engine),
        }
    }

    pub fn engine(&self) -> StorageEngine {
        self.engine
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn fits(&self, text: &str) -> bool {
        text.chars().count() < self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_holds_more() {
        assert!(capacity_for(StorageEngine::Postgres) > capacity_for(StorageEngine::Mysql));
        assert_eq!(capacity_for(StorageEngine::Mysql), 65_535);
    }

    #[test]
    fn test_fits_is_strict() {
        let policy = CapacityPolicy::with_capacity(StorageEngine::Mysql, 5);
        assert!(policy.fits("abcd"));
        assert!(!policy.fits("abcde"));
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let policy = CapacityPolicy::with_capacity(StorageEngine::Mysql, 4);
        // three characters, six bytes
        assert!(policy.fits("äöü"));
    }

    #[test]
    fn test_override_from_config() {
        let config = StorageConfig {
            engine: StorageEngine::Postgres,
            capacity_override: Some(1000),
        };
        let policy = CapacityPolicy::from_config(&config);
        assert_eq!(policy.capacity(), 1000);
        assert_eq!(policy.engine(), StorageEngine::Postgres);

        let policy = CapacityPolicy::from_config(&StorageConfig::default());
        assert_eq!(policy.capacity(), MYSQL_TEXT_CAPACITY);
    }

    #[test]
    fn test_five_kb_text_fits_mysql() {
        let text = "lorem ipsum ".repeat(430);
        assert!(text.len() > 5000);
        assert!(fits(&text, StorageEngine::Mysql));
    }
}
