use std::{fmt::Display, str::FromStr, sync::Arc};

use crate::SourceKeyErr;

/// Maximum string length of a source key.
pub const MAX_SOURCE_KEY_LEN: usize = 249;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Identifies a record source: an external stream of the query engine, or a Kafka topic behind it.
pub struct SourceKey {
    name: Arc<String>,
}

impl SourceKey {
    pub fn new<S: Into<String>>(key: S) -> Result<Self, SourceKeyErr> {
        let key = key.into();
        if is_valid_source_key(key.as_str()) {
            Ok(Self {
                name: Arc::new(key),
            })
        } else {
            Err(SourceKeyErr::InvalidSourceKey)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for SourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl FromStr for SourceKey {
    type Err = SourceKeyErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceKey::new(s)
    }
}

/// Source keys end up unquoted in SQL statements, so the pattern is kept to Kafka's topic name rules.
pub fn is_valid_source_key(s: &str) -> bool {
    !s.is_empty() && s.len() <= MAX_SOURCE_KEY_LEN && s.chars().all(is_valid_source_key_char)
}

/// Returns true if this character can be used in a source key.
pub fn is_valid_source_key_char(c: char) -> bool {
    // https://stackoverflow.com/questions/37062904/what-are-apache-kafka-topic-name-limitations
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}
