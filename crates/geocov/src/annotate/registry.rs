//! Registry of topic identifiers and their text patterns.

use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};

use crate::error::{GeocovError, Result};

/// Built-in topics: identifier and case-insensitive pattern.
const BUILTIN_TOPICS: &[(&str, &str)] = &[("five_g", r"\b5g\b"), ("microchip", "chip")];

/// Canonical form of a topic identifier, also used as its column name.
///
/// `"Five-G"` and `"five_g"` both become `"five_g"`.
pub fn normalize_topic(topic: &str) -> String {
    topic.trim().to_lowercase().replace(['-', ' '], "_")
}

/// A compiled, case-insensitive topic pattern.
#[derive(Debug, Clone)]
pub struct TopicPattern {
    name: String,
    regex: Regex,
}

impl TopicPattern {
    /// Compile `pattern` as a case-insensitive regular expression.
    pub fn new(name: &str, pattern: &str) -> Result<Self> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self {
            name: normalize_topic(name),
            regex,
        })
    }

    /// Match a literal substring, case-insensitively.
    pub fn substring(name: &str, needle: &str) -> Result<Self> {
        Self::new(name, &regex::escape(needle))
    }

    /// Column name for this topic.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pattern source.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether `text` discusses this topic.
    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Maps topic identifiers to patterns, preserving registration order.
#[derive(Debug, Clone, Default)]
pub struct TopicRegistry {
    patterns: IndexMap<String, TopicPattern>,
}

impl TopicRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in topics.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (name, pattern) in BUILTIN_TOPICS {
            if let Ok(topic) = TopicPattern::new(name, pattern) {
                registry.insert(topic);
            }
        }
        registry
    }

    /// Register (or replace) a topic from a regular expression.
    pub fn register(&mut self, name: &str, pattern: &str) -> Result<()> {
        if normalize_topic(name).is_empty() {
            return Err(GeocovError::Config("topic name must not be empty".to_string()));
        }
        self.insert(TopicPattern::new(name, pattern)?);
        Ok(())
    }

    /// Register (or replace) an existing pattern.
    pub fn insert(&mut self, topic: TopicPattern) {
        self.patterns.insert(topic.name.clone(), topic);
    }

    /// Look up a topic by identifier.
    pub fn get(&self, topic: &str) -> Result<&TopicPattern> {
        self.patterns
            .get(&normalize_topic(topic))
            .ok_or_else(|| GeocovError::UnknownTopic(topic.to_string()))
    }

    /// Resolve an ordered list of identifiers, failing on the first unknown one.
    pub fn resolve<S: AsRef<str>>(&self, topics: &[S]) -> Result<Vec<&TopicPattern>> {
        let mut resolved: Vec<&TopicPattern> = Vec::with_capacity(topics.len());
        for topic in topics {
            let pattern = self.get(topic.as_ref())?;
            if !resolved.iter().any(|p| p.name == pattern.name) {
                resolved.push(pattern);
            }
        }
        Ok(resolved)
    }

    /// Registered topics in registration order.
    pub fn topics(&self) -> impl Iterator<Item = &TopicPattern> {
        self.patterns.values()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
