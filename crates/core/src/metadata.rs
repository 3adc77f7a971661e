//! Insertion-ordered tag map shared by cue sheets, probes and encoders.

use serde::{Deserialize, Serialize};

/// Ordered `key -> value` tag mapping.
///
/// Keys keep the position of their first insertion; setting an existing key
/// replaces its value in place. Cloning produces an independent snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Renders the tags as ffmpeg `-metadata key=value` arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        self.format_args("-metadata", |k, v| format!("{}={}", k, v))
    }

    /// Renders each tag as `flag` followed by `render(key, value)`.
    pub fn format_args<F>(&self, flag: &str, render: F) -> Vec<String>
    where
        F: Fn(&str, &str) -> String,
    {
        self.iter()
            .flat_map(|(k, v)| [flag.to_string(), render(k, v)])
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = Metadata::new();
        for (k, v) in iter {
            metadata.insert(k, v);
        }
        metadata
    }
}
