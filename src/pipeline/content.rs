//! Generated documents keyed by topic.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::TopicId;

const PLACEHOLDER_PREFIX: &str = "# Error\n\nFailed to generate document ";

/// Placeholder stored for a topic whose generation failed
pub fn placeholder(topic: &str, reason: &str) -> String {
    format!("{}{}: {}\n", PLACEHOLDER_PREFIX, topic, reason)
}

pub fn is_placeholder(content: &str) -> bool {
    content.starts_with(PLACEHOLDER_PREFIX)
}

/// Topic id → document text.
///
/// Each generation task owns exactly one key, so merging task outputs is a
/// plain insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GeneratedContent {
    docs: BTreeMap<TopicId, String>,
}

impl GeneratedContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a topic's document
    pub fn insert(&mut self, topic: TopicId, content: String) -> Option<String> {
        self.docs.insert(topic, content)
    }

    pub fn get(&self, topic: &str) -> Option<&str> {
        self.docs.get(topic).map(String::as_str)
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.docs.contains_key(topic)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TopicId, &String)> {
        self.docs.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &TopicId> {
        self.docs.keys()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Topics whose content is a failure placeholder
    pub fn failed(&self) -> impl Iterator<Item = &TopicId> {
        self.docs
            .iter()
            .filter(|(_, content)| is_placeholder(content))
            .map(|(id, _)| id)
    }

    /// Apply `f` to every document, keeping keys
    pub fn map_documents(self, mut f: impl FnMut(&TopicId, String) -> String) -> Self {
        Self {
            docs: self
                .docs
                .into_iter()
                .map(|(id, content)| {
                    let content = f(&id, content);
                    (id, content)
                })
                .collect(),
        }
    }
}

impl FromIterator<(TopicId, String)> for GeneratedContent {
    fn from_iter<I: IntoIterator<Item = (TopicId, String)>>(iter: I) -> Self {
        let mut content = Self::new();
        for (topic, text) in iter {
            content.insert(topic, text);
        }
        content
    }
}
