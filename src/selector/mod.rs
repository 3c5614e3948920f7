//! Candidate Selector
//!
//! Pure mapping from a [`FileIndex`] to per-topic candidate lists. Only text
//! records are candidates. Each record is tested against every [`TopicRule`]
//! and appended to every matching topic in traversal order; the catch-all
//! topic takes every text record.

pub mod topics;

pub use topics::{
    CATCH_ALL_TOPIC, MANDATORY_TOPICS, OVERVIEW_TOPIC, RULES, TOPICS, Topic, TopicRule, topic,
    taxonomy_listing,
};

use serde::Serialize;
use std::collections::BTreeMap;

use crate::scanner::FileIndex;
use crate::types::TopicId;

/// Topic id → candidate paths. Every taxonomy topic has a key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CandidateMap {
    entries: BTreeMap<TopicId, Vec<String>>,
}

impl CandidateMap {
    pub fn get(&self, topic: &str) -> &[String] {
        self.entries.get(topic).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TopicId, &Vec<String>)> {
        self.entries.iter()
    }

    /// Topics with at least one candidate
    pub fn with_evidence(&self) -> impl Iterator<Item = (&TopicId, usize)> {
        self.entries
            .iter()
            .filter(|(_, paths)| !paths.is_empty())
            .map(|(id, paths)| (id, paths.len()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the candidate map for a scanned repository
pub fn select_candidates(index: &FileIndex) -> CandidateMap {
    let mut entries: BTreeMap<TopicId, Vec<String>> =
        TOPICS.iter().map(|t| (t.topic_id(), Vec::new())).collect();

    for record in index.iter().filter(|r| r.is_text) {
        let lower = record.lower_path();
        let extension = record.extension.as_deref();

        for rule in RULES {
            if rule.matches(&lower, extension)
                && let Some(paths) = entries.get_mut(rule.topic)
            {
                paths.push(record.path.clone());
            }
        }

        if let Some(paths) = entries.get_mut(CATCH_ALL_TOPIC) {
            paths.push(record.path.clone());
        }
    }

    CandidateMap { entries }
}
