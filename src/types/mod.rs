pub mod error;

pub use error::{ErrorCategory, ErrorClassifier, LlmError, Result, WikiError};

// =============================================================================
// Domain Newtypes
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a documentation topic ("100", "980", ...)
///
/// Ordered lexically, which matches numeric order for the fixed-width ids
/// used by the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(String);

impl TopicId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TopicId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TopicId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for TopicId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for TopicId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_topic_id_ordering_and_lookup() {
        let mut map = BTreeMap::new();
        map.insert(TopicId::from("900"), 'c');
        map.insert(TopicId::from("100"), 'a');
        map.insert(TopicId::from("311"), 'b');

        let keys: Vec<&str> = map.keys().map(TopicId::as_str).collect();
        assert_eq!(keys, vec!["100", "311", "900"]);
        assert_eq!(map.get("311"), Some(&'b'));
    }

    #[test]
    fn test_topic_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&TopicId::from("980")).unwrap();
        assert_eq!(json, "\"980\"");
    }
}
