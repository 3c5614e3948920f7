//! Documentation planning: heuristic topic selection plus optional refinement.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::context::RunContext;
use super::prompts;
use crate::ai::SynthesisClient;
use crate::selector::{CandidateMap, MANDATORY_TOPICS, TOPICS};
use crate::types::{Result, TopicId, WikiError};

/// Topic id → reason the topic was selected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Plan {
    entries: BTreeMap<TopicId, String>,
}

impl Plan {
    pub fn get(&self, topic: &str) -> Option<&str> {
        self.entries.get(topic).map(String::as_str)
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.entries.contains_key(topic)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TopicId, &String)> {
        self.entries.iter()
    }

    pub fn topics(&self) -> impl Iterator<Item = &TopicId> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How the final plan was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    Heuristic,
    Refined,
    /// Refinement was attempted and failed
    HeuristicFallback,
}

/// Mandatory topics plus every topic with at least one candidate
pub fn heuristic_plan(candidates: &CandidateMap) -> Plan {
    let mut entries: BTreeMap<TopicId, String> = MANDATORY_TOPICS
        .iter()
        .map(|(id, reason)| (TopicId::from(*id), reason.to_string()))
        .collect();

    for (id, count) in candidates.with_evidence() {
        entries
            .entry(id.clone())
            .or_insert_with(|| format!("Found {} relevant files", count));
    }

    Plan { entries }
}

fn is_plannable(topic: &str) -> bool {
    TOPICS.iter().any(|t| t.id == topic)
}

/// Parse a `{topic_id: reason}` object, tolerating markdown fences
pub fn parse_refinement(text: &str) -> Result<BTreeMap<String, String>> {
    let cleaned = text.trim().replace("```json", "").replace("```", "");
    let object: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(cleaned.trim())?;

    Ok(object
        .into_iter()
        .map(|(id, reason)| {
            let reason = match reason {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (id.trim().to_string(), reason)
        })
        .collect())
}

/// Refined reasons override heuristic ones; heuristic topics are never
/// removed; unknown ids and the overview id are dropped.
pub fn merge_refinement(heuristic: Plan, refined: BTreeMap<String, String>) -> Plan {
    let mut entries = heuristic.entries;
    for (id, reason) in refined {
        if !is_plannable(&id) {
            warn!(topic = %id, "Ignoring unknown topic from plan refinement");
            continue;
        }
        entries.insert(TopicId::new(id), reason);
    }
    Plan { entries }
}

/// Build the plan; `refiner` enables the refinement call
pub async fn plan_documentation(
    ctx: &RunContext,
    refiner: Option<&SynthesisClient>,
) -> (Plan, PlanSource) {
    let heuristic = heuristic_plan(&ctx.candidates);

    let Some(client) = refiner else {
        return (heuristic, PlanSource::Heuristic);
    };

    let request = prompts::refinement_request(ctx);
    let refined = match client.call(&request, "refine plan").await {
        Ok(response) => parse_refinement(&response.content),
        Err(err) => Err(WikiError::Llm(err)),
    };

    match refined {
        Ok(refined) => {
            let plan = merge_refinement(heuristic, refined);
            info!(topics = plan.len(), "Plan refined");
            (plan, PlanSource::Refined)
        }
        Err(err) => {
            warn!(error = %err, "Plan refinement failed, using heuristic plan");
            (heuristic, PlanSource::HeuristicFallback)
        }
    }
}
