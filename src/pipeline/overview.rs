//! System overview page (`000`) and the index summary sections, both
//! synthesized from the file inventory and the generated documents.

use tracing::{info, warn};

use super::content::{GeneratedContent, placeholder};
use super::context::RunContext;
use super::prompts::{self, truncate_chars};
use crate::ai::{SynthesisClient, TokenUsage};
use crate::selector::OVERVIEW_TOPIC;

/// Overview text plus usage; failures yield a placeholder
#[derive(Debug, Clone)]
pub struct Overview {
    pub content: String,
    pub usage: TokenUsage,
    pub failed: bool,
}

/// Head of all documents as `## <id>` sections, capped at `max_chars`
pub fn documents_head(documents: &GeneratedContent, max_chars: usize) -> String {
    let joined = documents
        .iter()
        .map(|(id, content)| format!("## {}\n{}", id, content))
        .collect::<Vec<_>>()
        .join("\n\n");
    truncate_chars(&joined, max_chars).to_string()
}

pub async fn generate_overview(
    ctx: &RunContext,
    documents: &GeneratedContent,
    client: &SynthesisClient,
    max_inventory: usize,
    max_doc_chars: usize,
) -> Overview {
    let head = documents_head(documents, max_doc_chars);
    let request = prompts::overview_request(ctx, &head, max_inventory);

    match client.call(&request, "generate overview").await {
        Ok(response) => {
            info!("System overview generated");
            Overview {
                content: response.content,
                usage: response.usage,
                failed: false,
            }
        }
        Err(err) => {
            warn!(error = %err, "System overview generation failed");
            Overview {
                content: placeholder(OVERVIEW_TOPIC, &err.to_string()),
                usage: TokenUsage::default(),
                failed: true,
            }
        }
    }
}

/// Summary sections for the top of `index.md`
#[derive(Debug, Clone)]
pub struct IndexSections {
    pub content: String,
    pub usage: TokenUsage,
}

/// Ask for the index summary sections. On failure the plain index is kept,
/// so there is no placeholder.
pub async fn enhance_index(
    ctx: &RunContext,
    documents: &GeneratedContent,
    client: &SynthesisClient,
    max_inventory: usize,
    max_doc_chars: usize,
) -> Option<IndexSections> {
    let head = documents_head(documents, max_doc_chars);
    let request = prompts::index_sections_request(ctx, &head, max_inventory);

    match client.call(&request, "enhance index").await {
        Ok(response) => {
            info!("Documentation index enhanced");
            Some(IndexSections {
                content: response.content.trim().to_string(),
                usage: response.usage,
            })
        }
        Err(err) => {
            warn!(error = %err, "Index enhancement failed, keeping plain index");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::CallSettings;
    use crate::ai::provider::testing::ScriptedProvider;
    use crate::config::ScanConfig;
    use crate::pipeline::content::is_placeholder;
    use crate::scanner::scan_repository;
    use crate::source::{CheckoutInfo, RepoId};
    use crate::types::{TopicId, WikiError};
    use std::fs;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> RunContext {
        fs::write(dir.path().join("README.md"), "# Widgets\n").unwrap();
        let scan = scan_repository(dir.path(), &ScanConfig::default()).unwrap();
        RunContext::new(
            RepoId::parse("https://github.com/acme/widgets"),
            CheckoutInfo::unknown(),
            scan,
        )
    }

    fn client(provider: ScriptedProvider) -> SynthesisClient {
        SynthesisClient::new(
            Arc::new(provider),
            CallSettings {
                timeout: Duration::from_secs(1),
                max_retries: 0,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(1),
            },
        )
    }

    fn documents() -> GeneratedContent {
        [
            (TopicId::from("100"), "# Architecture\nlong text".to_string()),
            (TopicId::from("200"), "# Domain".to_string()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_documents_head_is_capped() {
        let head = documents_head(&documents(), 20);
        assert_eq!(head, "## 100\n# Architectur");

        let full = documents_head(&documents(), 1000);
        assert_eq!(full, "## 100\n# Architecture\nlong text\n\n## 200\n# Domain");
    }

    #[tokio::test]
    async fn test_overview_success() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let provider = Arc::new(ScriptedProvider::new(|_| {
            Ok("# System Overview\n".to_string())
        }));
        let client = SynthesisClient::new(
            provider.clone(),
            CallSettings {
                timeout: Duration::from_secs(1),
                ..CallSettings::default()
            },
        );

        let overview = generate_overview(&ctx, &documents(), &client, 2000, 8000).await;
        assert!(!overview.failed);
        assert_eq!(overview.content, "# System Overview\n");
        let request = &provider.requests()[0];
        assert!(request.user.contains("- README.md | md |"));
        assert!(request.user.contains("## 200\n# Domain"));
    }

    #[tokio::test]
    async fn test_overview_failure_is_placeholder() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let client = client(ScriptedProvider::new(|_| {
            Err(WikiError::LlmApi("service unavailable".to_string()))
        }));

        let overview = generate_overview(&ctx, &documents(), &client, 2000, 8000).await;
        assert!(overview.failed);
        assert!(is_placeholder(&overview.content));
    }

    #[tokio::test]
    async fn test_index_sections_are_trimmed() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let provider = Arc::new(ScriptedProvider::new(|_| {
            Ok("\n## Purpose and Scope\n\nWidgets.\n\n".to_string())
        }));
        let client = SynthesisClient::new(
            provider.clone(),
            CallSettings {
                timeout: Duration::from_secs(1),
                ..CallSettings::default()
            },
        );

        let sections = enhance_index(&ctx, &documents(), &client, 2000, 12).await.unwrap();
        assert_eq!(sections.content, "## Purpose and Scope\n\nWidgets.");
        let request = &provider.requests()[0];
        assert!(request.user.contains("## 100\n# Arch"));
        assert!(!request.user.contains("## 100\n# Architecture"));
    }

    #[tokio::test]
    async fn test_index_enhancement_failure_keeps_plain_index() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let client = client(ScriptedProvider::new(|_| {
            Err(WikiError::LlmApi("service unavailable".to_string()))
        }));

        assert!(enhance_index(&ctx, &documents(), &client, 2000, 4000).await.is_none());
    }
}
