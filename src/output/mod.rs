//! Document writer
//!
//! Persists a run's documents as markdown under
//! `<output>/<run_id>/<owner>/<repo>/docs/`, one file per topic plus an
//! `index.md`, optionally headed by generated summary sections. Any
//! filesystem failure is fatal for the run.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::pipeline::GeneratedContent;
use crate::selector::{self, OVERVIEW_TOPIC};
use crate::source::RepoId;
use crate::types::{Result, WikiError};

/// Everything the writer needs for one run
#[derive(Debug, Clone, Copy)]
pub struct WriteRequest<'a> {
    pub run_id: &'a str,
    pub repo: &'a RepoId,
    pub documents: &'a GeneratedContent,
    pub overview: Option<&'a str>,
    /// Markdown placed above the document list in `index.md`
    pub index_sections: Option<&'a str>,
}

/// Files produced by a write
#[derive(Debug, Clone, Default)]
pub struct WrittenDocs {
    pub docs_dir: PathBuf,
    /// Paths relative to the run directory, index first
    pub files: Vec<String>,
}

pub trait DocumentWriter: Send + Sync {
    fn write(&self, request: &WriteRequest<'_>) -> Result<WrittenDocs>;
}

/// Writes markdown files below a base output directory
#[derive(Debug, Clone)]
pub struct MarkdownWriter {
    base_dir: PathBuf,
}

impl MarkdownWriter {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// `<base>/<run_id>/<owner>/<repo>/docs`
    pub fn docs_dir(&self, run_id: &str, repo: &RepoId) -> PathBuf {
        let mut dir = self.base_dir.join(run_id);
        if let Some(owner) = repo.owner() {
            dir.push(owner);
        }
        dir.join(repo.name()).join("docs")
    }

    fn write_file(path: &Path, content: &str) -> Result<()> {
        fs::write(path, content).map_err(|e| WikiError::output(path, e))
    }
}

/// `100-architecture-overview.md`; unknown ids fall back to a generic slug
pub fn document_file_name(topic: &str) -> String {
    selector::topic(topic)
        .map(|t| t.file_name())
        .unwrap_or_else(|| format!("{}-misc-doc.md", topic))
}

fn document_title(topic: &str) -> String {
    selector::topic(topic)
        .map(|t| t.title.to_string())
        .unwrap_or_else(|| format!("Document {}", topic))
}

/// Markdown index listing every written document by title
pub fn render_index(repo_name: &str, topics: &[&str]) -> String {
    let mut index = format!("# Documentation Index\n\n**Repository:** {}\n\n", repo_name);
    for topic in topics {
        index.push_str(&format!(
            "- [{}]({})\n",
            document_title(topic),
            document_file_name(topic)
        ));
    }
    index
}

impl DocumentWriter for MarkdownWriter {
    fn write(&self, request: &WriteRequest<'_>) -> Result<WrittenDocs> {
        let docs_dir = self.docs_dir(request.run_id, request.repo);
        fs::create_dir_all(&docs_dir).map_err(|e| WikiError::output(&docs_dir, e))?;
        info!(dir = %docs_dir.display(), documents = request.documents.len(), "Writing documents");

        let mut files = Vec::with_capacity(request.documents.len() + 2);
        let mut listed: Vec<&str> = Vec::with_capacity(request.documents.len() + 1);

        if let Some(overview) = request.overview {
            let name = document_file_name(OVERVIEW_TOPIC);
            Self::write_file(&docs_dir.join(&name), overview)?;
            files.push(format!("docs/{}", name));
            listed.push(OVERVIEW_TOPIC);
        }

        for (topic, content) in request.documents.iter() {
            let name = document_file_name(topic.as_str());
            Self::write_file(&docs_dir.join(&name), content)?;
            debug!(topic = %topic, file = %name, "Document written");
            files.push(format!("docs/{}", name));
            listed.push(topic.as_str());
        }

        let mut index = render_index(request.repo.name(), &listed);
        if let Some(sections) = request.index_sections {
            index = format!("{}\n\n{}", sections, index);
        }
        Self::write_file(&docs_dir.join("index.md"), &index)?;
        files.insert(0, "docs/index.md".to_string());

        Ok(WrittenDocs { docs_dir, files })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TopicId;
    use tempfile::TempDir;

    fn documents() -> GeneratedContent {
        [
            (TopicId::from("900"), "# CI/CD Pipeline\n".to_string()),
            (TopicId::from("100"), "# Architecture Overview\n".to_string()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_layout_and_index() {
        let dir = TempDir::new().unwrap();
        let writer = MarkdownWriter::new(dir.path());
        let repo = RepoId::parse("https://github.com/acme/widgets.git");
        let docs = documents();

        let written = writer
            .write(&WriteRequest {
                run_id: "run-1",
                repo: &repo,
                documents: &docs,
                overview: Some("# System Overview\n"),
                index_sections: None,
            })
            .unwrap();

        let expected_dir = dir.path().join("run-1/acme/widgets/docs");
        assert_eq!(written.docs_dir, expected_dir);
        assert_eq!(
            written.files,
            vec![
                "docs/index.md",
                "docs/000-system-overview.md",
                "docs/100-architecture-overview.md",
                "docs/900-ci-cd-pipeline.md",
            ]
        );
        assert_eq!(
            fs::read_to_string(expected_dir.join("100-architecture-overview.md")).unwrap(),
            "# Architecture Overview\n"
        );

        let index = fs::read_to_string(expected_dir.join("index.md")).unwrap();
        assert!(index.starts_with("# Documentation Index\n\n**Repository:** widgets\n"));
        assert!(index.contains("- [System Overview](000-system-overview.md)\n"));
        assert!(index.contains("- [CI/CD Pipeline](900-ci-cd-pipeline.md)\n"));
    }

    #[test]
    fn test_index_sections_precede_document_list() {
        let dir = TempDir::new().unwrap();
        let writer = MarkdownWriter::new(dir.path());
        let repo = RepoId::parse("https://github.com/acme/widgets");

        let written = writer
            .write(&WriteRequest {
                run_id: "run-2",
                repo: &repo,
                documents: &documents(),
                overview: None,
                index_sections: Some("## Purpose and Scope\n\nWidgets."),
            })
            .unwrap();

        let index = fs::read_to_string(written.docs_dir.join("index.md")).unwrap();
        let head = "## Purpose and Scope\n\nWidgets.\n\n# Documentation Index\n\n";
        assert!(index.starts_with(head));
        assert!(index.contains("- [Architecture Overview](100-architecture-overview.md)\n"));
        assert_eq!(written.files.len(), 3);
    }

    #[test]
    fn test_unwritable_target_is_fatal() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, "not a directory").unwrap();

        let writer = MarkdownWriter::new(&blocker);
        let repo = RepoId::parse("https://github.com/acme/widgets");
        let err = writer
            .write(&WriteRequest {
                run_id: "run-1",
                repo: &repo,
                documents: &documents(),
                overview: None,
                index_sections: None,
            })
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_unknown_topic_file_name() {
        assert_eq!(document_file_name("555"), "555-misc-doc.md");
    }
}
