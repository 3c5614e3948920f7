//! Rewrites project-relative file paths in generated markdown into links.
//!
//! Only text outside fenced code blocks is touched (the document is split on
//! ```` ``` ```` and only even segments are rewritten). Inside those
//! segments, existing markdown links, bare URLs and inline code spans are
//! left alone. A path is linked only when the scan indexed it.

use regex::Regex;
use std::ops::Range;

use super::content::GeneratedContent;
use crate::scanner::FileIndex;
use crate::types::{Result, WikiError};

const FENCE: &str = "```";

/// Candidate path: segments of word characters, dots and dashes joined by
/// `/`, ending in an extension.
const PATH_PATTERN: &str = r"[A-Za-z0-9_.][A-Za-z0-9_./-]*\.[A-Za-z0-9]+";

/// Spans never rewritten: `[text](target)`, URLs and inline code.
const PROTECTED_PATTERN: &str = r"\[[^\]\n]*\]\([^)\n]*\)|<?https?://[^\s)>]+>?|`[^`\n]*`";

pub struct LinkRewriter<'a> {
    index: &'a FileIndex,
    blob_base: String,
    path_re: Regex,
    protected_re: Regex,
}

impl<'a> LinkRewriter<'a> {
    /// `blob_base` is the link prefix, e.g. `https://host/o/r/blob/main/`
    pub fn new(index: &'a FileIndex, blob_base: impl Into<String>) -> Result<Self> {
        let compile =
            |pattern: &str| Regex::new(pattern).map_err(|e| WikiError::Config(e.to_string()));
        Ok(Self {
            index,
            blob_base: blob_base.into(),
            path_re: compile(PATH_PATTERN)?,
            protected_re: compile(PROTECTED_PATTERN)?,
        })
    }

    /// Rewrite one document
    pub fn rewrite(&self, content: &str) -> String {
        content
            .split(FENCE)
            .enumerate()
            .map(|(i, segment)| {
                if i % 2 == 0 {
                    self.rewrite_prose(segment)
                } else {
                    segment.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(FENCE)
    }

    /// Rewrite every document in the map
    pub fn rewrite_all(&self, content: GeneratedContent) -> GeneratedContent {
        content.map_documents(|_, text| self.rewrite(&text))
    }

    fn rewrite_prose(&self, text: &str) -> String {
        let protected: Vec<Range<usize>> =
            self.protected_re.find_iter(text).map(|m| m.range()).collect();

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for m in self.path_re.find_iter(text) {
            if protected.iter().any(|r| r.start < m.end() && m.start() < r.end) {
                continue;
            }
            // Part of a longer token such as `~/src/x.py` or `a@b.md`
            if text[..m.start()]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric() || "/\\@~:".contains(c))
            {
                continue;
            }
            let path = m.as_str().trim_start_matches("./");
            if !self.index.contains(path) {
                continue;
            }
            out.push_str(&text[last..m.start()]);
            out.push_str(&format!("[{}]({}{})", m.as_str(), self.blob_base, path));
            last = m.end();
        }
        out.push_str(&text[last..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::test_support::text_record;

    const BASE: &str = "https://github.com/acme/widgets/blob/main/";

    fn index() -> FileIndex {
        ["src/app.py", "README.md", ".github/workflows/ci.yml", "docs/guide.md"]
            .into_iter()
            .map(|p| text_record(p, 10))
            .collect()
    }

    fn rewrite(text: &str) -> String {
        let index = index();
        LinkRewriter::new(&index, BASE).unwrap().rewrite(text)
    }

    #[test]
    fn test_known_path_becomes_link() {
        assert_eq!(
            rewrite("Entry point is src/app.py."),
            format!("Entry point is [src/app.py]({}src/app.py).", BASE)
        );
    }

    #[test]
    fn test_unknown_path_is_left_alone() {
        assert_eq!(rewrite("See src/missing.py"), "See src/missing.py");
    }

    #[test]
    fn test_fenced_code_is_untouched() {
        let text = "Uses src/app.py\n```python\n# src/app.py\n```\nAlso README.md";
        let out = rewrite(text);
        assert!(out.contains("```python\n# src/app.py\n```"));
        assert!(out.starts_with(&format!("Uses [src/app.py]({}src/app.py)", BASE)));
        assert!(out.ends_with(&format!("Also [README.md]({}README.md)", BASE)));
    }

    #[test]
    fn test_existing_links_and_inline_code_are_untouched() {
        let text = "[guide](docs/guide.md) and `src/app.py` and https://x.io/README.md";
        assert_eq!(rewrite(text), text);
    }

    #[test]
    fn test_dot_directories_are_linked() {
        assert_eq!(
            rewrite("CI lives in .github/workflows/ci.yml"),
            format!(
                "CI lives in [.github/workflows/ci.yml]({}.github/workflows/ci.yml)",
                BASE
            )
        );
    }

    #[test]
    fn test_footnote_definitions_are_linked() {
        assert_eq!(
            rewrite("[^1]: README.md"),
            format!("[^1]: [README.md]({}README.md)", BASE)
        );
    }
}
