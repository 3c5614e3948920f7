//! Repository identifiers: display names, owner/name pairs and blob URLs.

use std::path::Path;

/// Parsed repository identifier (remote URL or local path)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    raw: String,
    owner: Option<String>,
    name: String,
    web_url: Option<String>,
}

impl RepoId {
    pub fn parse(source: &str) -> Self {
        let raw = source.trim().to_string();

        if let Ok(url) = url::Url::parse(&raw)
            && url.has_host()
        {
            let segments: Vec<&str> = url
                .path_segments()
                .map(|s| s.filter(|seg| !seg.is_empty()).collect())
                .unwrap_or_default();
            let name = segments
                .last()
                .map(|s| strip_git_suffix(s).to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| url.host_str().unwrap_or("repository").to_string());
            let owner = segments
                .len()
                .checked_sub(2)
                .map(|i| segments[i].to_string());
            let web_url = matches!(url.scheme(), "http" | "https")
                .then(|| strip_git_suffix(raw.trim_end_matches('/')).to_string());
            return Self {
                raw,
                owner,
                name,
                web_url,
            };
        }

        let path = Path::new(&raw);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "repository".to_string());
        let owner = path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned());
        Self {
            raw,
            owner,
            name: strip_git_suffix(&name).to_string(),
            web_url: None,
        }
    }

    /// The identifier as given
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// `owner/name`, or just the name when there is no owner
    pub fn full_name(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{}/{}", owner, self.name),
            None => self.name.clone(),
        }
    }

    /// Browsable URL, present only for http(s) identifiers
    pub fn web_url(&self) -> Option<&str> {
        self.web_url.as_deref()
    }

    /// `<web-url>/blob/<branch>/`, the prefix for file links
    pub fn blob_base(&self, branch: &str) -> Option<String> {
        self.web_url
            .as_ref()
            .map(|url| format!("{}/blob/{}/", url, branch))
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn strip_git_suffix(s: &str) -> &str {
    s.strip_suffix(".git").unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_url() {
        let id = RepoId::parse("https://github.com/acme/widgets.git");
        assert_eq!(id.name(), "widgets");
        assert_eq!(id.owner(), Some("acme"));
        assert_eq!(id.full_name(), "acme/widgets");
        assert_eq!(
            id.blob_base("main").as_deref(),
            Some("https://github.com/acme/widgets/blob/main/")
        );
    }

    #[test]
    fn test_trailing_slash() {
        let id = RepoId::parse("https://gitlab.com/group/tool/");
        assert_eq!(id.full_name(), "group/tool");
        assert_eq!(id.web_url(), Some("https://gitlab.com/group/tool"));
    }

    #[test]
    fn test_ssh_url_has_no_web_url() {
        let id = RepoId::parse("ssh://git@github.com/acme/widgets.git");
        assert_eq!(id.full_name(), "acme/widgets");
        assert!(id.blob_base("main").is_none());
    }

    #[test]
    fn test_local_path() {
        let id = RepoId::parse("/home/dev/projects/widgets");
        assert_eq!(id.name(), "widgets");
        assert_eq!(id.full_name(), "projects/widgets");
        assert!(id.web_url().is_none());
    }
}
