//! Prompt Builder
//!
//! Assembles prompts from ordered sections so that every synthesis call in
//! the pipeline shares one layout: role, numbered rules, metadata, then
//! headed content blocks.

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// "You are a {role} {task}."
    Role { role: String, task: String },
    /// Numbered rules
    Rules(Vec<String>),
    /// Ordered key/value metadata
    Context(Vec<(String, String)>),
    /// Headed text block
    Text { header: String, content: String },
    /// Free text
    Custom(String),
}

/// Builder for prompts with a stable section order
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, role: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            role: role.to_string(),
            task: task.to_string(),
        });
        self
    }

    pub fn rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sections
            .push(PromptSection::Rules(rules.into_iter().map(Into::into).collect()));
        self
    }

    /// Add a metadata item; items accumulate in one context block
    pub fn context_item(mut self, key: &str, value: &str) -> Self {
        let item = (key.to_string(), value.to_string());
        match self
            .sections
            .iter_mut()
            .find(|s| matches!(s, PromptSection::Context(_)))
        {
            Some(PromptSection::Context(items)) => items.push(item),
            _ => self.sections.push(PromptSection::Context(vec![item])),
        }
        self
    }

    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: header.to_string(),
            content: content.to_string(),
        });
        self
    }

    /// Add a headed section only when `content` is non-empty
    pub fn section_if(self, header: &str, content: &str) -> Self {
        if content.trim().is_empty() {
            self
        } else {
            self.section(header, content)
        }
    }

    pub fn custom(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Custom(content.to_string()));
        self
    }

    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { role, task } => {
                    prompt.push_str(&format!("You are a {} {}.\n\n", role, task));
                }
                PromptSection::Rules(rules) => {
                    prompt.push_str("Follow these strict rules:\n");
                    for (i, rule) in rules.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, rule));
                    }
                    prompt.push('\n');
                }
                PromptSection::Context(items) => {
                    for (key, value) in items {
                        prompt.push_str(&format!("**{}**: {}\n", key, value));
                    }
                    prompt.push('\n');
                }
                PromptSection::Text { header, content } => {
                    prompt.push_str(&format!("# {}\n\n", header));
                    prompt.push_str(content.trim_end());
                    prompt.push_str("\n\n");
                }
                PromptSection::Custom(content) => {
                    prompt.push_str(content.trim_end());
                    prompt.push_str("\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}
