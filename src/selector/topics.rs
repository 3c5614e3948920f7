//! Documentation topic taxonomy and the heuristic rules that feed it.

use crate::types::TopicId;

/// A documentation topic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topic {
    pub id: &'static str,
    pub title: &'static str,
    pub slug: &'static str,
    pub description: &'static str,
}

impl Topic {
    pub fn topic_id(&self) -> TopicId {
        TopicId::from(self.id)
    }

    /// Output file name, e.g. `100-architecture-overview.md`
    pub fn file_name(&self) -> String {
        format!("{}-{}.md", self.id, self.slug)
    }
}

/// Topic that accepts every text file
pub const CATCH_ALL_TOPIC: &str = "980";

/// Reserved for the generated system overview; never planned
pub const OVERVIEW_TOPIC: &str = "000";

/// Topics planned regardless of evidence, with their reasons
pub const MANDATORY_TOPICS: &[(&str, &str)] = &[
    ("100", "Always generate architecture overview"),
    ("200", "Always generate business/domain overview"),
    ("900", "Always generate CI/CD overview"),
];

pub const OVERVIEW: Topic = Topic {
    id: OVERVIEW_TOPIC,
    title: "System Overview",
    slug: "system-overview",
    description: "Index and high-level summary of all generated documents",
};

pub const TOPICS: &[Topic] = &[
    Topic {
        id: "100",
        title: "Architecture Overview",
        slug: "architecture-overview",
        description: "High-level components, interaction and architectural style",
    },
    Topic {
        id: "101",
        title: "System Router",
        slug: "system-router",
        description: "Entrypoints and routing logic",
    },
    Topic {
        id: "200",
        title: "Business Domain Overview",
        slug: "business-domain-overview",
        description: "Entities, flows and business rules",
    },
    Topic {
        id: "311",
        title: "REST API Endpoints",
        slug: "rest-api-endpoints",
        description: "Table of endpoints, purposes and semantics",
    },
    Topic {
        id: "330",
        title: "Event Topics",
        slug: "event-topics",
        description: "Message topics, producers and consumers",
    },
    Topic {
        id: "421",
        title: "Main Entity Schema",
        slug: "main-entity-schema",
        description: "ER diagrams and key entities",
    },
    Topic {
        id: "500",
        title: "Key Dependencies",
        slug: "key-dependencies",
        description: "Internal services and third-party libraries",
    },
    Topic {
        id: "600",
        title: "Config and Environments",
        slug: "config-and-environments",
        description: "Config files, variables and secrets management",
    },
    Topic {
        id: "701",
        title: "Authentication Model",
        slug: "authentication-model",
        description: "Mechanisms and permissions",
    },
    Topic {
        id: "720",
        title: "Testing & Quality",
        slug: "testing-and-quality",
        description: "Test strategy, coverage gates and tooling",
    },
    Topic {
        id: "740",
        title: "Security Posture",
        slug: "security-posture",
        description: "AuthZ hooks, scanners and secrets handling",
    },
    Topic {
        id: "760",
        title: "Performance & Scalability",
        slug: "performance-and-scalability",
        description: "Caching, concurrency and throttling",
    },
    Topic {
        id: "780",
        title: "Data & Migrations",
        slug: "data-and-migrations",
        description: "Schema evolution, migrations and data jobs",
    },
    Topic {
        id: "800",
        title: "Observability Overview",
        slug: "observability-overview",
        description: "Logs, metrics and health checks",
    },
    Topic {
        id: "850",
        title: "Runbook Operations",
        slug: "runbook-operations",
        description: "Failure modes, debugging and restarts",
    },
    Topic {
        id: "900",
        title: "CI/CD Pipeline",
        slug: "ci-cd-pipeline",
        description: "Build, test and deploy",
    },
    Topic {
        id: "930",
        title: "Risks and Decisions",
        slug: "risks-and-decisions",
        description: "ADRs, limitations and trade-offs",
    },
    Topic {
        id: "980",
        title: "RAG Indexing Guidelines",
        slug: "rag-indexing-guidelines",
        description: "Tags, questions and clustering for retrieval",
    },
];

/// Look up a planned topic (or the overview) by id
pub fn topic(id: &str) -> Option<&'static Topic> {
    if id == OVERVIEW_TOPIC {
        return Some(&OVERVIEW);
    }
    TOPICS.iter().find(|t| t.id == id)
}

/// Taxonomy rendered as `id - title (description)` lines for prompts
pub fn taxonomy_listing() -> String {
    std::iter::once(&OVERVIEW)
        .chain(TOPICS.iter())
        .map(|t| format!("{} - {} ({})", t.id, t.title, t.description))
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// Rules
// =============================================================================

/// Predicate over a lowercased path and extension
#[derive(Debug, Clone, Copy)]
pub struct TopicRule {
    pub topic: &'static str,
    /// Substrings of the lowercased path
    pub keywords: &'static [&'static str],
    /// Lowercased extensions without the dot
    pub extensions: &'static [&'static str],
}

impl TopicRule {
    pub fn matches(&self, lower_path: &str, extension: Option<&str>) -> bool {
        self.keywords.iter().any(|k| lower_path.contains(k))
            || extension.is_some_and(|ext| self.extensions.contains(&ext))
    }
}

pub const RULES: &[TopicRule] = &[
    TopicRule {
        topic: "100",
        keywords: &[
            "readme",
            "architecture",
            "docker-compose",
            "dockerfile",
            "main.",
            "app.",
            "index.",
            "design",
        ],
        extensions: &[],
    },
    TopicRule {
        topic: "101",
        keywords: &["router", "routes", "routing", "urls.py", "server.", "gateway", "main."],
        extensions: &[],
    },
    TopicRule {
        topic: "200",
        keywords: &["domain", "model", "entity", "entities", "service", "usecase", "business"],
        extensions: &[],
    },
    TopicRule {
        topic: "311",
        keywords: &["api", "controller", "endpoint", "handler", "openapi", "swagger", "routes"],
        extensions: &[],
    },
    TopicRule {
        topic: "330",
        keywords: &[
            "event",
            "kafka",
            "rabbit",
            "queue",
            "topic",
            "pubsub",
            "consumer",
            "producer",
            "sns",
            "sqs",
        ],
        extensions: &[],
    },
    TopicRule {
        topic: "421",
        keywords: &["schema", "model", "entity", "entities", "migration"],
        extensions: &["sql", "prisma", "graphql", "proto"],
    },
    TopicRule {
        topic: "500",
        keywords: &[
            "requirements",
            "package.json",
            "cargo.toml",
            "go.mod",
            "pom.xml",
            "build.gradle",
            "pyproject.toml",
            "gemfile",
            "composer.json",
            "setup.py",
        ],
        extensions: &["lock"],
    },
    TopicRule {
        topic: "600",
        keywords: &["config", "settings", "env", ".properties", "values"],
        extensions: &["ini", "cfg", "conf", "toml", "yaml", "yml", "properties"],
    },
    TopicRule {
        topic: "701",
        keywords: &["auth", "login", "jwt", "oauth", "token", "permission", "session", "rbac"],
        extensions: &[],
    },
    TopicRule {
        topic: "720",
        keywords: &["test", "spec.", "pytest", "jest", "coverage", "tox.ini", "conftest"],
        extensions: &[],
    },
    TopicRule {
        topic: "740",
        keywords: &["security", "auth", "secret", "crypto", "policy", "sanitize", "csrf", "cors"],
        extensions: &[],
    },
    TopicRule {
        topic: "760",
        keywords: &[
            "cache",
            "perf",
            "benchmark",
            "bench",
            "pool",
            "worker",
            "concurren",
            "throttl",
            "rate",
        ],
        extensions: &[],
    },
    TopicRule {
        topic: "780",
        keywords: &["migration", "migrate", "alembic", "flyway", "liquibase", "seed", "etl"],
        extensions: &["sql"],
    },
    TopicRule {
        topic: "800",
        keywords: &[
            "log",
            "metric",
            "monitor",
            "health",
            "tracing",
            "telemetry",
            "prometheus",
            "grafana",
            "sentry",
        ],
        extensions: &[],
    },
    TopicRule {
        topic: "850",
        keywords: &[
            "runbook",
            "ops",
            "scripts/",
            "deploy",
            "k8s",
            "helm",
            "makefile",
            "procfile",
            "troubleshoot",
        ],
        extensions: &["sh"],
    },
    TopicRule {
        topic: "900",
        keywords: &[
            ".github/workflows",
            ".gitlab-ci",
            "jenkinsfile",
            "azure-pipelines",
            "bitbucket-pipelines",
            ".circleci",
            "makefile",
            "dockerfile",
        ],
        extensions: &[],
    },
    TopicRule {
        topic: "930",
        keywords: &["adr", "decision", "changelog", "todo", "risk", "limitation"],
        extensions: &[],
    },
];
