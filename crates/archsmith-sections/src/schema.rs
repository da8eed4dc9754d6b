use serde::{Deserialize, Serialize};
use std::fmt;

/// The ten sections of an architecture document, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionName {
    ExecutiveSummary,
    ArchitecturePattern,
    SystemComponents,
    TechnologyStack,
    DataArchitecture,
    NonFunctionalRequirements,
    DeploymentStrategy,
    IntegrationPoints,
    TradeOffs,
    ArchitectureDiagram,
}

impl SectionName {
    /// Every section in document order.
    pub const ALL: [SectionName; 10] = [
        Self::ExecutiveSummary,
        Self::ArchitecturePattern,
        Self::SystemComponents,
        Self::TechnologyStack,
        Self::DataArchitecture,
        Self::NonFunctionalRequirements,
        Self::DeploymentStrategy,
        Self::IntegrationPoints,
        Self::TradeOffs,
        Self::ArchitectureDiagram,
    ];

    /// Heading text used in generated documents.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::ExecutiveSummary => "Executive Summary",
            Self::ArchitecturePattern => "Architecture Pattern & Reasoning",
            Self::SystemComponents => "System Components",
            Self::TechnologyStack => "Technology Stack",
            Self::DataArchitecture => "Data Architecture",
            Self::NonFunctionalRequirements => "Non-Functional Requirements",
            Self::DeploymentStrategy => "Deployment Strategy",
            Self::IntegrationPoints => "Integration Points",
            Self::TradeOffs => "Trade-offs",
            Self::ArchitectureDiagram => "Architecture Diagram Description",
        }
    }

    /// Stable machine identifier, also used in model task labels.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::ExecutiveSummary => "executive-summary",
            Self::ArchitecturePattern => "architecture-pattern",
            Self::SystemComponents => "system-components",
            Self::TechnologyStack => "technology-stack",
            Self::DataArchitecture => "data-architecture",
            Self::NonFunctionalRequirements => "non-functional-requirements",
            Self::DeploymentStrategy => "deployment-strategy",
            Self::IntegrationPoints => "integration-points",
            Self::TradeOffs => "trade-offs",
            Self::ArchitectureDiagram => "architecture-diagram",
        }
    }

    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.slug() == slug)
    }

    /// 1-based position in the document.
    #[must_use]
    pub fn number(self) -> usize {
        Self::ALL
            .iter()
            .position(|s| *s == self)
            .map_or(0, |i| i + 1)
    }

    #[must_use]
    pub fn schema(self) -> SectionSchema {
        SectionSchema::for_section(self)
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// What a section body must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionShape {
    /// `### <Subsection>` headings, each with non-empty content.
    Subsections(&'static [&'static str]),
    /// At least one `### <Component>` entry, each carrying `**Field:** value` lines.
    Components(&'static [&'static str]),
    /// Subsections plus a fenced `mermaid` block with an allowed diagram type.
    Diagram(&'static [&'static str]),
}

/// Required structure for one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSchema {
    pub name: SectionName,
    pub shape: SectionShape,
}

/// Subsections or fields whose content is reasoning; empty ones are reported as
/// `EmptyReasoning` rather than missing content.
pub(crate) const REASONING_LABELS: &[&str] = &["Reasoning"];

impl SectionSchema {
    #[must_use]
    pub const fn for_section(name: SectionName) -> Self {
        let shape = match name {
            SectionName::ExecutiveSummary => SectionShape::Subsections(&["Overview", "Key Decisions"]),
            SectionName::ArchitecturePattern => {
                SectionShape::Subsections(&["Pattern", "Reasoning", "Alternatives Considered"])
            }
            SectionName::SystemComponents => {
                SectionShape::Components(&["Purpose", "Technology", "Reasoning", "Interactions"])
            }
            SectionName::TechnologyStack => SectionShape::Subsections(&[
                "Frontend",
                "Backend",
                "Database",
                "Infrastructure",
                "Reasoning",
            ]),
            SectionName::DataArchitecture => {
                SectionShape::Subsections(&["Storage Strategy", "Data Flow", "Caching Strategy"])
            }
            SectionName::NonFunctionalRequirements => SectionShape::Subsections(&[
                "Scalability",
                "Security",
                "Performance",
                "Reliability",
            ]),
            SectionName::DeploymentStrategy => SectionShape::Subsections(&[
                "Deployment Architecture",
                "CI/CD Pipeline",
                "Environments",
            ]),
            SectionName::IntegrationPoints => SectionShape::Subsections(&[
                "External Integrations",
                "API Design",
                "Authentication & Authorization",
            ]),
            SectionName::TradeOffs => SectionShape::Subsections(&[
                "Key Trade-offs",
                "Risks & Mitigations",
                "Future Considerations",
            ]),
            SectionName::ArchitectureDiagram => SectionShape::Diagram(&["Description"]),
        };
        Self { name, shape }
    }

    /// Human-readable structure description embedded in generation prompts.
    #[must_use]
    pub fn describe(&self) -> String {
        let title = self.name.title();
        let mut out = format!("Start with the heading `## {title}`.\n");
        match self.shape {
            SectionShape::Subsections(subs) => {
                out.push_str("Then include these `###` subsections, in order, each with substantive content:\n");
                for sub in subs {
                    out.push_str(&format!("- ### {sub}\n"));
                }
            }
            SectionShape::Components(fields) => {
                out.push_str(
                    "Then describe each major component under its own `### <Component Name>` heading, \
                     with one line per field in the form `**Field:** value`:\n",
                );
                for field in fields {
                    out.push_str(&format!("- **{field}:**\n"));
                }
            }
            SectionShape::Diagram(subs) => {
                for sub in subs {
                    out.push_str(&format!("Include a `### {sub}` subsection explaining the diagram.\n"));
                }
                out.push_str(
                    "Then include one fenced ```mermaid block whose first line is `graph TD`, \
                     `graph LR`, `flowchart TD`, `flowchart LR` or `sequenceDiagram`.\n",
                );
            }
        }
        out
    }

    /// A minimal response that satisfies this schema, each slot filled by `fill(label)`.
    #[must_use]
    pub fn skeleton(&self, fill: impl Fn(&str) -> String) -> String {
        let mut out = format!("## {}\n\n", self.name.title());
        match self.shape {
            SectionShape::Subsections(subs) => {
                for sub in subs {
                    out.push_str(&format!("### {sub}\n\n{}\n\n", fill(sub)));
                }
            }
            SectionShape::Components(fields) => {
                for component in ["Web Application", "Core API Service", "Primary Database"] {
                    out.push_str(&format!("### {component}\n\n"));
                    for field in fields {
                        out.push_str(&format!("**{field}:** {}\n\n", fill(field)));
                    }
                }
            }
            SectionShape::Diagram(subs) => {
                for sub in subs {
                    out.push_str(&format!("### {sub}\n\n{}\n\n", fill(sub)));
                }
                out.push_str(
                    "```mermaid\ngraph TD\n    User[User] --> Web[Web Application]\n    \
                     Web -->|HTTPS| API[Core API Service]\n    API --> DB[(Primary Database)]\n```\n",
                );
            }
        }
        out.trim_end().to_string()
    }
}
