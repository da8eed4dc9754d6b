use crate::schema::SectionName;

/// Output rules appended to every section prompt.
pub const ANTI_SUMMARY_INSTRUCTIONS: &str = "CRITICAL OUTPUT RULES - YOU MUST FOLLOW THESE:
1. Output ACTUAL section content directly - no meta-commentary
2. Do NOT start with phrases like 'I will create...', 'Here is...', 'I have created...', 'Sure!', 'Great!', etc.
3. Start IMMEDIATELY with the section heading (e.g. '## Executive Summary')
4. Produce ONLY the requested section; do not add other '##' sections
5. Do NOT include phrases like 'based on the context' or 'as requested'
6. Give concrete reasoning for every decision; never leave a subsection empty

WRONG (will be rejected):
  'Here is the executive summary you requested...'
  'Sure! Based on the requirements, I will create...'

CORRECT (start immediately with content):
  ## Executive Summary

  ### Overview

  The platform lets...";

/// Rules for the Mermaid diagram section.
pub const MERMAID_RULES: &str = "MERMAID DIAGRAM RULES:
- Put the diagram in a fenced code block that opens with ```mermaid
- The first line of the diagram must be exactly one of: graph TD, graph LR, flowchart TD, flowchart LR, sequenceDiagram
- NEVER use C4Context, C4Container, C4_Context, C4_Container or any other C4 syntax
- Node shapes: [Rectangle] for components, [(Database)] for databases, {{Diamond}} for decisions, ([Rounded]) for start/end
- Arrows: --> solid, -.-> dotted for monitoring or logging, -->|label| labelled
- Subgraphs with spaces in their names use: subgraph BackendServices[\"Backend Services\"]
- Node IDs must be simple (CDN, API, DB1); avoid parentheses in labels, write 'CDN - CloudFront' instead of 'CDN (CloudFront)'";

/// What the model should cover in a section, beyond its required structure.
#[must_use]
pub fn section_guidance(name: SectionName) -> &'static str {
    match name {
        SectionName::ExecutiveSummary => {
            "Give a brief overview of the solution and the key architectural decisions, \
             written for a non-specialist stakeholder."
        }
        SectionName::ArchitecturePattern => {
            "Name the chosen architecture pattern (microservices, modular monolith, \
             event-driven, serverless, ...), explain in detail why it fits these requirements, \
             and list the alternative patterns considered with the reason each was rejected."
        }
        SectionName::SystemComponents => {
            "Cover every major component: its purpose, the suggested technology or framework, \
             detailed reasoning for that technology choice, and how it interacts with the \
             other components."
        }
        SectionName::TechnologyStack => {
            "Recommend frontend, backend, database and infrastructure/DevOps technologies and \
             explain why each was chosen over the obvious alternatives."
        }
        SectionName::DataArchitecture => {
            "Describe the data storage strategy, how data flows between components, and the \
             caching strategy."
        }
        SectionName::NonFunctionalRequirements => {
            "Explain the approach to scalability, security, performance optimization and \
             reliability/fault tolerance, tying each back to the stated requirements."
        }
        SectionName::DeploymentStrategy => {
            "Describe the deployment architecture, the CI/CD pipeline approach and the \
             environment strategy (development, staging, production)."
        }
        SectionName::IntegrationPoints => {
            "List the external systems to integrate with, the API design approach, and the \
             authentication and authorization strategy."
        }
        SectionName::TradeOffs => {
            "State the key trade-offs made, the main risks with their mitigations, and \
             considerations for future growth."
        }
        SectionName::ArchitectureDiagram => {
            "Describe the overall system architecture in prose, then draw it as a single \
             Mermaid diagram showing clients, services, data stores and their connections."
        }
    }
}
