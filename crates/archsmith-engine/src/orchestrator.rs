//! Per-section generation with validation, retry and fallback
//!
//! Sections are generated one at a time in document order. Each section gets
//! up to `max_attempts` model calls; a response that fails validation, a
//! timeout or a transient provider failure consumes one attempt, and the next
//! prompt carries the previous attempt's failure reasons. A section that never
//! validates gets a deterministic placeholder and generation moves on.

use std::sync::Arc;
use std::time::Duration;

use archsmith_config::Config;
use archsmith_llm::{LlmBackend, LlmError, LlmInvocation, LlmResult, PromptTemplate, section_task};
use archsmith_packet::ContextBundle;
use archsmith_sections::{
    ANTI_SUMMARY_INSTRUCTIONS, MERMAID_RULES, SectionName, section_guidance, validate_section,
};
use archsmith_utils::logging::redact_error_message;
use tracing::{debug, info, warn};

use crate::result::{AttemptFailure, SectionResult, SectionStatus};

/// Marker line that opens every fallback placeholder.
pub const FALLBACK_MARKER: &str =
    "> **Placeholder:** this section could not be generated automatically. \
     The outline below shows what it should cover.";

#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub template: PromptTemplate,
    pub max_attempts: u32,
    pub timeout: Duration,
    /// Linear backoff unit; the wait after attempt `n` is `n × backoff`
    pub backoff: Duration,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            template: PromptTemplate::Default,
            max_attempts: 3,
            timeout: Duration::from_secs(120),
            backoff: Duration::from_millis(500),
            max_output_tokens: 8192,
            temperature: 0.3,
        }
    }
}

impl GenerationSettings {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` for an unknown prompt template
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let generation = &config.generation;
        Ok(Self {
            template: archsmith_llm::prompt_template(config)?,
            max_attempts: generation.max_attempts.max(1),
            timeout: generation.timeout(),
            backoff: Duration::from_millis(generation.backoff_ms),
            max_output_tokens: generation.max_output_tokens,
            temperature: generation.temperature,
        })
    }

    fn backoff_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

pub struct GenerationOrchestrator {
    backend: Arc<dyn LlmBackend>,
    settings: GenerationSettings,
}

impl GenerationOrchestrator {
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, settings: GenerationSettings) -> Self {
        Self { backend, settings }
    }

    #[must_use]
    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Generate every section in document order.
    ///
    /// Always returns one resolved result per section.
    pub async fn generate_all(&self, session_id: &str, bundle: &ContextBundle) -> Vec<SectionResult> {
        let mut results: Vec<SectionResult> = Vec::with_capacity(SectionName::ALL.len());
        for name in SectionName::ALL {
            let result = self
                .generate_section(session_id, name, bundle, &results)
                .await;
            results.push(result);
        }
        results
    }

    /// Generate one section. `prior` holds the results of earlier sections.
    pub async fn generate_section(
        &self,
        session_id: &str,
        name: SectionName,
        bundle: &ContextBundle,
        prior: &[SectionResult],
    ) -> SectionResult {
        let pending = SectionResult::pending(name);
        let mut failures: Vec<AttemptFailure> = Vec::new();
        let mut attempts_made = 0;

        for attempt in 1..=self.settings.max_attempts {
            attempts_made = attempt;
            let guidance = failures.last().map(|f| f.reasons.as_slice()).unwrap_or_default();
            let invocation = self.build_invocation(session_id, name, bundle, prior, guidance, attempt);

            debug!(session_id, section = name.slug(), attempt, "Requesting section");

            let reasons = match self.invoke(invocation).await {
                Ok(result) => match validate_section(name, &result.raw_response) {
                    Ok(content) => {
                        info!(
                            session_id,
                            section = name.slug(),
                            attempt,
                            bytes = content.len(),
                            "Section validated"
                        );
                        return pending.into_valid(content, attempt, failures);
                    }
                    Err(issues) => issues.iter().map(ToString::to_string).collect(),
                },
                Err(err) => {
                    let reason = redact_error_message(&err.to_string());
                    if !err.is_retryable() {
                        warn!(
                            session_id,
                            section = name.slug(),
                            attempt,
                            error = %reason,
                            "Non-retryable model failure; using placeholder"
                        );
                        failures.push(AttemptFailure {
                            attempt,
                            reasons: vec![reason],
                        });
                        break;
                    }
                    vec![reason]
                }
            };

            warn!(
                session_id,
                section = name.slug(),
                attempt,
                reasons = %reasons.join("; "),
                "Section attempt rejected"
            );
            failures.push(AttemptFailure { attempt, reasons });

            if attempt < self.settings.max_attempts {
                tokio::time::sleep(self.settings.backoff_after(attempt)).await;
            }
        }

        warn!(
            session_id,
            section = name.slug(),
            attempts = attempts_made,
            "Section fell back to placeholder"
        );
        pending.into_fallback(placeholder(name), attempts_made, failures)
    }

    async fn invoke(&self, invocation: LlmInvocation) -> Result<LlmResult, LlmError> {
        let duration = self.settings.timeout;
        match tokio::time::timeout(duration, self.backend.invoke(invocation)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout { duration }),
        }
    }

    fn build_invocation(
        &self,
        session_id: &str,
        name: SectionName,
        bundle: &ContextBundle,
        prior: &[SectionResult],
        guidance: &[String],
        attempt: u32,
    ) -> LlmInvocation {
        let instructions = section_instructions(name, guidance);
        let context = section_context(bundle, prior);
        let messages = self.settings.template.build_messages(&instructions, &context);

        LlmInvocation::new(
            session_id,
            section_task(name.slug()),
            "",
            self.settings.timeout,
            messages,
        )
        .with_max_tokens(self.settings.max_output_tokens)
        .with_temperature(self.settings.temperature)
        .with_metadata("attempt", serde_json::json!(attempt))
    }
}

fn section_instructions(name: SectionName, guidance: &[String]) -> String {
    let mut out = format!(
        "Write the \"{}\" section (section {} of {}) of a solution architecture document \
         for the system described in the context packet.\n\n{}\n\nRequired structure:\n{}\n{}",
        name.title(),
        name.number(),
        SectionName::ALL.len(),
        section_guidance(name),
        name.schema().describe(),
        ANTI_SUMMARY_INSTRUCTIONS,
    );

    if name == SectionName::ArchitectureDiagram {
        out.push_str("\n\n");
        out.push_str(MERMAID_RULES);
    }

    if !guidance.is_empty() {
        out.push_str("\n\nYour previous attempt was rejected for these reasons:\n");
        for reason in guidance {
            out.push_str("- ");
            out.push_str(reason);
            out.push('\n');
        }
        out.push_str("Fix every listed problem in this attempt.");
    }

    out
}

/// Rendered bundle followed by as many earlier valid sections as fit the
/// bundle's unused budget.
fn section_context(bundle: &ContextBundle, prior: &[SectionResult]) -> String {
    let mut context = bundle.render();
    let mut headroom = bundle.remaining_headroom();
    let mut included = Vec::new();

    for section in prior.iter().filter(|s| s.status() == SectionStatus::Valid) {
        let len = section.content().len();
        if len > headroom {
            break;
        }
        headroom -= len;
        included.push(section.content());
    }

    if !included.is_empty() {
        context.push_str("\n## Previously Generated Sections\n\nKeep the new section consistent with these.\n\n");
        context.push_str(&included.join("\n\n"));
        context.push('\n');
    }
    context
}

/// Deterministic stand-in for a section that could not be generated.
#[must_use]
pub fn placeholder(name: SectionName) -> String {
    let outline = name
        .schema()
        .skeleton(|_| "_Not generated; complete manually._".to_string());
    match outline.split_once('\n') {
        Some((heading, rest)) => format!("{heading}\n\n{FALLBACK_MARKER}\n{rest}"),
        None => format!("{outline}\n\n{FALLBACK_MARKER}"),
    }
}
