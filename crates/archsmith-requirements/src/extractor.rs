//! Model-assisted requirement extraction
//!
//! Extraction is best-effort: any model failure or unusable output yields an
//! empty batch and never fails the session.

use std::sync::Arc;
use std::time::Duration;

use archsmith_config::Config;
use archsmith_documents::SupportingDocument;
use archsmith_llm::{LlmBackend, LlmError, LlmInvocation, PromptTemplate, TASK_EXTRACT};
use archsmith_utils::text::truncate_at_char_boundary;
use tracing::{debug, info, warn};

use crate::model::{RequirementDraft, RequirementSource};
use crate::parse::parse_extraction_output;
use crate::transcript::{ConversationTurn, render_transcript};

const EXTRACTION_INSTRUCTIONS: &str = "Extract the software requirements stated in the source text.

Output one requirement per line, exactly in this form:
REQ1: <requirement text> | Priority: <High|Medium|Low> | Category: <Functional|Non-functional|Constraint>

Rules:
- Include only requirements that are stated or clearly implied; do not invent features.
- Functional: what the system must do.
- Non-functional: qualities such as performance, security, scalability, availability.
- Constraint: budget, technology, regulatory or organisational limits.
- Write each requirement as one self-contained sentence.
- Output nothing but requirement lines. If there are none, output NONE.";

/// Model call parameters for extraction.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionSettings {
    pub template: PromptTemplate,
    pub timeout: Duration,
    pub max_output_tokens: u32,
    pub temperature: f32,
    /// Document text beyond this many bytes is not sent
    pub max_source_bytes: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            template: PromptTemplate::Default,
            timeout: Duration::from_secs(120),
            max_output_tokens: 2048,
            temperature: 0.0,
            max_source_bytes: 48 * 1024,
        }
    }
}

impl ExtractionSettings {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` for an unknown prompt template
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        Ok(Self {
            template: archsmith_llm::prompt_template(config)?,
            timeout: config.generation.timeout(),
            max_output_tokens: config.generation.max_output_tokens,
            temperature: 0.0,
            max_source_bytes: config.context.max_bytes,
        })
    }
}

#[derive(Clone)]
pub struct RequirementExtractor {
    backend: Arc<dyn LlmBackend>,
    settings: ExtractionSettings,
}

impl RequirementExtractor {
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, settings: ExtractionSettings) -> Self {
        Self { backend, settings }
    }

    /// Candidate requirements stated in `turns`.
    pub async fn extract_from_turns(
        &self,
        session_id: &str,
        turns: &[ConversationTurn],
    ) -> Vec<RequirementDraft> {
        if turns.is_empty() {
            return Vec::new();
        }
        let context = format!("Conversation transcript:\n{}", render_transcript(turns));
        self.run(session_id, &context, RequirementSource::Chat).await
    }

    /// Candidate requirements stated in a supporting document.
    pub async fn extract_from_document(
        &self,
        session_id: &str,
        document: &SupportingDocument,
    ) -> Vec<RequirementDraft> {
        let text = truncate_at_char_boundary(document.extracted_text(), self.settings.max_source_bytes);
        let quoted = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| format!("> {}", line.trim_end()))
            .collect::<Vec<_>>()
            .join("\n");
        let context = format!(
            "Document: {} ({})\n{}",
            document.label(),
            document.kind(),
            quoted
        );
        self.run(session_id, &context, RequirementSource::Document).await
    }

    async fn run(&self, session_id: &str, context: &str, source: RequirementSource) -> Vec<RequirementDraft> {
        let messages = self.settings.template.build_messages(EXTRACTION_INSTRUCTIONS, context);
        let invocation = LlmInvocation::new(
            session_id,
            TASK_EXTRACT,
            "",
            self.settings.timeout,
            messages,
        )
        .with_max_tokens(self.settings.max_output_tokens)
        .with_temperature(self.settings.temperature);

        let outcome = tokio::time::timeout(self.settings.timeout, self.backend.invoke(invocation)).await;
        let response = match outcome {
            Ok(Ok(result)) => result.raw_response,
            Ok(Err(e)) => {
                warn!(session_id, %source, error = %e, "Requirement extraction failed; continuing without it");
                return Vec::new();
            }
            Err(_) => {
                warn!(
                    session_id,
                    %source,
                    timeout_secs = self.settings.timeout.as_secs(),
                    "Requirement extraction timed out; continuing without it"
                );
                return Vec::new();
            }
        };

        let drafts = parse_extraction_output(&response, source);
        debug!(session_id, %source, response_bytes = response.len(), "Parsed extraction output");
        info!(session_id, %source, candidates = drafts.len(), "Extracted requirement candidates");
        drafts
    }
}
