//! One requirement-gathering and generation session
//!
//! A [`Session`] owns its transcript, requirements, documents and section
//! results. Every operation first asks the state machine whether the event is
//! allowed; rejected input leaves the session unchanged.

use std::sync::Arc;
use std::time::Duration;

use archsmith_config::Config;
use archsmith_documents::{DocumentFormat, DocumentKind, DocumentNormalizer, SupportingDocument};
use archsmith_llm::{
    FOCUS_HINT_PREFIX, LlmBackend, LlmError, LlmInvocation, Message, READY_HINT, TASK_CHAT,
};
use archsmith_packet::{ContextAssembler, ContextBudget, ContextReport};
use archsmith_requirements::{
    Category, ConversationTurn, ExtractionSettings, Priority, Requirement, RequirementDraft,
    RequirementError, RequirementExtractor, RequirementSet, TurnRole, from_manual,
};
use archsmith_sections::SectionName;
use archsmith_utils::error::{ArchsmithError, SessionError};
use archsmith_utils::logging::redact_error_message;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::assembler::{AssembledDocument, assemble_document};
use crate::conversation::{
    ConversationEvent, ConversationPhase, GatheringDecision, Guards, TURN_CAP_REPLY, Transition,
    decide, fallback_reply, transition,
};
use crate::export::DocumentSink;
use crate::orchestrator::{GenerationOrchestrator, GenerationSettings};
use crate::result::{SectionResult, SectionStatus};

const INTERVIEWER_PROMPT: &str = "You are archsmith, a senior solution architect interviewing a \
stakeholder about a system they want built. Ask one focused clarifying question at a time, \
acknowledge what you learned in one short sentence, and never propose an architecture yet. \
Keep replies under 80 words.";

const CHAT_MAX_TOKENS: u32 = 1024;

/// Collaborators shared by every session of one manager.
pub struct SessionServices {
    config: Arc<Config>,
    backend: Arc<dyn LlmBackend>,
    normalizer: DocumentNormalizer,
    extractor: RequirementExtractor,
    context: ContextAssembler,
    orchestrator: GenerationOrchestrator,
}

impl SessionServices {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` for an unknown prompt template
    pub fn new(config: Config, backend: Arc<dyn LlmBackend>) -> Result<Self, LlmError> {
        let extractor =
            RequirementExtractor::new(Arc::clone(&backend), ExtractionSettings::from_config(&config)?);
        let orchestrator =
            GenerationOrchestrator::new(Arc::clone(&backend), GenerationSettings::from_config(&config)?);
        Ok(Self {
            normalizer: DocumentNormalizer::from_config(&config.documents),
            context: ContextAssembler::new(ContextBudget::from_config(&config.context)),
            config: Arc::new(config),
            backend,
            extractor,
            orchestrator,
        })
    }

    /// Replace the generation settings.
    #[must_use]
    pub fn with_generation_settings(mut self, settings: GenerationSettings) -> Self {
        self.orchestrator = GenerationOrchestrator::new(Arc::clone(&self.backend), settings);
        self
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub phase: ConversationPhase,
    /// `None` when the turn cap ended the dialogue
    pub decision: Option<GatheringDecision>,
    pub new_requirements: Vec<Requirement>,
    pub forced_review: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentReceipt {
    pub document_id: String,
    pub label: String,
    pub kind: DocumentKind,
    /// Identical bytes were already submitted; nothing was added
    pub duplicate: bool,
    pub new_requirements: Vec<Requirement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub id: String,
    pub label: String,
    pub kind: DocumentKind,
    pub format: DocumentFormat,
    pub size_bytes: usize,
}

impl From<&SupportingDocument> for DocumentSummary {
    fn from(doc: &SupportingDocument) -> Self {
        Self {
            id: doc.id().to_string(),
            label: doc.label().to_string(),
            kind: doc.kind(),
            format: doc.format(),
            size_bytes: doc.size_bytes(),
        }
    }
}

/// What the session holds right now.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewSnapshot {
    pub session_id: String,
    pub phase: ConversationPhase,
    pub requirements: Vec<Requirement>,
    pub documents: Vec<DocumentSummary>,
    pub user_turns: u32,
    pub decision: GatheringDecision,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub context: ContextReport,
    pub valid_sections: usize,
    pub fallback_sections: usize,
}

pub struct Session {
    id: String,
    services: Arc<SessionServices>,
    phase: ConversationPhase,
    turns: Vec<ConversationTurn>,
    /// Turns before this index have been through extraction
    extracted_through: usize,
    requirements: RequirementSet,
    documents: Vec<SupportingDocument>,
    sections: Vec<SectionResult>,
    context_report: Option<ContextReport>,
    failure: Option<String>,
}

impl Session {
    #[must_use]
    pub fn new(id: impl Into<String>, services: Arc<SessionServices>) -> Self {
        Self {
            id: id.into(),
            services,
            phase: ConversationPhase::Idle,
            turns: Vec::new(),
            extracted_through: 0,
            requirements: RequirementSet::new(),
            documents: Vec::new(),
            sections: Vec::new(),
            context_report: None,
            failure: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn phase(&self) -> ConversationPhase {
        self.phase
    }

    #[must_use]
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    #[must_use]
    pub fn requirements(&self) -> &RequirementSet {
        &self.requirements
    }

    #[must_use]
    pub fn documents(&self) -> &[SupportingDocument] {
        &self.documents
    }

    /// Section results of the last generation run, in document order.
    #[must_use]
    pub fn sections(&self) -> &[SectionResult] {
        &self.sections
    }

    #[must_use]
    pub fn section(&self, name: SectionName) -> Option<&SectionResult> {
        self.sections.iter().find(|s| s.name() == name)
    }

    #[must_use]
    pub fn context_report(&self) -> Option<&ContextReport> {
        self.context_report.as_ref()
    }

    /// Why the last generation request failed, if it did.
    #[must_use]
    pub fn failure_detail(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    #[must_use]
    pub fn user_turns(&self) -> u32 {
        let count = self.turns.iter().filter(|t| t.role == TurnRole::User).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn guards(&self, pending_user_turns: u32) -> Guards {
        Guards {
            user_turns: self.user_turns().saturating_add(pending_user_turns),
            max_turns: self.services.config.conversation.max_turns,
            requirement_count: self.requirements.len(),
        }
    }

    fn check(&self, event: ConversationEvent, guards: &Guards) -> Result<Transition, SessionError> {
        transition(self.phase, event, guards).map_err(|err| {
            debug!(session_id = %self.id, phase = %self.phase, %event, "Transition rejected");
            SessionError::from(err)
        })
    }

    fn enter(&mut self, t: Transition) {
        if t.from != t.to {
            info!(
                session_id = %self.id,
                from = %t.from,
                to = %t.to,
                forced = t.forced_review,
                "Phase transition"
            );
        }
        self.phase = t.to;
    }

    fn apply(&mut self, event: ConversationEvent) -> Result<Transition, SessionError> {
        let t = self.check(event, &self.guards(0))?;
        self.enter(t);
        Ok(t)
    }

    fn push_turn(&mut self, role: TurnRole, text: impl Into<String>) {
        let index = self.turns.len();
        self.turns.push(ConversationTurn::new(role, text, index));
    }

    /// Run extraction over turns not yet extracted and record what it finds.
    async fn extract_pending(&mut self) -> Vec<Requirement> {
        if self.extracted_through >= self.turns.len() {
            return Vec::new();
        }
        let services = Arc::clone(&self.services);
        let drafts = services
            .extractor
            .extract_from_turns(&self.id, &self.turns[self.extracted_through..])
            .await;
        self.extracted_through = self.turns.len();
        let added = self.requirements.extend(drafts);
        if !added.is_empty() {
            info!(
                session_id = %self.id,
                added = added.len(),
                total = self.requirements.len(),
                "Recorded requirements from conversation"
            );
        }
        added
    }

    /// Submit a chat message and get the interviewer's reply.
    ///
    /// # Errors
    ///
    /// - `RequirementError::EmptyRequirement` for a blank message
    /// - `SessionError::InvalidTransition` while generating or after completion
    pub async fn submit_message(&mut self, text: &str) -> Result<ChatReply, ArchsmithError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RequirementError::EmptyRequirement.into());
        }

        let t = self.check(ConversationEvent::UserMessage, &self.guards(1))?;
        self.enter(t);
        self.push_turn(TurnRole::User, text);

        let config = Arc::clone(&self.services.config);
        let new_requirements = if config.conversation.extract_every_turn || t.forced_review {
            self.extract_pending().await
        } else {
            Vec::new()
        };

        if t.forced_review {
            info!(
                session_id = %self.id,
                user_turns = self.user_turns(),
                max_turns = config.conversation.max_turns,
                "Turn limit reached; moving to review"
            );
            self.push_turn(TurnRole::Assistant, TURN_CAP_REPLY);
            return Ok(ChatReply {
                reply: TURN_CAP_REPLY.to_string(),
                phase: self.phase,
                decision: None,
                new_requirements,
                forced_review: true,
            });
        }

        let decision = decide(&self.requirements, &config.conversation);
        let reply = self.interviewer_reply(&decision).await;
        self.push_turn(TurnRole::Assistant, reply.clone());

        Ok(ChatReply {
            reply,
            phase: self.phase,
            decision: Some(decision),
            new_requirements,
            forced_review: false,
        })
    }

    async fn interviewer_reply(&self, decision: &GatheringDecision) -> String {
        let config = &self.services.config;
        let mut system = INTERVIEWER_PROMPT.to_string();
        system.push_str("\n\n");
        match decision {
            GatheringDecision::AskClarifying { gap } => {
                system.push_str(FOCUS_HINT_PREFIX);
                system.push(' ');
                system.push_str(gap.focus());
            }
            GatheringDecision::ReadyForReview => system.push_str(READY_HINT),
        }

        let mut messages = vec![Message::system(system)];
        messages.extend(self.turns.iter().map(|turn| match turn.role {
            TurnRole::User => Message::user(turn.text.clone()),
            TurnRole::Assistant => Message::assistant(turn.text.clone()),
        }));

        let timeout = config.generation.timeout();
        let invocation = LlmInvocation::new(&self.id, TASK_CHAT, "", timeout, messages)
            .with_max_tokens(CHAT_MAX_TOKENS)
            .with_temperature(config.conversation.temperature);

        match tokio::time::timeout(timeout, self.services.backend.invoke(invocation)).await {
            Ok(Ok(result)) if !result.raw_response.trim().is_empty() => {
                result.raw_response.trim().to_string()
            }
            Ok(Ok(_)) => {
                warn!(session_id = %self.id, "Empty interviewer reply; using fallback question");
                fallback_reply(decision)
            }
            Ok(Err(err)) => {
                warn!(
                    session_id = %self.id,
                    error = %redact_error_message(&err.to_string()),
                    "Interviewer reply failed; using fallback question"
                );
                fallback_reply(decision)
            }
            Err(_) => {
                warn!(
                    session_id = %self.id,
                    timeout_secs = timeout.as_secs(),
                    "Interviewer reply timed out; using fallback question"
                );
                fallback_reply(decision)
            }
        }
    }

    /// Record one manual requirement. Returns `None` for a duplicate.
    ///
    /// # Errors
    ///
    /// - `RequirementError::EmptyRequirement` for blank text
    /// - `SessionError::InvalidTransition` while generating or after completion
    pub fn add_requirement(
        &mut self,
        text: &str,
        priority: Option<Priority>,
        category: Option<Category>,
    ) -> Result<Option<Requirement>, ArchsmithError> {
        let draft = RequirementDraft::manual(text, priority, category)?;
        self.apply(ConversationEvent::RequirementsAdded)?;
        let added = self.requirements.add(draft).cloned();
        if added.is_none() {
            debug!(session_id = %self.id, "Duplicate requirement ignored");
        }
        Ok(added)
    }

    /// Record several manual requirements, all or nothing. Returns the ones
    /// that were not duplicates.
    ///
    /// # Errors
    ///
    /// Same as [`add_requirement`](Self::add_requirement); on error nothing is recorded.
    pub fn add_requirements<I, S>(&mut self, items: I) -> Result<Vec<Requirement>, ArchsmithError>
    where
        I: IntoIterator<Item = (S, Option<Priority>, Option<Category>)>,
        S: AsRef<str>,
    {
        let drafts = from_manual(items)?;
        self.apply(ConversationEvent::RequirementsAdded)?;
        Ok(self.requirements.extend(drafts))
    }

    /// Normalize and attach a supporting document.
    ///
    /// # Errors
    ///
    /// - `DocumentError` when the document is rejected (session unchanged)
    /// - `SessionError::InvalidTransition` while generating or after completion
    pub async fn submit_document(
        &mut self,
        bytes: &[u8],
        format: DocumentFormat,
        label: &str,
    ) -> Result<DocumentReceipt, ArchsmithError> {
        self.check(ConversationEvent::DocumentSubmitted, &self.guards(0))?;
        let services = Arc::clone(&self.services);
        let document = services.normalizer.normalize(bytes, format, label)?;

        if self.documents.iter().any(|d| d.id() == document.id()) {
            info!(session_id = %self.id, document_id = document.id(), "Duplicate document ignored");
            return Ok(DocumentReceipt {
                document_id: document.id().to_string(),
                label: document.label().to_string(),
                kind: document.kind(),
                duplicate: true,
                new_requirements: Vec::new(),
            });
        }

        let new_requirements = if services.config.documents.extract_requirements {
            let drafts = services.extractor.extract_from_document(&self.id, &document).await;
            self.requirements.extend(drafts)
        } else {
            Vec::new()
        };

        info!(
            session_id = %self.id,
            document_id = document.id(),
            kind = %document.kind(),
            size_bytes = document.size_bytes(),
            extracted = new_requirements.len(),
            "Document attached"
        );

        let receipt = DocumentReceipt {
            document_id: document.id().to_string(),
            label: document.label().to_string(),
            kind: document.kind(),
            duplicate: false,
            new_requirements,
        };
        self.documents.push(document);
        Ok(receipt)
    }

    /// Current requirements, documents and readiness, without changing phase.
    #[must_use]
    pub fn snapshot(&self) -> ReviewSnapshot {
        ReviewSnapshot {
            session_id: self.id.clone(),
            phase: self.phase,
            requirements: self.requirements.iter().cloned().collect(),
            documents: self.documents.iter().map(DocumentSummary::from).collect(),
            user_turns: self.user_turns(),
            decision: decide(&self.requirements, &self.services.config.conversation),
        }
    }

    /// Move to review and return the snapshot to confirm.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside Idle, Gathering and Reviewing
    pub async fn request_review(&mut self) -> Result<ReviewSnapshot, ArchsmithError> {
        self.apply(ConversationEvent::ReviewRequested)?;
        self.extract_pending().await;
        Ok(self.snapshot())
    }

    /// Confirm the reviewed requirements and generate every section.
    ///
    /// The context bundle is snapshotted at this instant; later changes to the
    /// session do not affect it.
    ///
    /// # Errors
    ///
    /// - `SessionError::EmptyContext` with no requirements; the phase stays Reviewing
    /// - `ContextError::RequirementsOverBudget`; the session moves to Failed before any model call
    /// - `SessionError::InvalidTransition` outside Reviewing
    pub async fn generate(&mut self) -> Result<GenerationOutcome, ArchsmithError> {
        self.apply(ConversationEvent::Confirm)?;
        self.failure = None;
        self.context_report = None;
        self.sections = SectionName::ALL.into_iter().map(SectionResult::pending).collect();

        let services = Arc::clone(&self.services);
        let assembly = match services
            .context
            .assemble(self.requirements.as_slice(), &self.documents)
        {
            Ok(assembly) => assembly,
            Err(err) => {
                warn!(session_id = %self.id, error = %err, "Generation context rejected");
                self.sections.clear();
                self.failure = Some(err.to_string());
                self.apply(ConversationEvent::ContextRejected)?;
                return Err(err.into());
            }
        };
        self.context_report = Some(assembly.report.clone());

        let started = std::time::Instant::now();
        self.sections = services
            .orchestrator
            .generate_all(&self.id, &assembly.bundle)
            .await;
        self.apply(ConversationEvent::GenerationFinished)?;

        let outcome = GenerationOutcome {
            context: assembly.report,
            valid_sections: self.count_status(SectionStatus::Valid),
            fallback_sections: self.count_status(SectionStatus::FailedFallback),
        };
        info!(
            session_id = %self.id,
            valid = outcome.valid_sections,
            fallback = outcome.fallback_sections,
            elapsed_ms = duration_ms(started.elapsed()),
            "Generation complete"
        );
        Ok(outcome)
    }

    fn count_status(&self, status: SectionStatus) -> usize {
        self.sections.iter().filter(|s| s.status() == status).count()
    }

    /// The assembled document.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotAssemblable` unless generation has resolved every section
    pub fn assembled_document(&self) -> Result<AssembledDocument, SessionError> {
        let resolved = self.sections.len() == SectionName::ALL.len()
            && self.sections.iter().all(|s| s.status().is_resolved());
        match self.phase {
            ConversationPhase::Complete => assemble_document(&self.sections),
            ConversationPhase::Generating if resolved => assemble_document(&self.sections),
            phase => Err(SessionError::NotAssemblable {
                phase: phase.to_string(),
            }),
        }
    }

    /// Assemble the document and write it to `destination`.
    ///
    /// # Errors
    ///
    /// - `SessionError::NotAssemblable` before generation has finished
    /// - `ExportError` when the sink fails
    pub fn export(
        &self,
        sink: &dyn DocumentSink,
        destination: &str,
    ) -> Result<AssembledDocument, ArchsmithError> {
        let document = self.assembled_document()?;
        sink.write(document.markdown(), destination)?;
        Ok(document)
    }

    /// Discard everything and return to Idle.
    ///
    /// # Errors
    ///
    /// Reset is accepted in every phase, so this does not fail today.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.apply(ConversationEvent::Reset)?;
        self.turns.clear();
        self.extracted_through = 0;
        self.requirements.clear();
        self.documents.clear();
        self.sections.clear();
        self.context_report = None;
        self.failure = None;
        info!(session_id = %self.id, "Session reset");
        Ok(())
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use archsmith_llm::{ScriptedBackend, ScriptedReply, TASK_EXTRACT};
    use archsmith_utils::error::{ContextError, DocumentError};

    fn services_with(config: Config, backend: Arc<ScriptedBackend>) -> Arc<SessionServices> {
        let settings = GenerationSettings {
            backoff: Duration::ZERO,
            ..GenerationSettings::from_config(&config).unwrap()
        };
        Arc::new(
            SessionServices::new(config, backend)
                .unwrap()
                .with_generation_settings(settings),
        )
    }

    fn session(backend: Arc<ScriptedBackend>) -> Session {
        Session::new("test-session", services_with(Config::default(), backend))
    }

    #[tokio::test]
    async fn test_first_message_starts_gathering_and_extracts() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut session = session(backend.clone());
        let reply = session
            .submit_message("We need a booking system for meeting rooms.")
            .await
            .unwrap();

        assert_eq!(session.phase(), ConversationPhase::Gathering);
        assert_eq!(reply.new_requirements.len(), 1);
        assert!(matches!(reply.decision, Some(GatheringDecision::AskClarifying { .. })));
        assert_eq!(session.turns().len(), 2);
        assert_eq!(backend.calls_for(TASK_EXTRACT), 1);
        assert_eq!(backend.calls_for(TASK_CHAT), 1);

        let chat = backend
            .invocations()
            .into_iter()
            .find(|inv| inv.task == TASK_CHAT)
            .unwrap();
        assert!(chat.messages[0].content.contains(FOCUS_HINT_PREFIX));
    }

    #[tokio::test]
    async fn test_ready_decision_tells_interviewer_to_offer_review() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut session = session(backend.clone());
        session
            .add_requirements([
                ("Users book meeting rooms", None, Some(Category::Functional)),
                ("Users cancel bookings", None, Some(Category::Functional)),
                ("Pages load within one second", None, Some(Category::NonFunctional)),
            ])
            .unwrap();

        let reply = session.submit_message("That covers it, I think.").await.unwrap();
        assert_eq!(reply.decision, Some(GatheringDecision::ReadyForReview));

        let chat = backend
            .invocations()
            .into_iter()
            .find(|inv| inv.task == TASK_CHAT)
            .unwrap();
        let system = &chat.messages[0].content;
        assert!(system.contains(READY_HINT));
        assert!(!system.contains(FOCUS_HINT_PREFIX));
    }

    #[tokio::test]
    async fn test_chat_failure_uses_fallback_question() {
        let backend = Arc::new(ScriptedBackend::new().with_reply(
            TASK_CHAT,
            ScriptedReply::Error(LlmError::ProviderOutage("503".to_string())),
        ));
        let mut session = session(backend);
        let reply = session.submit_message("Users book rooms.").await.unwrap();
        let expected = fallback_reply(&reply.decision.unwrap());
        assert_eq!(reply.reply, expected);
    }

    #[tokio::test]
    async fn test_blank_message_rejected_without_change() {
        let mut session = session(Arc::new(ScriptedBackend::new()));
        let err = session.submit_message("   ").await.unwrap_err();
        assert!(matches!(err, ArchsmithError::Requirement(RequirementError::EmptyRequirement)));
        assert_eq!(session.phase(), ConversationPhase::Idle);
        assert!(session.turns().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_requirements_collapse() {
        let mut session = session(Arc::new(ScriptedBackend::new()));
        assert!(session.add_requirement("Support login", None, None).unwrap().is_some());
        assert!(session.add_requirement("support  LOGIN", None, None).unwrap().is_none());
        assert_eq!(session.requirements().len(), 1);
        assert_eq!(session.phase(), ConversationPhase::Gathering);
    }

    #[tokio::test]
    async fn test_add_requirements_is_all_or_nothing() {
        let mut session = session(Arc::new(ScriptedBackend::new()));
        let err = session
            .add_requirements([("Export CSV", None, None), ("  ", None, None)])
            .unwrap_err();
        assert!(matches!(err, ArchsmithError::Requirement(_)));
        assert!(session.requirements().is_empty());
        assert_eq!(session.phase(), ConversationPhase::Idle);
    }

    #[tokio::test]
    async fn test_confirm_without_requirements_stays_reviewing() {
        let mut session = session(Arc::new(ScriptedBackend::new()));
        session
            .submit_document(b"Room booking notes", DocumentFormat::Txt, "notes.txt")
            .await
            .unwrap();
        session.request_review().await.unwrap();

        let err = session.generate().await.unwrap_err();
        assert!(matches!(err, ArchsmithError::Session(SessionError::EmptyContext)));
        assert_eq!(session.phase(), ConversationPhase::Reviewing);
        assert!(session.sections().is_empty());
    }

    #[tokio::test]
    async fn test_requirements_over_budget_fails_before_model_calls() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut config = Config::default();
        config.context.max_bytes = 16;
        let mut session = Session::new("s", services_with(config, backend.clone()));
        session
            .add_requirement("The platform must support single sign-on", None, None)
            .unwrap();
        session.request_review().await.unwrap();

        let err = session.generate().await.unwrap_err();
        assert!(matches!(
            err,
            ArchsmithError::Context(ContextError::RequirementsOverBudget { .. })
        ));
        assert_eq!(session.phase(), ConversationPhase::Failed);
        assert!(session.failure_detail().unwrap().contains("16 bytes"));
        assert_eq!(backend.calls_for("section:"), 0);

        // Adding a requirement returns the session to gathering.
        session.add_requirement("Audit log", None, None).unwrap();
        assert_eq!(session.phase(), ConversationPhase::Gathering);
    }

    #[tokio::test]
    async fn test_rejected_document_leaves_session_unchanged() {
        let mut config = Config::default();
        config.documents.max_bytes = 8;
        let mut session = Session::new(
            "s",
            services_with(config, Arc::new(ScriptedBackend::new())),
        );
        let err = session
            .submit_document(b"far more than eight bytes", DocumentFormat::Txt, "big.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, ArchsmithError::Document(DocumentError::TooLarge { .. })));
        assert!(session.documents().is_empty());
    }

    #[tokio::test]
    async fn test_identical_document_is_ignored() {
        let mut session = session(Arc::new(ScriptedBackend::new()));
        let first = session
            .submit_document(b"Design notes", DocumentFormat::Markdown, "design.md")
            .await
            .unwrap();
        let second = session
            .submit_document(b"Design notes", DocumentFormat::Markdown, "design-copy.md")
            .await
            .unwrap();
        assert!(!first.duplicate);
        assert!(second.duplicate);
        assert_eq!(first.document_id, second.document_id);
        assert_eq!(session.documents().len(), 1);
    }

    #[tokio::test]
    async fn test_document_extraction_when_enabled() {
        let mut config = Config::default();
        config.documents.extract_requirements = true;
        let backend = Arc::new(ScriptedBackend::new());
        let mut session = Session::new("s", services_with(config, backend.clone()));
        let receipt = session
            .submit_document(
                b"The system must export invoices as PDF.",
                DocumentFormat::Txt,
                "requirements.txt",
            )
            .await
            .unwrap();
        assert_eq!(receipt.kind, DocumentKind::Requirements);
        assert_eq!(receipt.new_requirements.len(), 1);
        assert_eq!(session.phase(), ConversationPhase::Idle);
    }

    #[tokio::test]
    async fn test_full_generation_and_document() {
        let mut session = session(Arc::new(ScriptedBackend::new()));
        session
            .add_requirements([
                ("Users book meeting rooms", Some(Priority::High), None),
                ("Pages load within one second", None, Some(Category::NonFunctional)),
            ])
            .unwrap();
        assert!(matches!(
            session.assembled_document(),
            Err(SessionError::NotAssemblable { .. })
        ));
        session.request_review().await.unwrap();
        let outcome = session.generate().await.unwrap();

        assert_eq!(session.phase(), ConversationPhase::Complete);
        assert_eq!(outcome.valid_sections, SectionName::ALL.len());
        assert!(outcome.context.is_lossless());
        let doc = session.assembled_document().unwrap();
        assert_eq!(doc.digest(), session.assembled_document().unwrap().digest());

        // Completed sessions accept no further input.
        assert!(session.add_requirement("More", None, None).is_err());
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let mut session = session(Arc::new(ScriptedBackend::new()));
        session.submit_message("Users book rooms every day.").await.unwrap();
        session
            .submit_document(b"notes", DocumentFormat::Txt, "notes.txt")
            .await
            .unwrap();
        session.reset().unwrap();
        assert_eq!(session.phase(), ConversationPhase::Idle);
        assert!(session.turns().is_empty());
        assert!(session.requirements().is_empty());
        assert!(session.documents().is_empty());
    }
}
