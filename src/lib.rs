//! archsmith - requirement conversations to solution-architecture documents
//!
//! archsmith interviews a stakeholder, extracts structured requirements from the
//! conversation and from supporting documents, and generates a ten-section
//! architecture document one validated section at a time.
//!
//! It can be used in two ways:
//! - **CLI**: `archsmith chat` for an interactive session, `archsmith generate` for a
//!   one-shot run from requirement lists and documents
//! - **Library**: build a [`SessionManager`] and drive [`Session`]s directly
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! # Offline run with the simulated model
//! archsmith --dry-run generate \
//!     --requirement "Staff book meeting rooms from a web page" \
//!     --requirement "Bookings sync with Outlook | Priority: High | Category: Constraint" \
//!     --doc notes/brief.md --out architecture.md
//!
//! # Interactive session
//! archsmith chat
//! ```
//!
//! # Quick Start (Library)
//!
//! ```no_run
//! use archsmith::{Config, session_manager};
//!
//! # async fn demo() -> Result<(), archsmith::ArchsmithError> {
//! let config = Config::builder().provider("simulated").build()?;
//! let (manager, _fallback) = session_manager(config)?;
//! let (_, handle) = manager.start().await;
//! let mut session = handle.lock().await;
//! session.add_requirement("Staff book meeting rooms", None, None)?;
//! session.request_review().await?;
//! session.generate().await?;
//! println!("{}", session.assembled_document()?.markdown());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

pub use archsmith_config::{CliArgs, Config, ConfigBuilder};
pub use archsmith_documents::{DocumentFormat, DocumentKind, DocumentNormalizer, TextExtractor};
pub use archsmith_engine::{
    AssembledDocument, ChatReply, ConversationPhase, DocumentReceipt, DocumentSink, FileSink,
    GatheringDecision, GenerationOutcome, MemorySink, ReviewSnapshot, SectionResult, SectionStatus,
    Session, SessionManager, SessionServices,
};
pub use archsmith_llm::{LlmBackend, LlmFallbackInfo};
pub use archsmith_requirements::{Category, Priority, Requirement};
pub use archsmith_sections::SectionName;
pub use archsmith_utils::{ArchsmithError, ExitCode, UserFriendlyError};

pub mod cli;

/// Build a session manager for `config` using its configured provider.
///
/// # Errors
///
/// Returns `ArchsmithError::Llm` when no provider can be constructed or the
/// prompt template is unknown
pub fn session_manager(
    config: Config,
) -> Result<(SessionManager, Option<LlmFallbackInfo>), ArchsmithError> {
    let (backend, fallback) = archsmith_llm::from_config_with_fallback(&config)?;
    let services = SessionServices::new(config, Arc::from(backend))?;
    Ok((SessionManager::new(services), fallback))
}

/// Build a session manager around an existing backend.
///
/// # Errors
///
/// Returns `ArchsmithError::Llm` for an unknown prompt template
pub fn session_manager_with_backend(
    config: Config,
    backend: Arc<dyn LlmBackend>,
) -> Result<SessionManager, ArchsmithError> {
    Ok(SessionManager::new(SessionServices::new(config, backend)?))
}
