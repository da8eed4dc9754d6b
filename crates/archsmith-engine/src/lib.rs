//! Session engine for archsmith
//!
//! - [`conversation`]: the phase state machine and the gathering decision
//! - [`session`]: one session's operations, from first message to export
//! - [`manager`]: the registry of live sessions
//! - [`orchestrator`]: per-section generation with retry and fallback
//! - [`assembler`]: ordered Markdown document, digest and canonical JSON
//! - [`export`]: document sinks

pub mod assembler;
pub mod conversation;
pub mod export;
pub mod manager;
pub mod orchestrator;
mod result;
pub mod session;

pub use assembler::{AssembledDocument, DocumentManifest, ManifestSection, assemble_document};
pub use conversation::{
    ConversationEvent, ConversationPhase, GatheringDecision, Guards, InformationGap, Transition,
    TransitionError, decide, fallback_reply, transition,
};
pub use export::{DocumentSink, FileSink, MemorySink, VIEWING_NOTES};
pub use manager::{SessionHandle, SessionId, SessionManager};
pub use orchestrator::{FALLBACK_MARKER, GenerationOrchestrator, GenerationSettings, placeholder};
pub use result::{AttemptFailure, SectionResult, SectionStatus};
pub use session::{
    ChatReply, DocumentReceipt, DocumentSummary, GenerationOutcome, ReviewSnapshot, Session,
    SessionServices,
};
