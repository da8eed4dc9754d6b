//! Conversation state machine
//!
//! Phase changes go through [`transition`], a pure function over the current
//! phase, the event and a few counters. Sessions never assign a phase directly.

use std::fmt;

use archsmith_config::ConversationConfig;
use archsmith_requirements::{Category, RequirementSet};
use archsmith_utils::error::SessionError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    Idle,
    Gathering,
    Reviewing,
    Generating,
    Complete,
    Failed,
}

impl ConversationPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Gathering => "gathering",
            Self::Reviewing => "reviewing",
            Self::Generating => "generating",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationEvent {
    UserMessage,
    RequirementsAdded,
    DocumentSubmitted,
    ReviewRequested,
    Confirm,
    GenerationFinished,
    ContextRejected,
    Reset,
}

impl ConversationEvent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserMessage => "user_message",
            Self::RequirementsAdded => "requirements_added",
            Self::DocumentSubmitted => "document_submitted",
            Self::ReviewRequested => "review_requested",
            Self::Confirm => "confirm",
            Self::GenerationFinished => "generation_finished",
            Self::ContextRejected => "context_rejected",
            Self::Reset => "reset",
        }
    }
}

impl fmt::Display for ConversationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters the transition function consults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Guards {
    /// User turns including the one being submitted
    pub user_turns: u32,
    pub max_turns: u32,
    pub requirement_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ConversationPhase,
    pub to: ConversationPhase,
    /// The turn cap moved the session to Reviewing
    pub forced_review: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    NotAllowed {
        phase: ConversationPhase,
        event: ConversationEvent,
    },
    EmptyContext,
}

impl From<TransitionError> for SessionError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::NotAllowed { phase, event } => Self::InvalidTransition {
                phase: phase.to_string(),
                event: event.to_string(),
            },
            TransitionError::EmptyContext => Self::EmptyContext,
        }
    }
}

/// Compute the next phase.
///
/// # Errors
///
/// - `TransitionError::NotAllowed` when `event` has no edge out of `phase`
/// - `TransitionError::EmptyContext` when confirming with no requirements recorded
pub fn transition(
    phase: ConversationPhase,
    event: ConversationEvent,
    guards: &Guards,
) -> Result<Transition, TransitionError> {
    use ConversationEvent as E;
    use ConversationPhase as P;

    let moved = |to| {
        Ok(Transition {
            from: phase,
            to,
            forced_review: false,
        })
    };
    let not_allowed = || Err(TransitionError::NotAllowed { phase, event });

    match (phase, event) {
        (_, E::Reset) => moved(P::Idle),

        (P::Idle | P::Gathering | P::Reviewing | P::Failed, E::UserMessage) => {
            if guards.user_turns >= guards.max_turns {
                Ok(Transition {
                    from: phase,
                    to: P::Reviewing,
                    forced_review: true,
                })
            } else {
                moved(P::Gathering)
            }
        }

        (P::Idle | P::Gathering | P::Reviewing | P::Failed, E::RequirementsAdded) => {
            moved(P::Gathering)
        }

        (P::Idle | P::Gathering | P::Reviewing | P::Failed, E::DocumentSubmitted) => moved(phase),

        (P::Idle | P::Gathering | P::Reviewing, E::ReviewRequested) => moved(P::Reviewing),

        (P::Reviewing, E::Confirm) => {
            if guards.requirement_count == 0 {
                Err(TransitionError::EmptyContext)
            } else {
                moved(P::Generating)
            }
        }

        (P::Generating, E::GenerationFinished) => moved(P::Complete),
        (P::Generating, E::ContextRejected) => moved(P::Failed),

        _ => not_allowed(),
    }
}

/// What the interviewer still needs to learn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InformationGap {
    TooFewRequirements { have: usize, need: usize },
    MissingCategory { category: Category },
}

impl InformationGap {
    /// Topic phrase used as the model's focus hint and in the fallback question.
    #[must_use]
    pub const fn focus(&self) -> &'static str {
        match self {
            Self::TooFewRequirements { .. } => {
                "the main features and user workflows the system must support"
            }
            Self::MissingCategory { category } => match category {
                Category::Functional => "what users must be able to do with the system",
                Category::NonFunctional => {
                    "performance, security, scalability and availability expectations"
                }
                Category::Constraint => {
                    "budget, timeline, technology or compliance constraints"
                }
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GatheringDecision {
    AskClarifying { gap: InformationGap },
    ReadyForReview,
}

/// Decide whether the recorded requirements are enough to review.
///
/// The count threshold is checked first, then each required category in
/// configuration order. Unknown category names are ignored.
#[must_use]
pub fn decide(requirements: &RequirementSet, config: &ConversationConfig) -> GatheringDecision {
    if requirements.len() < config.min_requirements {
        return GatheringDecision::AskClarifying {
            gap: InformationGap::TooFewRequirements {
                have: requirements.len(),
                need: config.min_requirements,
            },
        };
    }

    config
        .required_categories
        .iter()
        .filter_map(|name| Category::parse(name).ok())
        .find(|category| !requirements.has_category(*category))
        .map_or(GatheringDecision::ReadyForReview, |category| {
            GatheringDecision::AskClarifying {
                gap: InformationGap::MissingCategory { category },
            }
        })
}

/// Reply used when the model cannot produce one.
#[must_use]
pub fn fallback_reply(decision: &GatheringDecision) -> String {
    match decision {
        GatheringDecision::AskClarifying { gap } => {
            format!("Could you tell me more about {}?", gap.focus())
        }
        GatheringDecision::ReadyForReview => READY_REPLY.to_string(),
    }
}

pub(crate) const READY_REPLY: &str = "I have enough to draft the architecture. \
     Review the requirements when you are ready, or keep adding detail.";

pub(crate) const TURN_CAP_REPLY: &str = "We have reached the conversation limit. \
     Please review the requirements gathered so far; you can still add or correct them \
     before generating.";
