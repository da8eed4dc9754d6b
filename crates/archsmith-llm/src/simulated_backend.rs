//! Offline, deterministic backend used by `--dry-run`
//!
//! Produces plausible output for every task without network access:
//! - `chat`: one follow-up question built from the focus hint, if any
//! - `extract-requirements`: one requirement line per statement found in
//!   `User:` transcript lines or `> ` quoted document lines
//! - `section:<slug>`: a schema-conformant skeleton for that section

use crate::types::{
    FOCUS_HINT_PREFIX, LlmBackend, LlmInvocation, LlmResult, Role, TASK_CHAT, TASK_EXTRACT,
    section_slug,
};
use archsmith_sections::SectionName;
use archsmith_utils::error::LlmError;
use async_trait::async_trait;
use tracing::debug;

const PROVIDER: &str = "simulated";

const NON_FUNCTIONAL_HINTS: &[&str] = &[
    "fast", "latency", "secure", "security", "scale", "scalab", "available", "uptime",
    "perform", "reliab", "concurren", "encrypt", "response time", "throughput",
];

const CONSTRAINT_HINTS: &[&str] = &[
    "budget", "deadline", "must use", "compliance", "gdpr", "hipaa", "on-prem", "legacy",
    "license", "existing",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedBackend;

impl SimulatedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn chat_reply(inv: &LlmInvocation) -> String {
        let focus = inv
            .text_for(Role::System)
            .lines()
            .find_map(|line| line.trim().strip_prefix(FOCUS_HINT_PREFIX))
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string);

        match focus {
            Some(focus) => format!("Thanks, that helps. Could you tell me more about {focus}?"),
            None => "Thanks, I think I have enough to draft an architecture. \
                     Review the requirements when you are ready, or keep adding detail."
                .to_string(),
        }
    }

    fn extraction_reply(inv: &LlmInvocation) -> String {
        let prompt = inv.text_for(Role::User);
        let mut lines = Vec::new();

        let statements = prompt.lines().filter_map(|line| {
            let line = line.trim();
            line.strip_prefix("User:")
                .or_else(|| line.strip_prefix("> "))
                .map(str::trim)
        });

        for statement in statements {
            for sentence in split_sentences(statement) {
                lines.push(format!(
                    "REQ{}: {} | Priority: {} | Category: {}",
                    lines.len() + 1,
                    sentence,
                    classify_priority(sentence),
                    classify_category(sentence),
                ));
            }
        }

        if lines.is_empty() {
            "NONE".to_string()
        } else {
            lines.join("\n")
        }
    }

    fn section_reply(name: SectionName) -> String {
        name.schema().skeleton(|label| {
            format!(
                "{label} for this system follows established practice for the recorded \
                 requirements, favouring managed services and a clear upgrade path."
            )
        })
    }
}

fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(['.', '!', ';'])
        .map(str::trim)
        .filter(|s| !s.contains('?'))
        .filter(|s| s.split_whitespace().count() >= 3)
}

fn classify_category(sentence: &str) -> &'static str {
    let lower = sentence.to_lowercase();
    if CONSTRAINT_HINTS.iter().any(|h| lower.contains(h)) {
        "Constraint"
    } else if NON_FUNCTIONAL_HINTS.iter().any(|h| lower.contains(h)) {
        "Non-functional"
    } else {
        "Functional"
    }
}

fn classify_priority(sentence: &str) -> &'static str {
    let lower = sentence.to_lowercase();
    if ["must", "critical", "need", "required"]
        .iter()
        .any(|h| lower.contains(h))
    {
        "High"
    } else if ["nice to have", "could", "maybe", "eventually"]
        .iter()
        .any(|h| lower.contains(h))
    {
        "Low"
    } else {
        "Medium"
    }
}

#[async_trait]
impl LlmBackend for SimulatedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let reply = if inv.task == TASK_CHAT {
            Self::chat_reply(&inv)
        } else if inv.task == TASK_EXTRACT {
            Self::extraction_reply(&inv)
        } else if let Some(name) = section_slug(&inv.task).and_then(SectionName::from_slug) {
            Self::section_reply(name)
        } else {
            return Err(LlmError::Unsupported(format!(
                "simulated backend has no response for task '{}'",
                inv.task
            )));
        };

        debug!(
            provider = PROVIDER,
            session_id = %inv.session_id,
            task = %inv.task,
            reply_bytes = reply.len(),
            "Simulated invocation completed"
        );

        Ok(LlmResult::new(reply, PROVIDER, PROVIDER))
    }
}
