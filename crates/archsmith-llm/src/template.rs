//! Prompt templates for shaping one-shot model requests
//!
//! The same instructions and context are wrapped differently depending on the
//! provider family: a single user message, Claude-style XML tags, or an
//! OpenAI-style system/user split.

use crate::types::Message;

const PERSONA: &str = "You are archsmith, a senior solution architect.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptTemplate {
    /// Instructions and context in a single user message
    #[default]
    Default,
    /// System prompt plus `<instructions>`/`<context>` tags
    ClaudeOptimized,
    /// System prompt plus a user message with a `Context:` block
    OpenAiCompatible,
}

impl PromptTemplate {
    /// Parse a template name (case-insensitive, with short aliases).
    ///
    /// # Errors
    ///
    /// Returns a message listing the available templates for unknown names
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "claude-optimized" | "claude_optimized" | "claude" => Ok(Self::ClaudeOptimized),
            "openai-compatible" | "openai_compatible" | "openai" => Ok(Self::OpenAiCompatible),
            _ => Err(format!(
                "Unknown prompt template '{s}'. Available templates: default, claude-optimized, openai-compatible"
            )),
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::ClaudeOptimized => "claude-optimized",
            Self::OpenAiCompatible => "openai-compatible",
        }
    }

    /// Wrap `instructions` and `context` into messages for this template.
    ///
    /// An empty context is omitted entirely.
    #[must_use]
    pub fn build_messages(&self, instructions: &str, context: &str) -> Vec<Message> {
        let instructions = instructions.trim();
        let context = context.trim();
        let has_context = !context.is_empty();

        match self {
            Self::Default => {
                let mut content = format!("{PERSONA}\n\n{instructions}");
                if has_context {
                    content.push_str("\n\n# Context Packet\n");
                    content.push_str(context);
                }
                vec![Message::user(content)]
            }
            Self::ClaudeOptimized => {
                let mut content = format!("<instructions>\n{instructions}\n</instructions>");
                if has_context {
                    content.push_str("\n<context>\n");
                    content.push_str(context);
                    content.push_str("\n</context>");
                }
                vec![
                    Message::system(format!(
                        "{PERSONA} Follow the <instructions> and use <context> when provided. \
                         Output only the requested content."
                    )),
                    Message::user(content),
                ]
            }
            Self::OpenAiCompatible => {
                let mut content = instructions.to_string();
                if has_context {
                    content.push_str("\n\nContext:\n");
                    content.push_str(context);
                }
                vec![
                    Message::system(format!(
                        "{PERSONA} Follow the instructions and use the provided context."
                    )),
                    Message::user(content),
                ]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn test_parse_names_and_aliases() {
        assert_eq!(PromptTemplate::parse("DEFAULT").unwrap(), PromptTemplate::Default);
        assert_eq!(
            PromptTemplate::parse("claude").unwrap(),
            PromptTemplate::ClaudeOptimized
        );
        assert_eq!(
            PromptTemplate::parse("openai_compatible").unwrap(),
            PromptTemplate::OpenAiCompatible
        );
        let err = PromptTemplate::parse("mistral").unwrap_err();
        assert!(err.contains("claude-optimized"));
    }

    #[test]
    fn test_as_str_round_trips_through_parse() {
        for template in [
            PromptTemplate::Default,
            PromptTemplate::ClaudeOptimized,
            PromptTemplate::OpenAiCompatible,
        ] {
            assert_eq!(PromptTemplate::parse(template.as_str()).unwrap(), template);
        }
    }

    #[test]
    fn test_default_template_single_user_message() {
        let messages = PromptTemplate::Default.build_messages("Write it.", "REQ-001 ...");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert!(messages[0].content.contains("Write it.\n\n# Context Packet\nREQ-001 ..."));
    }

    #[test]
    fn test_claude_template_uses_tags() {
        let messages = PromptTemplate::ClaudeOptimized.build_messages("Write it.", "ctx");
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(
            messages[1].content,
            "<instructions>\nWrite it.\n</instructions>\n<context>\nctx\n</context>"
        );
    }

    #[test]
    fn test_empty_context_is_omitted() {
        let messages = PromptTemplate::OpenAiCompatible.build_messages("Write it.", "  \n");
        assert_eq!(messages[1].content, "Write it.");
        let messages = PromptTemplate::Default.build_messages("Write it.", "");
        assert!(!messages[0].content.contains("Context Packet"));
    }
}
