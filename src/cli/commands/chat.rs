//! `archsmith chat`: interactive requirements session on stdin/stdout

use anyhow::Result;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use tracing::warn;

use super::common::{build_manager, export_document, load_document, parse_manual_entry};
use crate::{ArchsmithError, Config, ConversationPhase, ReviewSnapshot, Session};

const GREETING: &str = "Describe the system you want to build. Type /help for commands.";

const HELP: &str = "\
Commands:
  /add <text> [| Priority: High] [| Category: Constraint]   record a requirement
  /doc <path>                                              attach a supporting document
  /review                                                  list gathered requirements
  /generate                                                confirm and generate the document
  /reset                                                   start over
  /quit                                                    leave without generating";

#[derive(Debug, Clone, PartialEq, Eq)]
enum ChatCommand {
    Message(String),
    Add(String),
    Document(PathBuf),
    Review,
    Generate,
    Reset,
    Help,
    Quit,
    Unknown(String),
}

impl ChatCommand {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Message(line.to_string());
        };
        let (name, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let arg = arg.trim();
        match name.to_ascii_lowercase().as_str() {
            "add" => Self::Add(arg.to_string()),
            "doc" => Self::Document(PathBuf::from(arg)),
            "review" => Self::Review,
            "generate" => Self::Generate,
            "reset" => Self::Reset,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

enum Flow {
    Continue,
    Stop,
}

pub async fn execute_chat_command(config: Config, out: Option<&str>) -> Result<()> {
    let manager = build_manager(config.clone())?;
    let (_, handle) = manager.start().await;
    let mut session = handle.lock().await;

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout.write_all(format!("{GREETING}\n> ").as_bytes()).await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;
            continue;
        }
        let command = ChatCommand::parse(&line);
        match handle_command(&mut session, &config, out, command).await {
            Ok((text, Flow::Continue)) => {
                stdout.write_all(format!("{text}\n> ").as_bytes()).await?;
            }
            Ok((text, Flow::Stop)) => {
                stdout.write_all(format!("{text}\n").as_bytes()).await?;
                stdout.flush().await?;
                return Ok(());
            }
            Err(err) => {
                let message = match err.downcast_ref::<ArchsmithError>() {
                    Some(e) => e.display_for_user(),
                    None => format!("{err:#}"),
                };
                warn!(phase = %session.phase(), "Chat command failed");
                stdout.write_all(format!("{message}\n> ").as_bytes()).await?;
            }
        }
        stdout.flush().await?;
    }
    Ok(())
}

async fn handle_command(
    session: &mut Session,
    config: &Config,
    out: Option<&str>,
    command: ChatCommand,
) -> Result<(String, Flow)> {
    let text = match command {
        ChatCommand::Message(text) => session.submit_message(&text).await?.reply,
        ChatCommand::Add(line) => {
            let entry = parse_manual_entry(&line).map_err(ArchsmithError::from)?;
            let (text, priority, category) = entry.into_parts();
            match session.add_requirement(&text, priority, category)? {
                Some(req) => format!("Recorded {req}"),
                None => "Already recorded.".to_string(),
            }
        }
        ChatCommand::Document(path) => {
            let (bytes, format, label) = load_document(&path, config.documents.max_bytes)?;
            let receipt = session.submit_document(&bytes, format, &label).await?;
            if receipt.duplicate {
                format!("{label} was already attached.")
            } else {
                format!(
                    "Attached {label} as {}; {} requirement(s) found in it.",
                    receipt.kind,
                    receipt.new_requirements.len()
                )
            }
        }
        ChatCommand::Review => render_review(&session.request_review().await?),
        ChatCommand::Generate => {
            if session.phase() != ConversationPhase::Reviewing {
                session.request_review().await?;
            }
            let outcome = session.generate().await?;
            let destination = export_document(session, config, out)?;
            let text = format!(
                "Generated {} sections ({} placeholders). Document: {destination}",
                outcome.valid_sections, outcome.fallback_sections
            );
            return Ok((text, Flow::Stop));
        }
        ChatCommand::Reset => {
            session.reset().map_err(ArchsmithError::from)?;
            "Session cleared.".to_string()
        }
        ChatCommand::Help => HELP.to_string(),
        ChatCommand::Quit => return Ok(("Goodbye.".to_string(), Flow::Stop)),
        ChatCommand::Unknown(name) => format!("Unknown command '/{name}'. Type /help."),
    };
    Ok((text, Flow::Continue))
}

fn render_review(snapshot: &ReviewSnapshot) -> String {
    let mut out = format!("Requirements ({}):", snapshot.requirements.len());
    if snapshot.requirements.is_empty() {
        out.push_str("\n  (none yet)");
    }
    for req in &snapshot.requirements {
        out.push_str("\n  ");
        out.push_str(&req.to_string());
    }
    if !snapshot.documents.is_empty() {
        out.push_str(&format!("\nDocuments ({}):", snapshot.documents.len()));
        for doc in &snapshot.documents {
            out.push_str(&format!("\n  {} ({}, {} bytes)", doc.label, doc.kind, doc.size_bytes));
        }
    }
    out.push_str("\nType /generate to confirm, or keep describing the system.");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session_manager;

    fn simulated_config() -> Config {
        Config::builder().provider("simulated").build().unwrap()
    }

    #[test]
    fn test_parse_chat_commands() {
        assert_eq!(
            ChatCommand::parse("  We need SSO  "),
            ChatCommand::Message("We need SSO".to_string())
        );
        assert_eq!(
            ChatCommand::parse("/add Users log in | Priority: High"),
            ChatCommand::Add("Users log in | Priority: High".to_string())
        );
        assert_eq!(
            ChatCommand::parse("/doc notes/brief.md"),
            ChatCommand::Document(PathBuf::from("notes/brief.md"))
        );
        assert_eq!(ChatCommand::parse("/REVIEW"), ChatCommand::Review);
        assert_eq!(ChatCommand::parse("/exit"), ChatCommand::Quit);
        assert_eq!(
            ChatCommand::parse("/frobnicate now"),
            ChatCommand::Unknown("frobnicate".to_string())
        );
    }

    #[tokio::test]
    async fn test_review_lists_added_requirements() {
        let config = simulated_config();
        let (manager, _) = session_manager(config.clone()).unwrap();
        let (_, handle) = manager.start().await;
        let mut session = handle.lock().await;

        let (text, _) = handle_command(
            &mut session,
            &config,
            None,
            ChatCommand::Add("Staff book rooms | Category: Functional".to_string()),
        )
        .await
        .unwrap();
        assert!(text.starts_with("Recorded"));

        let (text, _) = handle_command(&mut session, &config, None, ChatCommand::Review)
            .await
            .unwrap();
        assert!(text.contains("Requirements (1):"));
        assert!(text.contains("Staff book rooms"));
        assert_eq!(session.phase(), ConversationPhase::Reviewing);
    }

    #[tokio::test]
    async fn test_generate_with_nothing_gathered_keeps_reviewing() {
        let config = simulated_config();
        let (manager, _) = session_manager(config.clone()).unwrap();
        let (_, handle) = manager.start().await;
        let mut session = handle.lock().await;

        let err = handle_command(&mut session, &config, None, ChatCommand::Generate)
            .await
            .err()
            .unwrap();
        assert_eq!(
            err.downcast_ref::<ArchsmithError>().map(ArchsmithError::to_exit_code),
            Some(crate::ExitCode::CONTEXT_UNAVAILABLE)
        );
        assert_eq!(session.phase(), ConversationPhase::Reviewing);
    }
}
