//! CLI command implementations

mod chat;
mod common;
mod config;
mod generate;

pub use chat::execute_chat_command;
pub use common::{ManualEntry, parse_manual_entry, parse_requirements_file};
pub use config::execute_config_command;
pub use generate::{GenerateRequest, execute_generate_command};
