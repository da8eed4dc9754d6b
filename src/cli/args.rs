//! CLI argument definitions
//!
//! The `Cli` struct carries the global flags; each subcommand lives in [`Commands`].

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// archsmith - requirement conversations to solution-architecture documents
#[derive(Parser, Debug)]
#[command(name = "archsmith")]
#[command(about = "Turn requirement conversations and supporting documents into architecture documents")]
#[command(long_about = r#"
archsmith interviews you about a system, extracts structured requirements from the
conversation and from supporting documents, and generates a ten-section solution
architecture document one validated section at a time.

EXAMPLES:
  # Interactive session
  archsmith chat

  # One-shot generation from a list of requirements
  archsmith generate --requirement "Staff book meeting rooms from a web page" --out arch.md

  # Requirements with priority and category, plus a supporting document
  archsmith generate \
      --requirement "Bookings sync with Outlook | Priority: High | Category: Constraint" \
      --doc notes/brief.md --out arch.md

  # Offline run with the simulated model
  archsmith --dry-run generate --requirements-file reqs.txt --out -

  # Show the effective configuration and where each value came from
  archsmith config

CONFIGURATION:
  Precedence: CLI flags > environment > config file > defaults
  The config file is discovered by searching upward from the current directory
  for .archsmith/config.toml. Use --config to point at a file explicitly.

SECTIONS:
  1. Executive Summary              6. Non-Functional Requirements
  2. Architecture Pattern           7. Deployment Strategy
  3. System Components              8. Integration Points
  4. Technology Stack               9. Trade-offs
  5. Data Architecture             10. Architecture Diagram Description
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Model provider: gemini, anthropic or simulated
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Use the offline simulated provider; no network calls are made
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive requirements session
    ///
    /// Type freely to describe the system. Slash commands:
    ///   /add <text> [| Priority: High] [| Category: Constraint]
    ///   /doc <path>      attach a supporting document
    ///   /review          list the requirements gathered so far
    ///   /generate        confirm and generate the document
    ///   /reset           start over
    ///   /quit            leave without generating
    Chat {
        /// Where to write the generated document ('-' for stdout)
        #[arg(long)]
        out: Option<String>,
    },

    /// Generate a document from requirements and documents in one run
    ///
    /// EXAMPLES:
    ///   archsmith generate --requirement "Users reset passwords by email" --out arch.md
    ///   archsmith generate --requirements-file reqs.txt --doc spec.pdf --out -
    Generate {
        /// Requirement text, optionally followed by '| Priority: X' and '| Category: Y'
        #[arg(long = "requirement", short = 'r')]
        requirements: Vec<String>,

        /// File with one requirement per line; blank lines and '#' comments are skipped
        #[arg(long)]
        requirements_file: Option<PathBuf>,

        /// Supporting document (pdf, docx, txt, md); may be repeated
        #[arg(long = "doc", short = 'd')]
        documents: Vec<PathBuf>,

        /// Where to write the generated document ('-' for stdout)
        #[arg(long)]
        out: Option<String>,

        /// Print a JSON summary of the run on stdout
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration with source attribution
    Config {
        /// Output as canonical JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Operation name used in error reports
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Chat { .. } => "chat",
            Self::Generate { .. } => "generate",
            Self::Config { .. } => "config",
        }
    }
}
