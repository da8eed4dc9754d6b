//! `archsmith generate`: one-shot generation from requirement lists and documents

use anyhow::{Context, Result};
use std::path::PathBuf;

use archsmith_utils::canonical::to_canonical_json;
use tracing::{debug, info};

use super::common::{
    build_manager, export_document, load_document, parse_manual_entry, parse_requirements_file,
};
use crate::{ArchsmithError, Config};

/// Inputs collected from the `generate` arguments.
#[derive(Debug, Default)]
pub struct GenerateRequest {
    pub requirements: Vec<String>,
    pub requirements_file: Option<PathBuf>,
    pub documents: Vec<PathBuf>,
    pub out: Option<String>,
    pub json: bool,
}

pub async fn execute_generate_command(config: Config, request: GenerateRequest) -> Result<()> {
    let mut entries = request
        .requirements
        .iter()
        .map(|line| parse_manual_entry(line).map_err(ArchsmithError::from))
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(path) = &request.requirements_file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        entries.extend(
            parse_requirements_file(&content)
                .with_context(|| format!("Invalid requirement in {}", path.display()))?,
        );
    }

    let manager = build_manager(config.clone())?;
    let (session_id, handle) = manager.start().await;
    let mut session = handle.lock().await;

    if !entries.is_empty() {
        let added = session.add_requirements(entries.into_iter().map(|e| e.into_parts()))?;
        debug!(session_id = %session_id, added = added.len(), "Manual requirements recorded");
    }

    for path in &request.documents {
        let (bytes, format, label) = load_document(path, config.documents.max_bytes)?;
        let receipt = session.submit_document(&bytes, format, &label).await?;
        if receipt.duplicate {
            eprintln!("Skipped {label}: identical to an earlier document");
        } else {
            info!(
                document_id = %receipt.document_id,
                kind = %receipt.kind,
                extracted = receipt.new_requirements.len(),
                "Attached {label}"
            );
        }
    }

    let review = session.request_review().await?;
    info!(
        requirements = review.requirements.len(),
        documents = review.documents.len(),
        "Generating architecture document"
    );

    let outcome = session.generate().await?;
    let destination = export_document(&session, &config, request.out.as_deref())?;
    let document = session.assembled_document().map_err(ArchsmithError::from)?;

    if request.json {
        let summary = serde_json::json!({
            "session_id": session_id,
            "destination": destination,
            "digest": document.digest(),
            "requirements": review.requirements.len(),
            "documents": review.documents.len(),
            "valid_sections": outcome.valid_sections,
            "fallback_sections": outcome.fallback_sections,
            "context": outcome.context,
        });
        println!("{}", to_canonical_json(&summary)?);
    } else if destination != "-" {
        eprintln!(
            "Wrote {destination}: {} sections generated, {} placeholders",
            outcome.valid_sections, outcome.fallback_sections
        );
    }

    if !outcome.context.is_lossless() {
        eprintln!(
            "Note: supporting documents were shortened to fit the context ({} truncated, {} omitted)",
            outcome.context.truncated.len(),
            outcome.context.dropped.len()
        );
    }
    Ok(())
}
