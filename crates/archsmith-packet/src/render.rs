use std::fmt::Write as _;

use crate::bundle::ContextBundle;

impl ContextBundle {
    /// Deterministic prompt block: requirements with classification, then
    /// documents with provenance and truncation markers.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from("## Requirements\n\n");
        for req in self.requirements() {
            let _ = writeln!(
                out,
                "- {} [Priority: {} | Category: {}] {}",
                req.id(),
                req.priority(),
                req.category(),
                req.text()
            );
        }

        if !self.documents().is_empty() {
            out.push_str("\n## Supporting Documents\n");
            for doc in self.documents() {
                let _ = write!(
                    out,
                    "\n### {} ({}, {}, {})\n\n{}\n",
                    doc.label(),
                    doc.kind(),
                    doc.format(),
                    doc.id(),
                    doc.text().trim_end()
                );
                if doc.is_truncated() {
                    let _ = writeln!(
                        out,
                        "\n[... truncated: kept {} of {} bytes ...]",
                        doc.text().len(),
                        doc.original_bytes()
                    );
                }
            }
        }

        let dropped = &self.report().dropped;
        if !dropped.is_empty() {
            let _ = writeln!(
                out,
                "\n_Omitted for size: {}_",
                dropped.join(", ")
            );
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use crate::{ContextAssembler, ContextBudget};
    use archsmith_documents::{DocumentFormat, DocumentNormalizer};
    use archsmith_requirements::{Category, Priority, RequirementDraft, RequirementSet, RequirementSource};

    #[test]
    fn test_render_lists_requirements_and_marks_truncation() {
        let mut set = RequirementSet::new();
        set.add(
            RequirementDraft::new("Book rooms", Priority::High, Category::Functional, RequirementSource::Chat)
                .unwrap(),
        );
        let doc = DocumentNormalizer::new(1 << 20)
            .normalize("x".repeat(400).as_bytes(), DocumentFormat::Markdown, "design.md")
            .unwrap();

        let assembly = ContextAssembler::new(ContextBudget::new(210, 50))
            .assemble(set.as_slice(), &[doc])
            .unwrap();
        let rendered = assembly.bundle.render();

        assert!(rendered.starts_with(
            "## Requirements\n\n- REQ-001 [Priority: High | Category: Functional] Book rooms\n"
        ));
        assert!(rendered.contains("### design.md (design, markdown, doc-"));
        assert!(rendered.contains("[... truncated: kept 200 of 400 bytes ...]"));
        assert_eq!(rendered, assembly.bundle.render());
    }

    #[test]
    fn test_render_without_documents() {
        let mut set = RequirementSet::new();
        set.add(RequirementDraft::manual("Export CSV", None, None).unwrap());
        let assembly = ContextAssembler::default().assemble(set.as_slice(), &[]).unwrap();
        let rendered = assembly.bundle.render();
        assert!(!rendered.contains("Supporting Documents"));
        assert!(rendered.contains("[Priority: Medium | Category: Functional] Export CSV"));
    }
}
