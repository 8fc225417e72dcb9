use std::collections::BTreeMap;

use rdq_core::error::{AppError, ErrorCode};
use serde::{Deserialize, Serialize};

use crate::evidence::{Citation, EvidenceHit};
use crate::guardrails::{enforce_citations, extract_cited_chunk_ids};
use crate::llm::Llm;

mod prompts;

/// First line the model writes when the excerpts do not answer the question.
pub const NOT_IN_DOCUMENT: &str = "NOT_IN_DOCUMENT";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerResponse {
    pub question: String,
    pub markdown: String,
    pub citations: Vec<Citation>,
    /// `false` when the model reported that the excerpts do not answer the
    /// question. Such responses carry no citations.
    pub supported: bool,
}

/// Compose an answer from retrieved passages. The generated text must cite
/// only chunks that were handed in, or open with [`NOT_IN_DOCUMENT`] to
/// decline; any other uncited output is `CitationRequired`.
pub fn answer_with_llm(
    question: &str,
    hits: &[EvidenceHit],
    llm: &dyn Llm,
    model: &str,
) -> Result<AnswerResponse, AppError> {
    if hits.is_empty() {
        return Err(AppError::new(
            ErrorCode::CitationRequired,
            "At least one retrieved passage is required to answer",
        ));
    }

    let prompt = prompts::answer_prompt(question.trim(), &build_evidence_blocks(hits));
    let markdown = llm.generate(model, &prompt)?;

    if let Some(explanation) = declined(&markdown) {
        tracing::debug!(hits = hits.len(), "model found no answer in the excerpts");
        return Ok(AnswerResponse {
            question: question.trim().to_string(),
            markdown: explanation,
            citations: Vec::new(),
            supported: false,
        });
    }

    enforce_citations(&markdown).map_err(|e| {
        AppError::new(ErrorCode::CitationRequired, "Answer missing citations")
            .with_details(e.to_string())
    })?;

    let allowed: BTreeMap<&str, &EvidenceHit> =
        hits.iter().map(|h| (h.chunk_id.as_str(), h)).collect();
    let mut citations = Vec::new();
    // BTreeSet iteration keeps citations sorted by chunk id.
    for cid in extract_cited_chunk_ids(&markdown) {
        let hit = allowed.get(cid.as_str()).ok_or_else(|| {
            AppError::new(
                ErrorCode::CitationInvalid,
                "Answer cited a chunk that was not retrieved",
            )
            .with_details(format!("chunk_id={cid}"))
        })?;
        citations.push(hit.citation.clone());
    }

    Ok(AnswerResponse {
        question: question.trim().to_string(),
        markdown,
        citations,
        supported: true,
    })
}

// Explanation text after a leading NOT_IN_DOCUMENT line, if the output opens with one.
fn declined(output: &str) -> Option<String> {
    let mut lines = output.trim_start().lines();
    if lines.next()?.trim() != NOT_IN_DOCUMENT {
        return None;
    }
    let rest = lines.collect::<Vec<_>>().join("\n").trim().to_string();
    Some(if rest.is_empty() {
        "The retrieved excerpts do not answer this question.".to_string()
    } else {
        rest
    })
}

fn build_evidence_blocks(hits: &[EvidenceHit]) -> String {
    hits.iter()
        .map(|h| {
            format!(
                "[[chunk:{}]] pages={} section={}\n{}",
                h.chunk_id,
                h.citation
                    .page_refs
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(","),
                h.citation.section_path.join(" > "),
                h.text.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}
