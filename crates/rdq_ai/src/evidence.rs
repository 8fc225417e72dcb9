use rdq_core::corpus::Chunk;
use serde::{Deserialize, Serialize};

const SNIPPET_MAX_CHARS: usize = 280;

/// Where a retrieved passage lives in the source document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Citation {
    pub chunk_id: String,
    pub page_refs: Vec<u32>,
    pub section_path: Vec<String>,
}

impl Citation {
    pub fn for_chunk(chunk: &Chunk) -> Self {
        Self {
            chunk_id: chunk.id.clone(),
            page_refs: chunk.page_refs.clone(),
            section_path: chunk.section_path.clone(),
        }
    }

    /// `p. 12` or `pp. 18, 19`.
    pub fn pages_label(&self) -> String {
        let pages = self
            .page_refs
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        if self.page_refs.len() == 1 {
            format!("p. {pages}")
        } else {
            format!("pp. {pages}")
        }
    }
}

/// Serializable form of a retrieval result handed to answer synthesis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvidenceHit {
    pub chunk_id: String,
    pub score: f32,
    pub text: String,
    pub snippet: String,
    pub citation: Citation,
}

impl EvidenceHit {
    pub fn new(chunk: &Chunk, score: f32) -> Self {
        Self {
            chunk_id: chunk.id.clone(),
            score,
            text: chunk.text.clone(),
            snippet: snippet_first_chars(&chunk.text, SNIPPET_MAX_CHARS),
            citation: Citation::for_chunk(chunk),
        }
    }
}

pub(crate) fn snippet_first_chars(text: &str, max_chars: usize) -> String {
    let t = text.trim();
    match t.char_indices().nth(max_chars) {
        None => t.to_string(),
        Some((cut, _)) => {
            let mut s = t[..cut].to_string();
            s.push_str("...");
            s
        }
    }
}
