use std::collections::BTreeSet;

use rdq_core::error::{AppError, ErrorCode};

const MARKER_OPEN: &str = "[[chunk:";

/// Require at least one `[[chunk:<id>]]` marker in generated output.
pub fn enforce_citations(output: &str) -> Result<(), AppError> {
    if extract_cited_chunk_ids(output).is_empty() {
        return Err(AppError::new(
            ErrorCode::CitationRequired,
            "Generated answer must cite retrieved chunks",
        ));
    }
    Ok(())
}

/// Chunk ids referenced by well-formed `[[chunk:<id>]]` markers.
pub fn extract_cited_chunk_ids(text: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    let mut rest = text;
    while let Some(pos) = rest.find(MARKER_OPEN) {
        let after_open = &rest[pos + MARKER_OPEN.len()..];
        match after_open.find("]]") {
            Some(end) => {
                let id = after_open[..end].trim();
                if !id.is_empty() && !id.contains('[') {
                    out.insert(id.to_string());
                }
                rest = &after_open[end + 2..];
            }
            None => break,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_ids_and_skips_malformed_markers() {
        let ids = extract_cited_chunk_ids(
            "Rates [[chunk:c-1]] and FX [[chunk: c-2 ]]; dup [[chunk:c-1]] empty [[chunk:]] open [[chunk:c-9",
        );
        assert_eq!(
            ids.into_iter().collect::<Vec<_>>(),
            vec!["c-1".to_string(), "c-2".to_string()]
        );
    }
}
