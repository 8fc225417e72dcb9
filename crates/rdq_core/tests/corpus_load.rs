use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use rdq_core::corpus::{self, Corpus};
use rdq_core::error::ErrorCode;
use serde_json::json;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_value(v: serde_json::Value) -> Result<Corpus, rdq_core::error::AppError> {
    let bytes = serde_json::to_vec(&v).expect("encode");
    Corpus::from_slice(&bytes, "inline")
}

#[test]
fn loads_fixture_with_metadata_and_page_refs() {
    let corpus = corpus::load(&fixture("risk_report_small.json")).expect("load");
    let meta = corpus.meta();
    assert_eq!(meta.model, "qwen3-embedding:0.6b");
    assert_eq!(meta.dims, 3);
    assert_eq!(meta.chunk_count, 3);
    assert_eq!(meta.source_document.as_deref(), Some("risk-disclosure-2024.pdf"));
    assert_eq!(meta.fingerprint.len(), 64);

    let chunks = corpus.chunks();
    assert_eq!(chunks[0].id, "c-0001");
    assert_eq!(chunks[1].page_refs, vec![18, 19]);
    assert_eq!(
        chunks[2].section_path,
        vec!["Risk factors".to_string(), "Operational risk".to_string()]
    );
    // Missing ids are derived from content.
    assert_eq!(chunks[2].id.len(), 64);
    assert_eq!(corpus.embedding_at(1), Some(&[0.0f32, 1.0, 0.2][..]));
    assert_eq!(
        chunks[1].questions,
        vec!["How does the bank manage liquidity risk?".to_string()]
    );
    assert!(chunks[0].questions.is_empty());
}

#[test]
fn question_embeddings_follow_chunk_rules() {
    let wrong_dims = load_value(json!({
        "model": "m",
        "dims": 2,
        "chunks": [{
            "text": "a", "page_refs": [1], "section_path": [], "embedding": [1.0, 0.0],
            "questions": [
                {"question": "ok?", "embedding": [0.0, 1.0]},
                {"question": "short?", "embedding": [1.0]}
            ]
        }]
    }))
    .expect_err("question dims");
    assert_eq!(wrong_dims.code, ErrorCode::CorpusFormat);
    assert!(wrong_dims
        .details
        .unwrap_or_default()
        .contains("chunks[0].questions[1].embedding"));

    let other_model = load_value(json!({
        "model": "qwen3-embedding:0.6b",
        "dims": 1,
        "chunks": [{
            "text": "a", "page_refs": [1], "section_path": [], "embedding": [1.0],
            "questions": [{"question": "q?", "embedding": [1.0], "model": "nomic-embed-text"}]
        }]
    }))
    .expect_err("question model");
    assert_eq!(other_model.code, ErrorCode::CorpusFormat);
    assert!(other_model
        .details
        .unwrap_or_default()
        .contains("chunks[0].questions[0].model"));

    let blank = load_value(json!({
        "model": "m",
        "dims": 1,
        "chunks": [{
            "text": "a", "page_refs": [1], "section_path": [], "embedding": [1.0],
            "questions": [{"question": "  ", "embedding": [1.0]}]
        }]
    }))
    .expect_err("blank question");
    assert_eq!(blank.details.as_deref(), Some("chunks[0].questions[0].question"));

    let missing_vector = load_value(json!({
        "model": "m",
        "dims": 1,
        "chunks": [{
            "text": "a", "page_refs": [1], "section_path": [], "embedding": [1.0],
            "questions": [{"question": "q?"}]
        }]
    }))
    .expect_err("question without embedding");
    assert_eq!(
        missing_vector.details.as_deref(),
        Some("chunks[0].questions[0].embedding")
    );
}

#[test]
fn questions_change_the_fingerprint() {
    let base = json!({
        "model": "m",
        "dims": 1,
        "chunks": [{"id": "a", "text": "a", "page_refs": [1], "section_path": [], "embedding": [1.0]}]
    });
    let mut with_question = base.clone();
    with_question["chunks"][0]["questions"] = json!([{"question": "q?", "embedding": [1.0]}]);

    let plain = load_value(base).expect("plain");
    let asked = load_value(with_question).expect("with question");
    assert_ne!(plain.meta().fingerprint, asked.meta().fingerprint);
}

#[test]
fn mismatched_embedding_dims_are_rejected() {
    let err = load_value(json!({
        "model": "m",
        "dims": 2,
        "chunks": [
            {"text": "a", "page_refs": [1], "section_path": [], "embedding": [1.0, 0.0]},
            {"text": "b", "page_refs": [2], "section_path": [], "embedding": [1.0, 0.0, 0.5]}
        ]
    }))
    .expect_err("dims mismatch");
    assert_eq!(err.code, ErrorCode::CorpusFormat);
    assert!(err.details.unwrap_or_default().contains("chunks[1].embedding"));
}

#[test]
fn empty_chunk_list_is_empty_corpus() {
    let err = load_value(json!({"model": "m", "dims": 2, "chunks": []})).expect_err("empty");
    assert_eq!(err.code, ErrorCode::EmptyCorpus);
}

#[test]
fn missing_required_fields_are_format_errors() {
    let missing_chunks = load_value(json!({"model": "m", "dims": 2})).expect_err("no chunks");
    assert_eq!(missing_chunks.code, ErrorCode::CorpusFormat);
    assert_eq!(missing_chunks.details.as_deref(), Some("chunks"));

    let missing_model = load_value(json!({"dims": 2, "chunks": []})).expect_err("no model");
    assert_eq!(missing_model.code, ErrorCode::CorpusFormat);

    let missing_pages = load_value(json!({
        "model": "m",
        "dims": 1,
        "chunks": [{"text": "a", "section_path": [], "embedding": [1.0]}]
    }))
    .expect_err("no page_refs");
    assert_eq!(missing_pages.code, ErrorCode::CorpusFormat);
    assert_eq!(missing_pages.details.as_deref(), Some("chunks[0].page_refs"));

    let missing_embedding = load_value(json!({
        "model": "m",
        "dims": 1,
        "chunks": [{"text": "a", "page_refs": [3], "section_path": []}]
    }))
    .expect_err("no embedding");
    assert_eq!(missing_embedding.details.as_deref(), Some("chunks[0].embedding"));
}

#[test]
fn record_from_another_model_is_rejected() {
    let err = load_value(json!({
        "model": "qwen3-embedding:0.6b",
        "dims": 1,
        "chunks": [
            {"text": "a", "page_refs": [1], "section_path": [], "embedding": [1.0], "model": "nomic-embed-text"}
        ]
    }))
    .expect_err("model mix");
    assert_eq!(err.code, ErrorCode::CorpusFormat);
}

#[test]
fn invalid_values_are_rejected() {
    let page_zero = load_value(json!({
        "model": "m",
        "dims": 1,
        "chunks": [{"text": "a", "page_refs": [0], "section_path": [], "embedding": [1.0]}]
    }))
    .expect_err("page 0");
    assert_eq!(page_zero.code, ErrorCode::CorpusFormat);

    let blank_text = load_value(json!({
        "model": "m",
        "dims": 1,
        "chunks": [{"text": "   ", "page_refs": [1], "section_path": [], "embedding": [1.0]}]
    }))
    .expect_err("blank text");
    assert_eq!(blank_text.code, ErrorCode::CorpusFormat);

    let zero_dims = load_value(json!({
        "model": "m",
        "dims": 0,
        "chunks": [{"text": "a", "page_refs": [1], "section_path": [], "embedding": []}]
    }))
    .expect_err("zero dims");
    assert_eq!(zero_dims.code, ErrorCode::CorpusFormat);

    let duplicate = load_value(json!({
        "model": "m",
        "dims": 1,
        "chunks": [
            {"id": "x", "text": "a", "page_refs": [1], "section_path": [], "embedding": [1.0]},
            {"id": "x", "text": "b", "page_refs": [2], "section_path": [], "embedding": [0.5]}
        ]
    }))
    .expect_err("duplicate id");
    assert_eq!(duplicate.code, ErrorCode::CorpusFormat);
}

#[test]
fn unreadable_or_malformed_files_are_format_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = corpus::load(&dir.path().join("nope.json")).expect_err("missing file");
    assert_eq!(missing.code, ErrorCode::CorpusFormat);

    let garbage = dir.path().join("garbage.json");
    fs::write(&garbage, b"{not json").expect("write");
    let err = corpus::load(&garbage).expect_err("bad json");
    assert_eq!(err.code, ErrorCode::CorpusFormat);
}
