use std::path::PathBuf;
use std::sync::Arc;

use rdq_ai::embeddings::Embedder;
use rdq_ai::retrieve::{retrieve_with_embedder, to_hits, RetrieveOptions};
use rdq_core::corpus::CorpusHandle;
use rdq_core::error::AppError;

/// Keyword-to-axis embedder matching the 3-d fixture corpus.
struct KeywordEmbedder;

impl Embedder for KeywordEmbedder {
    fn embed(&self, _model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        let t = input.to_lowercase();
        let axis = |kw: &str| if t.contains(kw) { 1.0 } else { 0.0 };
        Ok(vec![axis("market"), axis("liquidity"), axis("operational")])
    }
}

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("rdq_core")
        .join("tests")
        .join("fixtures")
        .join("risk_report_small.json")
}

#[test]
fn loaded_corpus_answers_with_page_refs() {
    let handle = CorpusHandle::open(&fixture()).expect("open");
    let corpus = handle.current();
    let res = retrieve_with_embedder(
        &corpus,
        &KeywordEmbedder,
        "How is liquidity risk managed?",
        &RetrieveOptions::default().with_top_k(1),
        None,
    )
    .expect("retrieve");
    let hits = to_hits(&res);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk_id, "c-0002");
    assert_eq!(hits[0].citation.page_refs, vec![18, 19]);
}

#[test]
fn concurrent_queries_share_the_snapshot_read_only() {
    let handle = Arc::new(CorpusHandle::open(&fixture()).expect("open"));
    let workers: Vec<_> = ["market", "liquidity", "operational", "market and liquidity"]
        .into_iter()
        .map(|q| {
            let h = Arc::clone(&handle);
            std::thread::spawn(move || {
                let corpus = h.current();
                let res = retrieve_with_embedder(
                    &corpus,
                    &KeywordEmbedder,
                    q,
                    &RetrieveOptions::default(),
                    None,
                )
                .expect("retrieve");
                res.len()
            })
        })
        .collect();

    // A reload while queries run swaps the pointer without disturbing them.
    handle.reload_from(&fixture()).expect("reload");
    for w in workers {
        assert_eq!(w.join().expect("join"), 3);
    }
    assert_eq!(handle.info().generation, 2);
}
