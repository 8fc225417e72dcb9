//! Query-time retrieval: embed the question, rank the corpus, and drop
//! near-duplicate sections before the passages go to answer synthesis.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rdq_core::config::RetrievalConfig;
use rdq_core::corpus::{Chunk, Corpus};
use rdq_core::error::{AppError, ErrorCode};

use crate::embeddings::Embedder;
use crate::evidence::EvidenceHit;

pub mod index;
pub mod similarity;

pub use index::{search, ExhaustiveIndex, VectorIndex};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalResult<'c> {
    pub chunk: &'c Chunk,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrieveOptions {
    pub top_k: usize,
    pub min_score: Option<f32>,
    pub dedup_by_section: bool,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self::from_config(&RetrievalConfig::default())
    }
}

impl RetrieveOptions {
    pub fn from_config(cfg: &RetrievalConfig) -> Self {
        Self {
            top_k: cfg.top_k as usize,
            min_score: cfg.min_score,
            dedup_by_section: cfg.dedup_by_section,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

/// Caller-owned abort signal, checked before the embedding call.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn retrieve_with_embedder<'c>(
    corpus: &'c Corpus,
    embedder: &dyn Embedder,
    query: &str,
    opts: &RetrieveOptions,
    cancel: Option<&CancelFlag>,
) -> Result<Vec<RetrievalResult<'c>>, AppError> {
    retrieve_with_index(corpus, embedder, &ExhaustiveIndex, query, opts, cancel)
}

pub fn retrieve_with_index<'c>(
    corpus: &'c Corpus,
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    query: &str,
    opts: &RetrieveOptions,
    cancel: Option<&CancelFlag>,
) -> Result<Vec<RetrievalResult<'c>>, AppError> {
    let q = query.trim();
    if q.is_empty() {
        return Err(AppError::new(ErrorCode::EmptyQuery, "Query must not be empty"));
    }
    if cancel.is_some_and(CancelFlag::is_cancelled) {
        return Err(AppError::new(
            ErrorCode::Cancelled,
            "Retrieval cancelled before embedding",
        ));
    }

    let started = Instant::now();
    let model = corpus.meta().model.as_str();
    // Embed with the corpus model so query and chunk vectors share a space.
    let qv = embedder.embed(model, q).map_err(|e| {
        tracing::warn!(model, error = %e, "query embedding failed");
        AppError::new(
            ErrorCode::EmbeddingUnavailable,
            "Failed to embed query",
        )
        .with_details(format!("model={model}; err={e}"))
        .with_retryable(e.retryable)
    })?;

    let ranked = index.search(corpus, &qv, opts.top_k, opts.min_score)?;
    let ranked_count = ranked.len();
    let results = if opts.dedup_by_section {
        dedup_by_section(ranked)
    } else {
        ranked
    };

    tracing::debug!(
        top_k = opts.top_k,
        ranked = ranked_count,
        returned = results.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "retrieval complete"
    );
    Ok(results)
}

/// Keep the first (highest-ranked) chunk per heading path. Chunks with no
/// heading path are never merged with each other.
pub fn dedup_by_section<'c>(results: Vec<RetrievalResult<'c>>) -> Vec<RetrievalResult<'c>> {
    let mut seen: BTreeSet<&'c [String]> = BTreeSet::new();
    let mut out = Vec::with_capacity(results.len());
    for r in results {
        let chunk: &'c Chunk = r.chunk;
        if chunk.section_path.is_empty() || seen.insert(chunk.section_path.as_slice()) {
            out.push(r);
        }
    }
    out
}

pub fn to_hits(results: &[RetrievalResult<'_>]) -> Vec<EvidenceHit> {
    results
        .iter()
        .map(|r| EvidenceHit::new(r.chunk, r.score))
        .collect()
}
