use std::cmp::Ordering;

use rdq_core::corpus::Corpus;
use rdq_core::error::{AppError, ErrorCode};

use super::similarity::{cosine_similarity, l2_norm, DEGENERATE_SCORE};
use super::RetrievalResult;

/// Ranks corpus chunks against a query vector. This is the only place chunk
/// embeddings are read, so an approximate index can replace the scan without
/// touching callers.
pub trait VectorIndex {
    fn search<'c>(
        &self,
        corpus: &'c Corpus,
        query: &[f32],
        k: usize,
        min_score: Option<f32>,
    ) -> Result<Vec<RetrievalResult<'c>>, AppError>;
}

/// Brute-force cosine scan over the embedding arena, O(rows·d) per query.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustiveIndex;

impl VectorIndex for ExhaustiveIndex {
    fn search<'c>(
        &self,
        corpus: &'c Corpus,
        query: &[f32],
        k: usize,
        min_score: Option<f32>,
    ) -> Result<Vec<RetrievalResult<'c>>, AppError> {
        if query.len() != corpus.dims() {
            return Err(AppError::new(
                ErrorCode::DimensionMismatch,
                "Query embedding dims do not match corpus dims",
            )
            .with_details(format!(
                "corpus_dims={}; query_dims={}; model={}",
                corpus.dims(),
                query.len(),
                corpus.meta().model
            )));
        }
        if k == 0 {
            return Err(AppError::new(ErrorCode::InvalidArgument, "k must be at least 1"));
        }

        let qnorm = l2_norm(query);
        let d = corpus.dims();
        // A chunk scores as its best row: the text embedding or any question.
        let mut scored: Vec<(usize, f32)> = corpus
            .embedded_chunks()
            .enumerate()
            .map(|(i, (_, rows))| {
                let best = rows
                    .chunks_exact(d)
                    .map(|v| cosine_similarity(query, v, qnorm, l2_norm(v)))
                    .fold(DEGENERATE_SCORE, f32::max);
                (i, best)
            })
            .collect();

        // Score desc, then insertion order asc. Scores are never NaN.
        let rank = |a: &(usize, f32), b: &(usize, f32)| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        };
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, rank);
            scored.truncate(k);
        }
        scored.sort_by(rank);

        if let Some(min) = min_score {
            scored.retain(|(_, s)| *s >= min);
        }

        tracing::debug!(
            chunks = corpus.len(),
            k,
            kept = scored.len(),
            top_score = scored.first().map(|(_, s)| *s),
            "similarity search"
        );

        let chunks = corpus.chunks();
        Ok(scored
            .into_iter()
            .map(|(i, score)| RetrievalResult {
                chunk: &chunks[i],
                score,
            })
            .collect())
    }
}

/// [`ExhaustiveIndex`] search.
pub fn search<'c>(
    corpus: &'c Corpus,
    query: &[f32],
    k: usize,
    min_score: Option<f32>,
) -> Result<Vec<RetrievalResult<'c>>, AppError> {
    ExhaustiveIndex.search(corpus, query, k, min_score)
}
