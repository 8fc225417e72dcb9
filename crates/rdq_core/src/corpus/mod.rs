//! Chunk store: the immutable, fully validated corpus a process serves queries against.
//!
//! A corpus is loaded once from the chunking/embedding stage output and never
//! edited in place. Updates go through [`snapshot::CorpusHandle`], which swaps a
//! whole new corpus in.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{AppError, ErrorCode};

pub mod format;
pub mod snapshot;

pub use format::{ChunkRecord, CorpusFile, QuestionRecord};
pub use snapshot::{CorpusHandle, SnapshotInfo};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub id: String,
    /// Insertion index in the corpus; also the row of this chunk's embedding.
    pub ordinal: u32,
    pub text: String,
    pub text_sha256: String,
    pub page_refs: Vec<u32>,
    pub section_path: Vec<String>,
    /// Generated questions whose embeddings also score this chunk.
    #[serde(default)]
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorpusMeta {
    pub source_document: Option<String>,
    pub model: String,
    pub dims: u32,
    pub chunk_count: u32,
    pub fingerprint: String,
}

#[derive(Debug, Clone)]
pub struct Corpus {
    meta: CorpusMeta,
    chunks: Vec<Chunk>,
    // Row-major arena. Chunk `i` owns rows `row_starts[i]..row_starts[i + 1]`:
    // its text embedding first, then one row per generated question.
    vectors: Vec<f32>,
    row_starts: Vec<usize>,
}

/// Read and validate a corpus file.
pub fn load(path: &Path) -> Result<Corpus, AppError> {
    let bytes = fs::read(path).map_err(|e| {
        AppError::corpus_format("Failed to read corpus file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    Corpus::from_slice(&bytes, &path.display().to_string())
}

impl Corpus {
    /// Parse a serialized corpus. `origin` only feeds error details and logs.
    pub fn from_slice(bytes: &[u8], origin: &str) -> Result<Self, AppError> {
        let file: CorpusFile = serde_json::from_slice(bytes).map_err(|e| {
            AppError::corpus_format("Failed to decode corpus JSON")
                .with_details(format!("origin={origin}; err={e}"))
        })?;
        Self::from_file(file, origin)
    }

    pub fn from_file(file: CorpusFile, origin: &str) -> Result<Self, AppError> {
        let model = required(file.model, "model")?;
        let model = model.trim().to_string();
        if model.is_empty() {
            return Err(AppError::corpus_format("Corpus model identifier is blank"));
        }
        let dims = required(file.dims, "dims")?;
        if dims == 0 {
            return Err(AppError::corpus_format("Corpus dims must be at least 1"));
        }
        let records = required(file.chunks, "chunks")?;
        if records.is_empty() {
            return Err(AppError::new(ErrorCode::EmptyCorpus, "Corpus contains no chunks")
                .with_details(format!("origin={origin}")));
        }

        let d = dims as usize;
        let mut chunks: Vec<Chunk> = Vec::with_capacity(records.len());
        let mut vectors: Vec<f32> = Vec::with_capacity(records.len() * d);
        let mut row_starts: Vec<usize> = Vec::with_capacity(records.len() + 1);
        let mut seen_ids: BTreeSet<String> = BTreeSet::new();

        for (i, rec) in records.into_iter().enumerate() {
            let at = |field: &str| format!("chunks[{i}].{field}");

            let text = required(rec.text, &at("text"))?;
            if text.trim().is_empty() {
                return Err(AppError::corpus_format("Chunk text is blank").with_details(at("text")));
            }

            let page_refs = required(rec.page_refs, &at("page_refs"))?;
            if page_refs.is_empty() {
                return Err(AppError::corpus_format("Chunk has no page references")
                    .with_details(at("page_refs")));
            }
            if page_refs.contains(&0) {
                return Err(AppError::corpus_format("Page numbers start at 1")
                    .with_details(at("page_refs")));
            }

            let section_path = required(rec.section_path, &at("section_path"))?;

            check_model(rec.model.as_deref(), &model, &at("model"))?;
            let embedding = required(rec.embedding, &at("embedding"))?;
            check_embedding(&embedding, d, &at("embedding"))?;

            let question_records = rec.questions.unwrap_or_default();
            let mut questions = Vec::with_capacity(question_records.len());
            let mut question_rows = Vec::with_capacity(question_records.len() * d);
            for (j, q) in question_records.into_iter().enumerate() {
                let qat = |field: &str| at(&format!("questions[{j}].{field}"));
                let question = required(q.question, &qat("question"))?;
                if question.trim().is_empty() {
                    return Err(AppError::corpus_format("Chunk question is blank")
                        .with_details(qat("question")));
                }
                check_model(q.model.as_deref(), &model, &qat("model"))?;
                let qv = required(q.embedding, &qat("embedding"))?;
                check_embedding(&qv, d, &qat("embedding"))?;
                questions.push(question);
                question_rows.extend_from_slice(&qv);
            }

            let text_sha256 = sha256_hex(text.as_bytes());
            let id = match rec.id.as_deref().map(str::trim) {
                Some(id) if !id.is_empty() => id.to_string(),
                _ => sha256_hex(format!("ordinal={i}\ntext={text}").as_bytes()),
            };
            if !seen_ids.insert(id.clone()) {
                return Err(AppError::corpus_format("Duplicate chunk id")
                    .with_details(format!("{}; id={id}", at("id"))));
            }

            row_starts.push(vectors.len() / d);
            vectors.extend_from_slice(&embedding);
            vectors.extend_from_slice(&question_rows);
            chunks.push(Chunk {
                id,
                ordinal: i as u32,
                text,
                text_sha256,
                page_refs,
                section_path,
                questions,
            });
        }
        row_starts.push(vectors.len() / d);

        let fingerprint = fingerprint(&model, dims, &chunks);
        let meta = CorpusMeta {
            source_document: file.source_document,
            model,
            dims,
            chunk_count: chunks.len() as u32,
            fingerprint,
        };

        tracing::info!(
            origin,
            chunks = meta.chunk_count,
            dims = meta.dims,
            model = %meta.model,
            fingerprint = %meta.fingerprint,
            "corpus loaded"
        );

        Ok(Self {
            meta,
            chunks,
            vectors,
            row_starts,
        })
    }

    pub fn meta(&self) -> &CorpusMeta {
        &self.meta
    }

    pub fn dims(&self) -> usize {
        self.meta.dims as usize
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Every chunk in insertion order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn get(&self, id: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.id == id)
    }

    /// Text embedding of the chunk at `ordinal`. `None` when out of range.
    pub fn embedding_at(&self, ordinal: usize) -> Option<&[f32]> {
        let d = self.dims();
        let start = self.row_starts.get(ordinal)?.checked_mul(d)?;
        let end = start.checked_add(d)?;
        self.vectors.get(start..end)
    }

    /// Chunks in insertion order, each with all of its rows concatenated: the
    /// text embedding first, then its question embeddings. Slices are always a
    /// whole number of `dims()` rows.
    pub fn embedded_chunks(&self) -> impl ExactSizeIterator<Item = (&Chunk, &[f32])> {
        let d = self.dims();
        self.chunks
            .iter()
            .zip(self.row_starts.windows(2))
            .map(move |(c, w)| (c, &self.vectors[w[0] * d..w[1] * d]))
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| {
        AppError::corpus_format("Corpus is missing a required field").with_details(field.to_string())
    })
}

fn check_model(record_model: Option<&str>, model: &str, field: &str) -> Result<(), AppError> {
    match record_model {
        Some(m) if m.trim() != model => Err(AppError::corpus_format(
            "Chunk embedding was produced by a different model",
        )
        .with_details(format!("{field}; corpus={model}; chunk={m}"))),
        _ => Ok(()),
    }
}

fn check_embedding(embedding: &[f32], dims: usize, field: &str) -> Result<(), AppError> {
    if embedding.len() != dims {
        return Err(AppError::corpus_format("Embedding dimension mismatch across chunks")
            .with_details(format!("{field}; expected={dims}; got={}", embedding.len())));
    }
    if let Some(pos) = embedding.iter().position(|x| !x.is_finite()) {
        return Err(AppError::corpus_format("Embedding contains a non-finite value")
            .with_details(format!("{field}[{pos}]")));
    }
    Ok(())
}

fn fingerprint(model: &str, dims: u32, chunks: &[Chunk]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("model={model}\ndims={dims}\n").as_bytes());
    for c in chunks {
        hasher.update(format!("{}:{}\n", c.id, c.text_sha256).as_bytes());
        for q in &c.questions {
            hasher.update(format!("q:{}\n", sha256_hex(q.as_bytes())).as_bytes());
        }
    }
    hex::encode(hasher.finalize())
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
