use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::{load, Corpus};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotInfo {
    pub generation: u64,
    pub fingerprint: String,
    pub chunk_count: u32,
    pub loaded_at: String, // RFC3339
}

struct Slot {
    corpus: Arc<Corpus>,
    info: SnapshotInfo,
}

/// Shared, read-mostly owner of the live corpus.
///
/// Readers take an `Arc<Corpus>` and keep using it for the whole request; a
/// reload swaps the pointer, so in-flight queries finish on the snapshot they
/// started with.
pub struct CorpusHandle {
    slot: RwLock<Slot>,
}

impl CorpusHandle {
    pub fn new(corpus: Corpus) -> Self {
        let info = info_for(&corpus, 1);
        Self {
            slot: RwLock::new(Slot {
                corpus: Arc::new(corpus),
                info,
            }),
        }
    }

    /// Load and validate `path`; a handle only exists for a valid corpus.
    pub fn open(path: &Path) -> Result<Self, AppError> {
        Ok(Self::new(load(path)?))
    }

    pub fn current(&self) -> Arc<Corpus> {
        Arc::clone(&self.slot.read().corpus)
    }

    pub fn info(&self) -> SnapshotInfo {
        self.slot.read().info.clone()
    }

    /// Swap in `corpus` and return the snapshot it replaced.
    pub fn replace(&self, corpus: Corpus) -> Arc<Corpus> {
        let next = Arc::new(corpus);
        let mut slot = self.slot.write();
        let info = info_for(&next, slot.info.generation + 1);
        tracing::info!(
            generation = info.generation,
            fingerprint = %info.fingerprint,
            chunks = info.chunk_count,
            "corpus snapshot swapped"
        );
        slot.info = info;
        std::mem::replace(&mut slot.corpus, next)
    }

    /// Load `path` and swap it in. On failure the current snapshot keeps serving.
    pub fn reload_from(&self, path: &Path) -> Result<SnapshotInfo, AppError> {
        let corpus = load(path).map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "corpus reload rejected");
            e
        })?;
        self.replace(corpus);
        Ok(self.info())
    }
}

fn info_for(corpus: &Corpus, generation: u64) -> SnapshotInfo {
    let loaded_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();
    SnapshotInfo {
        generation,
        fingerprint: corpus.meta().fingerprint.clone(),
        chunk_count: corpus.meta().chunk_count,
        loaded_at,
    }
}
