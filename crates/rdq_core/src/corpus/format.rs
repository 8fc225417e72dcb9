use serde::{Deserialize, Serialize};

// Wire shape of the chunking/embedding stage output. Every field is optional at
// the serde layer so that a missing field is reported with its record path
// instead of a bare serde message.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusFile {
    #[serde(default)]
    pub source_document: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<u32>,
    #[serde(default)]
    pub chunks: Option<Vec<ChunkRecord>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub page_refs: Option<Vec<u32>>,
    #[serde(default)]
    pub section_path: Option<Vec<String>>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    // Producer model, when the upstream stage stamps it per record.
    #[serde(default)]
    pub model: Option<String>,
    /// Generated questions this chunk answers, each with its own embedding.
    #[serde(default)]
    pub questions: Option<Vec<QuestionRecord>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub model: Option<String>,
}
