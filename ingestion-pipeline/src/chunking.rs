/// Fixed chunk width in characters.
pub const CHUNK_SIZE: usize = 1000;

/// A bounded slice of extracted text, ready for submission to the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChunk {
    pub id: String,
    pub text: String,
    pub source: String,
}

/// Identifier of the chunk at `ordinal` within `filename`. Deterministic,
/// so re-ingesting the same document yields the same ids.
pub fn chunk_id(filename: &str, ordinal: usize) -> String {
    format!("{filename}_{ordinal}")
}

/// Split extracted text into consecutive `CHUNK_SIZE`-character chunks in
/// original order; the final chunk may be shorter.
///
/// Splitting is character-based rather than token- or sentence-aware. That
/// is a simplicity trade-off, not a semantic boundary guarantee.
pub fn split_into_chunks(text: &str, filename: &str) -> Vec<DocumentChunk> {
    let chars: Vec<char> = text.chars().collect();

    chars
        .chunks(CHUNK_SIZE)
        .enumerate()
        .map(|(ordinal, window)| DocumentChunk {
            id: chunk_id(filename, ordinal),
            text: window.iter().collect(),
            source: filename.to_owned(),
        })
        .collect()
}
