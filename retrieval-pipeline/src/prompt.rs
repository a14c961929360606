use common::storage::collection::RetrievedChunk;

/// Fixed instruction placed ahead of the retrieved context.
pub const ANSWER_PREAMBLE: &str =
    "You are a helpful assistant. Use the context below to answer the question.";

/// Concatenate retrieved chunk texts, separated by blank lines. Zero chunks
/// produce an empty context block rather than an error.
pub fn assemble_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.document.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The single grounding prompt sent to the text service: preamble, context,
/// then the literal question.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!("{ANSWER_PREAMBLE}\n\nContext:\n{context}\n\nQuestion: {question}")
}
