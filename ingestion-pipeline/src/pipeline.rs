use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::{info, instrument};

use common::{
    error::AppError,
    storage::{
        collection::{ChunkCollection, ChunkMetadata},
        db::SurrealDbClient,
        workspace::{collection_name, WorkspaceManager},
    },
    utils::embedding::EmbeddingProvider,
};

use crate::{chunking::split_into_chunks, extraction::extract_text};

/// Outcome of a completed ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub filename: String,
    pub chunk_count: usize,
}

/// Turns an uploaded document into queryable chunks in the tenant's
/// collection: persist raw bytes, extract text, split, submit.
pub struct IngestionPipeline {
    db: Arc<SurrealDbClient>,
    embedder: Arc<EmbeddingProvider>,
    workspace: Arc<WorkspaceManager>,
}

impl IngestionPipeline {
    pub fn new(
        db: Arc<SurrealDbClient>,
        embedder: Arc<EmbeddingProvider>,
        workspace: Arc<WorkspaceManager>,
    ) -> Self {
        Self {
            db,
            embedder,
            workspace,
        }
    }

    /// The raw document write is not rolled back when a later stage fails;
    /// the file stays in the workspace while the collection keeps its prior
    /// chunks.
    #[instrument(skip_all, fields(%username, %filename))]
    pub async fn ingest(
        &self,
        username: &str,
        filename: &str,
        bytes: Bytes,
    ) -> Result<IngestReport, AppError> {
        self.workspace
            .store_document(username, filename, bytes.clone())
            .await?;

        let text = extract_text(bytes, filename).await?;
        let chunks = split_into_chunks(&text, filename);
        let chunk_count = chunks.len();

        let mut ids = Vec::with_capacity(chunk_count);
        let mut documents = Vec::with_capacity(chunk_count);
        let mut metadatas = Vec::with_capacity(chunk_count);
        for chunk in chunks {
            ids.push(chunk.id);
            documents.push(chunk.text);
            metadatas.push(ChunkMetadata {
                source: chunk.source,
            });
        }

        let collection = ChunkCollection::open(
            Arc::clone(&self.db),
            Arc::clone(&self.embedder),
            collection_name(username),
        );

        // Replace chunks from any previous upload of this filename, so a
        // shorter re-upload leaves no stale tail entries behind.
        collection.purge_source(filename).await?;
        collection.add(ids, documents, metadatas).await?;

        info!(
            chunk_count,
            collection = collection.name(),
            "document ingested"
        );

        Ok(IngestReport {
            filename: filename.to_owned(),
            chunk_count,
        })
    }
}
