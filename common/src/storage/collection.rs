use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{error::AppError, utils::embedding::EmbeddingProvider};

use super::db::SurrealDbClient;

/// One tenant's isolated set of chunks plus their embeddings.
///
/// Each collection maps onto a dedicated SurrealDB table named after the
/// tenant. The table comes into existence on the first insert, so opening a
/// handle is an idempotent get-or-create and a query against a collection
/// nobody has written to simply returns no chunks.
pub struct ChunkCollection {
    db: Arc<SurrealDbClient>,
    embedder: Arc<EmbeddingProvider>,
    name: String,
}

/// Provenance carried alongside each submitted chunk.
#[derive(Debug, Clone)]
pub struct ChunkMetadata {
    pub source: String,
}

#[derive(Debug, Serialize)]
struct ChunkRecord {
    id: String,
    document: String,
    source: String,
    embedding: Vec<f32>,
}

/// A chunk as returned by similarity search.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub document: String,
    pub source: String,
    pub score: f32,
}

impl ChunkCollection {
    pub fn open(
        db: Arc<SurrealDbClient>,
        embedder: Arc<EmbeddingProvider>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            db,
            embedder,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Submit a batch of chunks. Embeddings are computed for the whole batch
    /// before anything is written.
    pub async fn add(
        &self,
        ids: Vec<String>,
        documents: Vec<String>,
        metadatas: Vec<ChunkMetadata>,
    ) -> Result<(), AppError> {
        if ids.len() != documents.len() || ids.len() != metadatas.len() {
            return Err(AppError::Validation(
                "chunk ids, documents and metadatas must have equal lengths".into(),
            ));
        }
        if ids.is_empty() {
            return Ok(());
        }

        let embeddings = self
            .embedder
            .embed_batch(documents.clone())
            .await
            .map_err(|err| AppError::Storage(err.to_string()))?;

        let records: Vec<ChunkRecord> = ids
            .into_iter()
            .zip(documents)
            .zip(metadatas.into_iter().zip(embeddings))
            .map(|((id, document), (metadata, embedding))| ChunkRecord {
                id,
                document,
                source: metadata.source,
                embedding,
            })
            .collect();

        debug!(collection = %self.name, chunks = records.len(), "submitting chunk batch");

        let statement = format!("INSERT INTO {} $chunks", self.name);
        self.db
            .query(statement)
            .bind(("chunks", records))
            .await
            .map_err(|err| AppError::Storage(err.to_string()))?
            .check()
            .map_err(|err| AppError::Storage(err.to_string()))?;

        Ok(())
    }

    /// Return the `n_results` chunks nearest to the query text by cosine
    /// similarity, best first.
    pub async fn query(
        &self,
        query_text: &str,
        n_results: usize,
    ) -> Result<Vec<RetrievedChunk>, AppError> {
        let embedding = self
            .embedder
            .embed(query_text)
            .await
            .map_err(|err| AppError::Retrieval(err.to_string()))?;

        let statement = format!(
            "SELECT record::id(id) AS id, document, source, \
             vector::similarity::cosine(embedding, $embedding) AS score \
             FROM {} ORDER BY score DESC LIMIT {}",
            self.name, n_results
        );

        let mut response = self
            .db
            .query(statement)
            .bind(("embedding", embedding))
            .await
            .map_err(|err| AppError::Retrieval(err.to_string()))?
            .check()
            .map_err(|err| AppError::Retrieval(err.to_string()))?;

        let chunks: Vec<RetrievedChunk> = response
            .take(0)
            .map_err(|err| AppError::Retrieval(err.to_string()))?;

        Ok(chunks)
    }

    /// Delete every chunk that was ingested from the named source document.
    pub async fn purge_source(&self, source: &str) -> Result<(), AppError> {
        let statement = format!("DELETE {} WHERE source = $source", self.name);
        self.db
            .query(statement)
            .bind(("source", source.to_owned()))
            .await
            .map_err(|err| AppError::Storage(err.to_string()))?
            .check()
            .map_err(|err| AppError::Storage(err.to_string()))?;

        Ok(())
    }

    pub async fn count(&self) -> Result<usize, AppError> {
        #[derive(Deserialize)]
        struct CountRow {
            count: usize,
        }

        let statement = format!("SELECT count() AS count FROM {} GROUP ALL", self.name);
        let mut response = self.db.query(statement).await?.check()?;
        let row: Option<CountRow> = response.take(0)?;

        Ok(row.map_or(0, |row| row.count))
    }

    /// Remove the whole collection, chunks and table alike.
    pub async fn destroy(&self) -> Result<(), AppError> {
        let statement = format!("REMOVE TABLE IF EXISTS {}", self.name);
        self.db.query(statement).await?.check()?;

        Ok(())
    }
}
