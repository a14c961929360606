use std::{sync::Arc, time::Duration};

use async_openai::{
    config::OpenAIConfig,
    types::{ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs},
    Client,
};
use tokio::time::timeout;
use tracing::{info, instrument, warn};

use common::{
    error::AppError,
    storage::{
        collection::{ChunkCollection, RetrievedChunk},
        db::SurrealDbClient,
        workspace::{collection_name, ChatRecord, WorkspaceManager},
    },
    utils::{config::AppConfig, embedding::EmbeddingProvider},
};

use crate::prompt::{assemble_context, build_prompt};

/// Number of nearest chunks retrieved per question.
pub const TOP_K: usize = 3;

/// Answers a tenant's question from their own collection: retrieve the
/// nearest chunks, assemble a grounding prompt, call the text service once.
pub struct AnswerPipeline {
    db: Arc<SurrealDbClient>,
    embedder: Arc<EmbeddingProvider>,
    client: Arc<Client<OpenAIConfig>>,
    workspace: Arc<WorkspaceManager>,
    query_model: String,
    service_timeout: Duration,
}

impl AnswerPipeline {
    pub fn new(
        db: Arc<SurrealDbClient>,
        embedder: Arc<EmbeddingProvider>,
        client: Arc<Client<OpenAIConfig>>,
        workspace: Arc<WorkspaceManager>,
        config: &AppConfig,
    ) -> Self {
        Self {
            db,
            embedder,
            client,
            workspace,
            query_model: config.query_model.clone(),
            service_timeout: Duration::from_secs(config.service_timeout_secs),
        }
    }

    #[instrument(skip_all, fields(%username))]
    pub async fn answer(&self, username: &str, question: &str) -> Result<String, AppError> {
        let chunks = self.retrieve_context(username, question).await?;
        info!(retrieved = chunks.len(), "assembled grounding context");

        let context = assemble_context(&chunks);
        let prompt = build_prompt(&context, question);
        let answer = self.generate(prompt).await?;

        let record = ChatRecord::new(question, answer.clone());
        if let Err(err) = self.workspace.store_chat_artifact(username, &record).await {
            warn!(%username, error = %err, "failed to persist chat artifact");
        }

        Ok(answer)
    }

    /// Top-K similarity search scoped to the tenant's collection. An empty
    /// or never-written collection yields an empty context, not an error.
    pub async fn retrieve_context(
        &self,
        username: &str,
        question: &str,
    ) -> Result<Vec<RetrievedChunk>, AppError> {
        let collection = ChunkCollection::open(
            Arc::clone(&self.db),
            Arc::clone(&self.embedder),
            collection_name(username),
        );

        timeout(self.service_timeout, collection.query(question, TOP_K))
            .await
            .map_err(|_| {
                AppError::Retrieval(format!(
                    "vector index query timed out after {}s",
                    self.service_timeout.as_secs()
                ))
            })?
    }

    async fn generate(&self, prompt: String) -> Result<String, AppError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.query_model)
            .messages([ChatCompletionRequestUserMessage::from(prompt).into()])
            .build()
            .map_err(|err| AppError::Generation(err.to_string()))?;

        let response = timeout(self.service_timeout, self.client.chat().create(request))
            .await
            .map_err(|_| {
                AppError::Generation(format!(
                    "text service call timed out after {}s",
                    self.service_timeout.as_secs()
                ))
            })?
            .map_err(|err| AppError::Generation(err.to_string()))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .ok_or_else(|| {
                AppError::Generation("no content in text service response".to_string())
            })?;

        Ok(content.trim().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::storage::collection::ChunkMetadata;
    use common::storage::store::StorageManager;
    use uuid::Uuid;

    async fn test_pipeline() -> (AnswerPipeline, Arc<SurrealDbClient>, Arc<EmbeddingProvider>) {
        let database = Uuid::new_v4().to_string();
        let db = Arc::new(
            SurrealDbClient::memory("test_ns", &database)
                .await
                .expect("Failed to start in-memory surrealdb"),
        );
        let embedder = Arc::new(EmbeddingProvider::new_hashed(64));
        let workspace = Arc::new(WorkspaceManager::new(StorageManager::memory()));
        let client = Arc::new(Client::with_config(OpenAIConfig::new()));
        let config = AppConfig::default();

        let pipeline = AnswerPipeline::new(
            Arc::clone(&db),
            Arc::clone(&embedder),
            client,
            workspace,
            &config,
        );
        (pipeline, db, embedder)
    }

    async fn seed_chunks(
        db: &Arc<SurrealDbClient>,
        embedder: &Arc<EmbeddingProvider>,
        username: &str,
        texts: &[&str],
    ) {
        let collection = ChunkCollection::open(
            Arc::clone(db),
            Arc::clone(embedder),
            collection_name(username),
        );
        let ids = (0..texts.len()).map(|i| format!("doc.pdf_{i}")).collect();
        let documents = texts.iter().map(|t| (*t).to_string()).collect();
        let metadatas = texts
            .iter()
            .map(|_| ChunkMetadata {
                source: "doc.pdf".to_string(),
            })
            .collect();
        collection.add(ids, documents, metadatas).await.unwrap();
    }

    #[tokio::test]
    async fn retrieval_is_capped_at_top_k() {
        let (pipeline, db, embedder) = test_pipeline().await;
        seed_chunks(
            &db,
            &embedder,
            "alice",
            &["one fish", "two fish", "red fish", "blue fish"],
        )
        .await;

        let chunks = pipeline
            .retrieve_context("alice", "how many fish")
            .await
            .unwrap();
        assert_eq!(chunks.len(), TOP_K);
        assert!(chunks.iter().all(|chunk| chunk.source == "doc.pdf"));
    }

    #[tokio::test]
    async fn empty_collection_yields_empty_context() {
        let (pipeline, _db, _embedder) = test_pipeline().await;

        let chunks = pipeline
            .retrieve_context("alice", "anything at all")
            .await
            .unwrap();
        assert!(chunks.is_empty());
        assert_eq!(assemble_context(&chunks), "");
    }

    #[tokio::test]
    async fn retrieval_stays_inside_the_tenant_collection() {
        let (pipeline, db, embedder) = test_pipeline().await;
        seed_chunks(&db, &embedder, "bob", &["bob's private notes"]).await;

        let chunks = pipeline
            .retrieve_context("alice", "private notes")
            .await
            .unwrap();
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn grounding_prompt_contains_retrieved_text_and_question() {
        let (pipeline, db, embedder) = test_pipeline().await;
        seed_chunks(&db, &embedder, "alice", &["svar is a question answering service"]).await;

        let chunks = pipeline
            .retrieve_context("alice", "What is this about?")
            .await
            .unwrap();
        let prompt = build_prompt(&assemble_context(&chunks), "What is this about?");

        assert!(prompt.starts_with(crate::prompt::ANSWER_PREAMBLE));
        assert!(prompt.contains("svar is a question answering service"));
        assert!(prompt.ends_with("Question: What is this about?"));
    }
}
