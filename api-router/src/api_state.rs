use std::sync::Arc;

use async_openai::{config::OpenAIConfig, Client};
use common::{
    auth::{AccessGate, CredentialStore},
    storage::{db::SurrealDbClient, store::StorageManager, workspace::WorkspaceManager},
    utils::{config::AppConfig, embedding::EmbeddingProvider},
};
use ingestion_pipeline::IngestionPipeline;
use retrieval_pipeline::AnswerPipeline;

/// Shared handles for all request handlers.
#[derive(Clone)]
pub struct ApiState {
    pub gate: Arc<AccessGate>,
    pub credentials: Arc<CredentialStore>,
    pub workspace: Arc<WorkspaceManager>,
    pub ingestion: Arc<IngestionPipeline>,
    pub answers: Arc<AnswerPipeline>,
    pub db: Arc<SurrealDbClient>,
    pub embedder: Arc<EmbeddingProvider>,
    pub config: AppConfig,
}

impl ApiState {
    pub fn new(
        config: &AppConfig,
        db: Arc<SurrealDbClient>,
        storage: StorageManager,
        credentials: Arc<CredentialStore>,
        openai_client: Arc<Client<OpenAIConfig>>,
    ) -> Self {
        let embedder = Arc::new(EmbeddingProvider::from_config(
            config,
            Arc::clone(&openai_client),
        ));
        let workspace = Arc::new(WorkspaceManager::new(storage));
        let gate = Arc::new(AccessGate::new(
            Arc::clone(&credentials),
            config.admin_secret.clone(),
        ));
        let ingestion = Arc::new(IngestionPipeline::new(
            Arc::clone(&db),
            Arc::clone(&embedder),
            Arc::clone(&workspace),
        ));
        let answers = Arc::new(AnswerPipeline::new(
            Arc::clone(&db),
            Arc::clone(&embedder),
            openai_client,
            Arc::clone(&workspace),
            config,
        ));

        Self {
            gate,
            credentials,
            workspace,
            ingestion,
            answers,
            db,
            embedder,
            config: config.clone(),
        }
    }
}
