use std::sync::Arc;

use api_router::{api_routes, api_state::ApiState};
use common::{
    auth::CredentialStore,
    storage::{db::SurrealDbClient, store::StorageManager},
    utils::config::get_config,
};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;

    let db = Arc::new(
        SurrealDbClient::new(
            &config.surrealdb_address,
            &config.surrealdb_username,
            &config.surrealdb_password,
            &config.surrealdb_namespace,
            &config.surrealdb_database,
        )
        .await?,
    );

    let storage = StorageManager::new(&config).await?;
    let credentials = Arc::new(CredentialStore::open(config.credentials_path.clone()).await?);
    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));

    let state = ApiState::new(&config, db, storage, credentials, openai_client);

    let app = api_routes(&state).layer(CorsLayer::permissive());

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use common::utils::config::{AppConfig, EmbeddingBackend, StorageKind};
    use tower::ServiceExt;
    use uuid::Uuid;

    #[tokio::test]
    async fn smoke_startup_with_in_memory_backends() {
        let dir = tempfile::tempdir().expect("failed to create temp directory");
        let config = AppConfig {
            admin_secret: "secret".to_string(),
            embedding_backend: EmbeddingBackend::Hashed,
            storage: StorageKind::Memory,
            ..AppConfig::default()
        };

        let database = Uuid::new_v4().to_string();
        let db = Arc::new(
            SurrealDbClient::memory("test_ns", &database)
                .await
                .expect("failed to start in-memory surrealdb"),
        );
        let storage = StorageManager::memory();
        let credentials = Arc::new(
            CredentialStore::open(dir.path().join("users.json"))
                .await
                .expect("failed to open credential store"),
        );
        let openai_client = Arc::new(async_openai::Client::with_config(
            async_openai::config::OpenAIConfig::new()
                .with_api_key(&config.openai_api_key)
                .with_api_base(&config.openai_base_url),
        ));

        let state = ApiState::new(&config, db, storage, credentials, openai_client);
        let app = api_routes(&state).layer(CorsLayer::permissive());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/live")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);

        let ready_response = app
            .oneshot(
                Request::builder()
                    .uri("/ready")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("ready response");
        assert_eq!(ready_response.status(), StatusCode::OK);
    }
}
