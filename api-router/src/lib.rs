use api_state::ApiState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use routes::{
    admin::{create_user, delete_user, list_users},
    documents::{delete_document, list_documents, upload_document},
    probes::{live, ready, root},
    query::query,
};

pub mod api_state;
pub mod error;
mod routes;

/// Full application router: public probes plus tenant and admin operations.
///
/// Tenant routes carry `(username, password)` in the request itself and are
/// authorized per call; admin routes carry the shared secret.
pub fn api_routes(state: &ApiState) -> Router {
    let public = Router::new()
        .route("/", get(root))
        .route("/live", get(live))
        .route("/ready", get(ready));

    let tenant = Router::new()
        .route(
            "/upload",
            post(upload_document).layer(DefaultBodyLimit::max(
                state.config.upload_max_body_bytes,
            )),
        )
        .route("/query", post(query))
        .route("/list_documents", post(list_documents))
        .route("/delete_document", post(delete_document));

    let admin = Router::new()
        .route("/admin/create_user", post(create_user))
        .route("/admin/delete_user", post(delete_user))
        .route("/admin/list_users", post(list_users));

    public.merge(tenant).merge(admin).with_state(state.clone())
}
