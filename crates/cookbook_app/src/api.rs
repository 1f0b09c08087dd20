//! Read-only HTTP view of the persisted catalog.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use cookbook_core::{query_templates, TemplateQuery};
use cookbook_engine::CatalogStore;
use cookbook_logging::{cookbook_error, cookbook_info};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// `GET /templates?source=&limit=`; the catalog is re-read on every request.
pub fn router(store: CatalogStore) -> Router {
    Router::new()
        .route(
            "/templates",
            get(list_templates)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(Arc::new(store))
}

pub async fn serve(addr: SocketAddr, store: CatalogStore) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    cookbook_info!("serving {} on http://{}", store.path().display(), listener.local_addr()?);
    axum::serve(listener, router(store))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

async fn list_templates(
    State(store): State<Arc<CatalogStore>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let limit = match params.get("limit").map(|raw| raw.trim()).filter(|raw| !raw.is_empty()) {
        None => None,
        Some(raw) => match raw.parse::<usize>() {
            Ok(limit) => Some(limit),
            Err(err) => {
                return error(StatusCode::BAD_REQUEST, format!("invalid limit '{raw}': {err}"))
            }
        },
    };
    let query = TemplateQuery {
        source: params.get("source").cloned(),
        limit,
    };

    let loaded = tokio::task::spawn_blocking(move || store.load()).await;
    let catalog = match loaded {
        Ok(Ok(catalog)) => catalog,
        Ok(Err(err)) => {
            cookbook_error!("catalog read failed: {}", err);
            return error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
        }
        Err(err) => {
            cookbook_error!("catalog read task failed: {}", err);
            return error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
        }
    };

    Json(query_templates(catalog.records(), &query)).into_response()
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> Response {
    error(StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
}

fn error(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
