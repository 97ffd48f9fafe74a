use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use shared::{
    domain::{Product, ProductId},
    error::{ApiError, ApiException, ErrorCode},
    protocol::ProductInput,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod store;

use app_state::AppState;
use config::{load_settings, prepare_db_path};
use store::ProductStore;

const MAX_BODY_BYTES: usize = 64 * 1024;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[derive(Debug, Deserialize)]
struct CreateProductRequest {
    id: Option<ProductId>,
    name: String,
    price: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    let store = match settings.db_path.as_deref() {
        Some(raw) => {
            let path = prepare_db_path(raw)?;
            ProductStore::open(&path).await.map_err(|error| {
                error!(
                    path = %path.display(),
                    %error,
                    "failed to open catalog file; fix or remove it and restart"
                );
                error
            })?
        }
        None => ProductStore::in_memory(Vec::new()),
    };

    let app = build_router(Arc::new(AppState { store }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "catalog server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/productos", get(list_products).post(create_product))
        .route(
            "/productos/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_error(err: ApiException) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(message = %err.message, "catalog request failed");
    }
    (status, Json(err.into()))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_products(State(state): State<Arc<AppState>>) -> Json<Vec<Product>> {
    Json(state.store.list().await)
}

async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    state
        .store
        .get(&ProductId::new(id))
        .await
        .map(Json)
        .map_err(api_error)
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let id = req.id.filter(|id| !id.as_str().trim().is_empty()).ok_or_else(|| {
        api_error(ApiException::invalid("product id is required"))
    })?;
    let product = state
        .store
        .insert(ProductInput::new(req.name, req.price).with_id(id))
        .await
        .map_err(api_error)?;
    info!(id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> ApiResult<Json<Product>> {
    let product = state
        .store
        .replace(&ProductId::new(id), input)
        .await
        .map_err(api_error)?;
    info!(id = %product.id, "product updated");
    Ok(Json(product))
}

async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let removed = state
        .store
        .remove(&ProductId::new(id))
        .await
        .map_err(api_error)?;
    info!(id = %removed.id, "product deleted");
    Ok(Json(serde_json::json!({})))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
