use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use shared::domain::{Product, ProductId};
use tokio::{net::TcpListener, sync::Mutex};

use crate::view::{CatalogRenderer, CatalogView, ConfirmPrompt, FormView};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

/// In-process stand-in for the `/productos` collection.
#[derive(Clone, Default)]
pub struct MockCatalog {
    pub products: Arc<Mutex<Vec<Product>>>,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
    pub fail_list: Arc<AtomicBool>,
    pub fail_writes: Arc<AtomicBool>,
    pub list_delays: Arc<Mutex<VecDeque<Duration>>>,
}

impl MockCatalog {
    pub async fn seed(&self, products: Vec<Product>) {
        *self.products.lock().await = products;
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn writes(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|request| request.method != "GET")
            .cloned()
            .collect()
    }

    pub async fn clear_requests(&self) {
        self.requests.lock().await.clear();
    }

    async fn record(&self, method: &'static str, path: String, body: Option<Value>) {
        self.requests
            .lock()
            .await
            .push(RecordedRequest { method, path, body });
    }
}

async fn list_products(
    State(mock): State<MockCatalog>,
) -> Result<Json<Vec<Product>>, StatusCode> {
    mock.record("GET", "/productos".to_string(), None).await;
    let snapshot = mock.products.lock().await.clone();
    let delay = mock.list_delays.lock().await.pop_front();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if mock.fail_list.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(Json(snapshot))
}

async fn create_product(
    State(mock): State<MockCatalog>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Product>), StatusCode> {
    mock.record("POST", "/productos".to_string(), Some(body.clone()))
        .await;
    if mock.fail_writes.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let product: Product = serde_json::from_value(body).map_err(|_| StatusCode::BAD_REQUEST)?;
    mock.products.lock().await.push(product.clone());
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(mock): State<MockCatalog>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Product>, StatusCode> {
    mock.record("PUT", format!("/productos/{id}"), Some(body.clone()))
        .await;
    if mock.fail_writes.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let mut products = mock.products.lock().await;
    let product = products
        .iter_mut()
        .find(|product| product.id == ProductId::new(id.as_str()))
        .ok_or(StatusCode::NOT_FOUND)?;
    product.name = body["name"].as_str().unwrap_or_default().to_string();
    product.price = body["price"].as_f64().unwrap_or_default();
    Ok(Json(product.clone()))
}

async fn delete_product(
    State(mock): State<MockCatalog>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    mock.record("DELETE", format!("/productos/{id}"), None).await;
    if mock.fail_writes.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let mut products = mock.products.lock().await;
    let before = products.len();
    products.retain(|product| product.id != ProductId::new(id.as_str()));
    if products.len() == before {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(serde_json::json!({})))
}

/// Serves `mock` on an ephemeral port and returns the collection url.
pub async fn spawn_catalog_server(mock: MockCatalog) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/productos", get(list_products).post(create_product))
        .route(
            "/productos/:id",
            axum::routing::put(update_product).delete(delete_product),
        )
        .with_state(mock);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/productos")
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    List(CatalogView),
    Count(String),
    Loading(bool),
    ShowError(String),
    HideError,
    Form(FormView),
}

#[derive(Default)]
pub struct RecordingRenderer {
    events: std::sync::Mutex<Vec<RenderEvent>>,
}

impl RecordingRenderer {
    pub fn events(&self) -> Vec<RenderEvent> {
        self.events.lock().expect("render log").clone()
    }

    pub fn last_list(&self) -> Option<CatalogView> {
        self.events().into_iter().rev().find_map(|event| match event {
            RenderEvent::List(view) => Some(view),
            _ => None,
        })
    }

    pub fn last_count(&self) -> Option<String> {
        self.events().into_iter().rev().find_map(|event| match event {
            RenderEvent::Count(text) => Some(text),
            _ => None,
        })
    }

    pub fn last_form(&self) -> Option<FormView> {
        self.events().into_iter().rev().find_map(|event| match event {
            RenderEvent::Form(form) => Some(form),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                RenderEvent::ShowError(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn error_visible(&self) -> bool {
        self.events()
            .into_iter()
            .rev()
            .find_map(|event| match event {
                RenderEvent::ShowError(_) => Some(true),
                RenderEvent::HideError => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    fn push(&self, event: RenderEvent) {
        self.events.lock().expect("render log").push(event);
    }
}

impl CatalogRenderer for RecordingRenderer {
    fn render_list(&self, view: &CatalogView) {
        self.push(RenderEvent::List(view.clone()));
    }

    fn set_count(&self, text: &str) {
        self.push(RenderEvent::Count(text.to_string()));
    }

    fn set_loading(&self, loading: bool) {
        self.push(RenderEvent::Loading(loading));
    }

    fn show_error(&self, message: &str) {
        self.push(RenderEvent::ShowError(message.to_string()));
    }

    fn hide_error(&self) {
        self.push(RenderEvent::HideError);
    }

    fn render_form(&self, form: &FormView) {
        self.push(RenderEvent::Form(form.clone()));
    }
}

pub struct ScriptedPrompt {
    answer: bool,
    asked: AtomicUsize,
}

impl ScriptedPrompt {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            asked: AtomicUsize::new(0),
        }
    }

    pub fn times_asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl ConfirmPrompt for ScriptedPrompt {
    fn confirm(&self, _message: &str) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}
