use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use shared::{
    domain::{Product, ProductId},
    protocol::ProductInput,
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub mod controller;
pub mod view;

pub use controller::{CatalogController, CatalogOperation, DeleteOutcome, EditSession};
pub use view::{CatalogRenderer, CatalogView, ConfirmPrompt, FormView, ProductCard};

pub const DEFAULT_COLLECTION_URL: &str = "http://localhost:3000/productos";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid collection url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server responded with status {status}")]
    Status { status: StatusCode },
    #[error("invalid price {input:?}: expected a number")]
    InvalidPrice { input: String },
    #[error("product {0} is not in the loaded catalog")]
    UnknownProduct(ProductId),
}

/// Remote product collection.
///
/// Every method is a single request; the store never retries and treats any
/// non-2xx status as a failure.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, CatalogError>;
    async fn create_product(&self, product: &Product) -> Result<Product, CatalogError>;
    async fn update_product(
        &self,
        id: &ProductId,
        input: &ProductInput,
    ) -> Result<Product, CatalogError>;
    async fn delete_product(&self, id: &ProductId) -> Result<(), CatalogError>;
}

/// [`CatalogStore`] backed by a json-server style REST collection.
pub struct HttpCatalogStore {
    http: Client,
    collection_url: Url,
}

impl HttpCatalogStore {
    pub fn new(collection_url: &str) -> Result<Self, CatalogError> {
        Self::with_client(Client::new(), collection_url)
    }

    pub fn with_client(http: Client, collection_url: &str) -> Result<Self, CatalogError> {
        let parsed = Url::parse(collection_url).map_err(|err| CatalogError::InvalidUrl {
            url: collection_url.to_string(),
            reason: err.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(CatalogError::InvalidUrl {
                url: collection_url.to_string(),
                reason: "url cannot address child resources".to_string(),
            });
        }
        Ok(Self {
            http,
            collection_url: parsed,
        })
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection_url
    }

    fn item_url(&self, id: &ProductId) -> Url {
        let mut url = self.collection_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(id.as_str());
        }
        url
    }
}

fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, CatalogError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(CatalogError::Status { status })
    }
}

#[async_trait]
impl CatalogStore for HttpCatalogStore {
    async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        let response = self
            .http
            .get(self.collection_url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        let products: Vec<Product> = ensure_success(response)?.json().await?;
        debug!(count = products.len(), "fetched product collection");
        Ok(products)
    }

    async fn create_product(&self, product: &Product) -> Result<Product, CatalogError> {
        let response = self
            .http
            .post(self.collection_url.clone())
            .json(product)
            .send()
            .await?;
        Ok(ensure_success(response)?.json().await?)
    }

    async fn update_product(
        &self,
        id: &ProductId,
        input: &ProductInput,
    ) -> Result<Product, CatalogError> {
        let response = self.http.put(self.item_url(id)).json(input).send().await?;
        Ok(ensure_success(response)?.json().await?)
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), CatalogError> {
        let response = self
            .http
            .delete(self.item_url(id))
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await?;
        ensure_success(response)?;
        Ok(())
    }
}

/// Next free numeric id for `products`: one past the largest integer id,
/// or `1` when there is none. Ids that are not integers are ignored.
pub fn next_id_after(products: &[Product]) -> i64 {
    products
        .iter()
        .filter_map(|product| product.id.numeric())
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

/// Picks the id for a product about to be created.
///
/// The remote store does not assign ids, so the client reads the collection
/// and uses [`next_id_after`]. When the read fails the current Unix time in
/// milliseconds is used instead; two fallbacks in the same millisecond
/// collide.
pub async fn assign_product_id(store: &dyn CatalogStore) -> ProductId {
    match store.list_products().await {
        Ok(products) => ProductId::from(next_id_after(&products)),
        Err(err) => {
            let fallback = chrono::Utc::now().timestamp_millis();
            warn!(error = %err, fallback, "could not read collection; using timestamp id");
            ProductId::from(fallback)
        }
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
