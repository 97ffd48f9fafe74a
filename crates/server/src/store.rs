//! In-memory product collection, optionally mirrored to a json-server style
//! `db.json` file after every mutation.

use std::path::{Path, PathBuf};

use anyhow::Context;
use shared::{
    domain::{Product, ProductId},
    error::{ApiException, ErrorCode},
    protocol::{CatalogDocument, ProductInput},
};
use tokio::sync::RwLock;
use tracing::info;

pub struct ProductStore {
    products: RwLock<Vec<Product>>,
    persist_path: Option<PathBuf>,
}

impl ProductStore {
    pub fn in_memory(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
            persist_path: None,
        }
    }

    /// Opens the store backed by `path`, starting empty when the file does
    /// not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let products = match tokio::fs::read(&path).await {
            Ok(raw) => {
                let document: CatalogDocument = serde_json::from_slice(&raw)
                    .with_context(|| format!("failed to parse catalog file '{}'", path.display()))?;
                document.productos
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read catalog file '{}'", path.display()))
            }
        };
        info!(path = %path.display(), count = products.len(), "catalog file loaded");
        Ok(Self {
            products: RwLock::new(products),
            persist_path: Some(path),
        })
    }

    pub async fn list(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }

    pub async fn get(&self, id: &ProductId) -> Result<Product, ApiException> {
        self.products
            .read()
            .await
            .iter()
            .find(|product| &product.id == id)
            .cloned()
            .ok_or_else(|| ApiException::product_not_found(id))
    }

    pub async fn insert(&self, product: Product) -> Result<Product, ApiException> {
        validate_price(product.price)?;
        let mut products = self.products.write().await;
        if products.iter().any(|existing| existing.id == product.id) {
            return Err(ApiException::duplicate_product(&product.id));
        }
        let mut next = products.clone();
        next.push(product.clone());
        self.persist(&next).await?;
        *products = next;
        Ok(product)
    }

    pub async fn replace(
        &self,
        id: &ProductId,
        input: ProductInput,
    ) -> Result<Product, ApiException> {
        validate_price(input.price)?;
        let mut products = self.products.write().await;
        let index = position_of(&products, id)?;
        let updated = input.with_id(id.clone());
        let mut next = products.clone();
        next[index] = updated.clone();
        self.persist(&next).await?;
        *products = next;
        Ok(updated)
    }

    pub async fn remove(&self, id: &ProductId) -> Result<Product, ApiException> {
        let mut products = self.products.write().await;
        let index = position_of(&products, id)?;
        let mut next = products.clone();
        let removed = next.remove(index);
        self.persist(&next).await?;
        *products = next;
        Ok(removed)
    }

    /// Writes the candidate collection to the catalog file. Callers commit
    /// it to memory only after this succeeds.
    async fn persist(&self, products: &[Product]) -> Result<(), ApiException> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };
        let document = CatalogDocument {
            productos: products.to_vec(),
        };
        let raw = serde_json::to_vec_pretty(&document)
            .map_err(|e| ApiException::internal(e.to_string()))?;
        tokio::fs::write(path, raw).await.map_err(|e| {
            ApiException::internal(format!(
                "failed to write catalog file '{}': {e}",
                path.display()
            ))
        })
    }
}

fn position_of(products: &[Product], id: &ProductId) -> Result<usize, ApiException> {
    products
        .iter()
        .position(|product| &product.id == id)
        .ok_or_else(|| ApiException::product_not_found(id))
}

fn validate_price(price: f64) -> Result<(), ApiException> {
    if price.is_finite() && price >= 0.0 {
        Ok(())
    } else {
        Err(ApiException::new(
            ErrorCode::Validation,
            "price must be a non-negative number",
        ))
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
