//! Catalog controller: keeps the rendered catalog and the product form in
//! step with the remote collection.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::{
    domain::{Product, ProductId},
    protocol::ProductInput,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::{
    assign_product_id,
    view::{
        count_label, CatalogRenderer, CatalogView, ConfirmPrompt, FormView, ADD_PRODUCT_LABEL,
        UPDATE_PRODUCT_LABEL,
    },
    CatalogError, CatalogStore,
};

pub const DEFAULT_ERROR_BANNER_TTL: Duration = Duration::from_secs(5);
pub const DELETE_CONFIRMATION: &str = "Are you sure you want to delete this product?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOperation {
    Load,
    Create,
    Update,
    Delete,
}

impl CatalogOperation {
    pub fn banner_prefix(self) -> &'static str {
        match self {
            Self::Load => "Error loading products:",
            Self::Create => "Error creating product:",
            Self::Update => "Error updating product:",
            Self::Delete => "Error deleting product:",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Declined,
    Deleted,
}

/// Which product, if any, the form is editing. Absent means create mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSession {
    active_id: Option<ProductId>,
}

impl EditSession {
    pub fn active_id(&self) -> Option<&ProductId> {
        self.active_id.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.active_id.is_some()
    }

    fn begin(&mut self, id: ProductId) {
        self.active_id = Some(id);
    }

    fn clear(&mut self) {
        self.active_id = None;
    }
}

#[derive(Debug, Clone, Default)]
struct FormFields {
    name: String,
    price: String,
}

#[derive(Default)]
struct ViewState {
    products: Vec<Product>,
    session: EditSession,
    form: FormFields,
}

impl ViewState {
    fn form_view(&self) -> FormView {
        let editing = self.session.is_editing();
        FormView {
            name: self.form.name.clone(),
            price: self.form.price.clone(),
            submit_label: if editing {
                UPDATE_PRODUCT_LABEL
            } else {
                ADD_PRODUCT_LABEL
            },
            cancel_visible: editing,
        }
    }

    fn reset_form(&mut self) {
        self.session.clear();
        self.form = FormFields::default();
    }
}

/// Timed error banner. Each message hides itself after `ttl` unless a newer
/// message replaced it first.
struct ErrorBanner {
    renderer: Arc<dyn CatalogRenderer>,
    ttl: Duration,
    shown: Arc<AtomicU64>,
}

impl ErrorBanner {
    fn show(&self, message: &str) {
        let token = self.shown.fetch_add(1, Ordering::SeqCst) + 1;
        self.renderer.show_error(message);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let renderer = Arc::clone(&self.renderer);
        let shown = Arc::clone(&self.shown);
        let ttl = self.ttl;
        runtime.spawn(async move {
            tokio::time::sleep(ttl).await;
            if shown.load(Ordering::SeqCst) == token {
                renderer.hide_error();
            }
        });
    }
}

pub fn parse_price(input: &str) -> Result<f64, CatalogError> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite())
        .ok_or_else(|| CatalogError::InvalidPrice {
            input: input.to_string(),
        })
}

pub struct CatalogController {
    store: Arc<dyn CatalogStore>,
    renderer: Arc<dyn CatalogRenderer>,
    prompt: Arc<dyn ConfirmPrompt>,
    banner: ErrorBanner,
    inner: Mutex<ViewState>,
    loading: AtomicBool,
    load_token: AtomicU64,
}

/// Clears the loading indicator when the load holding it finishes or is
/// dropped, unless a newer load has started since.
struct LoadingGuard<'a> {
    controller: &'a CatalogController,
    token: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.controller.load_token.load(Ordering::SeqCst) == self.token {
            self.controller.set_loading(false);
        }
    }
}

impl CatalogController {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        renderer: Arc<dyn CatalogRenderer>,
        prompt: Arc<dyn ConfirmPrompt>,
    ) -> Self {
        Self::new_with_banner_ttl(store, renderer, prompt, DEFAULT_ERROR_BANNER_TTL)
    }

    pub fn new_with_banner_ttl(
        store: Arc<dyn CatalogStore>,
        renderer: Arc<dyn CatalogRenderer>,
        prompt: Arc<dyn ConfirmPrompt>,
        banner_ttl: Duration,
    ) -> Self {
        Self {
            store,
            banner: ErrorBanner {
                renderer: Arc::clone(&renderer),
                ttl: banner_ttl,
                shown: Arc::new(AtomicU64::new(0)),
            },
            renderer,
            prompt,
            inner: Mutex::new(ViewState::default()),
            loading: AtomicBool::new(false),
            load_token: AtomicU64::new(0),
        }
    }

    /// Products as of the last successful load.
    pub async fn products(&self) -> Vec<Product> {
        self.inner.lock().await.products.clone()
    }

    pub async fn session(&self) -> EditSession {
        self.inner.lock().await.session.clone()
    }

    pub async fn form(&self) -> FormView {
        self.inner.lock().await.form_view()
    }

    pub async fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Fetches the collection and re-renders the list and count.
    ///
    /// Failures go to the error banner and leave the rendered list as it was.
    /// Only the most recently started load may apply its outcome; an older
    /// load that resolves later is dropped. The newest load clears the
    /// loading indicator even if its future is dropped mid-request.
    pub async fn load_products(&self) {
        let token = self.load_token.fetch_add(1, Ordering::SeqCst) + 1;
        self.set_loading(true);
        let _loading = LoadingGuard {
            controller: self,
            token,
        };

        let result = self.store.list_products().await;
        if self.load_token.load(Ordering::SeqCst) != token {
            debug!(token, "discarding stale product list response");
            return;
        }

        match result {
            Ok(products) => {
                let mut guard = self.inner.lock().await;
                let active_gone = guard
                    .session
                    .active_id()
                    .is_some_and(|id| !products.iter().any(|product| &product.id == id));
                if active_gone {
                    guard.reset_form();
                    self.renderer.render_form(&guard.form_view());
                }
                self.renderer
                    .render_list(&CatalogView::from_products(&products));
                self.renderer.set_count(&count_label(products.len()));
                guard.products = products;
            }
            Err(err) => {
                error!(error = %err, "failed to load products");
                self.report(CatalogOperation::Load, &err);
            }
        }
    }

    pub async fn next_product_id(&self) -> ProductId {
        assign_product_id(self.store.as_ref()).await
    }

    /// Assigns an id and posts the product. Does not reload the list.
    pub async fn create_product(&self, input: ProductInput) -> Result<Product, CatalogError> {
        let id = self.next_product_id().await;
        match self.store.create_product(&input.with_id(id)).await {
            Ok(created) => {
                info!(id = %created.id, name = %created.name, "product created");
                Ok(created)
            }
            Err(err) => {
                error!(error = %err, "failed to create product");
                self.report(CatalogOperation::Create, &err);
                Err(err)
            }
        }
    }

    /// Writes `input` to product `id`. Does not reload the list.
    pub async fn update_product(
        &self,
        id: &ProductId,
        input: ProductInput,
    ) -> Result<Product, CatalogError> {
        match self.store.update_product(id, &input).await {
            Ok(updated) => {
                info!(%id, "product updated");
                Ok(updated)
            }
            Err(err) => {
                error!(%id, error = %err, "failed to update product");
                self.report(CatalogOperation::Update, &err);
                Err(err)
            }
        }
    }

    /// Deletes product `id` once the user confirms, then reloads the list.
    pub async fn delete_product(&self, id: &ProductId) -> Result<DeleteOutcome, CatalogError> {
        if !self.prompt.confirm(DELETE_CONFIRMATION) {
            debug!(%id, "delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        if let Err(err) = self.store.delete_product(id).await {
            error!(%id, error = %err, "failed to delete product");
            self.report(CatalogOperation::Delete, &err);
            return Err(err);
        }

        info!(%id, "product deleted");
        self.load_products().await;
        Ok(DeleteOutcome::Deleted)
    }

    /// Switches the form to edit mode for `product`.
    pub async fn begin_edit(&self, product: &Product) {
        let mut guard = self.inner.lock().await;
        guard.session.begin(product.id.clone());
        guard.form = FormFields {
            name: product.name.clone(),
            price: product.price.to_string(),
        };
        self.renderer.render_form(&guard.form_view());
    }

    pub async fn begin_edit_by_id(&self, id: &ProductId) -> Result<(), CatalogError> {
        let product = {
            let guard = self.inner.lock().await;
            guard
                .products
                .iter()
                .find(|product| &product.id == id)
                .cloned()
        }
        .ok_or_else(|| CatalogError::UnknownProduct(id.clone()))?;
        self.begin_edit(&product).await;
        Ok(())
    }

    /// Leaves edit mode without touching the remote store.
    pub async fn cancel_edit(&self) {
        let mut guard = self.inner.lock().await;
        guard.reset_form();
        self.renderer.render_form(&guard.form_view());
    }

    pub async fn set_form_name(&self, name: impl Into<String>) {
        let mut guard = self.inner.lock().await;
        guard.form.name = name.into();
        self.renderer.render_form(&guard.form_view());
    }

    pub async fn set_form_price(&self, price: impl Into<String>) {
        let mut guard = self.inner.lock().await;
        guard.form.price = price.into();
        self.renderer.render_form(&guard.form_view());
    }

    /// Submits the form: updates the active product in edit mode, creates a
    /// new one otherwise. On success the form returns to create mode and the
    /// list is reloaded; on failure the form is left as it was.
    pub async fn submit(&self) -> Result<Product, CatalogError> {
        let (active_id, fields) = {
            let guard = self.inner.lock().await;
            (guard.session.active_id().cloned(), guard.form.clone())
        };
        let operation = if active_id.is_some() {
            CatalogOperation::Update
        } else {
            CatalogOperation::Create
        };

        let price = match parse_price(&fields.price) {
            Ok(price) => price,
            Err(err) => {
                self.report(operation, &err);
                return Err(err);
            }
        };
        let input = ProductInput::new(fields.name, price);

        let saved = match active_id {
            Some(id) => self.update_product(&id, input).await?,
            None => self.create_product(input).await?,
        };

        self.cancel_edit().await;
        self.load_products().await;
        Ok(saved)
    }

    /// Fills the form and submits it in one step.
    pub async fn submit_with(
        &self,
        name: impl Into<String>,
        price: impl Into<String>,
    ) -> Result<Product, CatalogError> {
        {
            let mut guard = self.inner.lock().await;
            guard.form = FormFields {
                name: name.into(),
                price: price.into(),
            };
        }
        self.submit().await
    }

    fn set_loading(&self, loading: bool) {
        self.loading.store(loading, Ordering::SeqCst);
        self.renderer.set_loading(loading);
    }

    fn report(&self, operation: CatalogOperation, err: &CatalogError) {
        self.banner
            .show(&format!("{} {err}", operation.banner_prefix()));
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
