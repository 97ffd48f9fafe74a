//! View model and the UI capabilities the controller drives.

use shared::domain::{Product, ProductId};

pub const EMPTY_CATALOG_PLACEHOLDER: &str = "No products available";
pub const ADD_PRODUCT_LABEL: &str = "Add Product";
pub const UPDATE_PRODUCT_LABEL: &str = "Update Product";

/// Output side of the catalog UI.
///
/// Implementations only draw; they never call back into the controller.
pub trait CatalogRenderer: Send + Sync {
    fn render_list(&self, view: &CatalogView);
    fn set_count(&self, text: &str);
    fn set_loading(&self, loading: bool);
    fn show_error(&self, message: &str);
    fn hide_error(&self);
    fn render_form(&self, form: &FormView);
}

/// Blocking yes/no question put to the user.
pub trait ConfirmPrompt: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

pub struct AlwaysConfirm;

impl ConfirmPrompt for AlwaysConfirm {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CardAction {
    Edit {
        id: ProductId,
        name: String,
        price: f64,
    },
    Delete {
        id: ProductId,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductCard {
    pub id: ProductId,
    pub title: String,
    pub price_label: String,
    pub edit: CardAction,
    pub delete: CardAction,
}

impl ProductCard {
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            title: product.name.clone(),
            price_label: price_label(product.price),
            edit: CardAction::Edit {
                id: product.id.clone(),
                name: product.name.clone(),
                price: product.price,
            },
            delete: CardAction::Delete {
                id: product.id.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogView {
    Empty { placeholder: &'static str },
    Cards(Vec<ProductCard>),
}

impl CatalogView {
    pub fn from_products(products: &[Product]) -> Self {
        if products.is_empty() {
            return Self::Empty {
                placeholder: EMPTY_CATALOG_PLACEHOLDER,
            };
        }
        Self::Cards(products.iter().map(ProductCard::from_product).collect())
    }

    pub fn cards(&self) -> &[ProductCard] {
        match self {
            Self::Empty { .. } => &[],
            Self::Cards(cards) => cards,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub name: String,
    pub price: String,
    pub submit_label: &'static str,
    pub cancel_visible: bool,
}

pub fn price_label(price: f64) -> String {
    format!("${price}")
}

pub fn count_label(count: usize) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("Total: {count} product{suffix}")
}
