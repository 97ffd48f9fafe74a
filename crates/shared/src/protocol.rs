use serde::{Deserialize, Serialize};

use crate::domain::{Product, ProductId};

/// Editable fields of a product, as sent in an update body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub price: f64,
}

impl ProductInput {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }

    pub fn with_id(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            price: self.price,
        }
    }
}

impl From<Product> for ProductInput {
    fn from(value: Product) -> Self {
        Self {
            name: value.name,
            price: value.price,
        }
    }
}

/// On-disk layout of a json-server style database file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub productos: Vec<Product>,
}
