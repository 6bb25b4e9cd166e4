// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Studio Ledger Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Product catalog.
//!
//! Catalog items are reference data: the engine reads them only at job
//! creation or edit time to snapshot code, name, price, and default
//! description onto the job. Changing a catalog item later never touches
//! existing jobs.

use crate::error::JobError;
use crate::job::{amount_field, str_field};
use crate::store::{Document, Storage};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Collection holding catalog items, keyed by upper-cased code.
pub const PRODUCTS: &str = "products";

/// A priced service or product definition, e.g. `P01 / Passport 4x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique, case-insensitive.
    pub code: String,
    pub name: String,
    pub price: Decimal,
    /// Default description copied onto jobs that select this item.
    pub description: Option<String>,
}

impl Product {
    fn from_document(key: &str, doc: &Document) -> Product {
        Product {
            code: str_field(doc, &["code"]).unwrap_or_else(|| key.to_string()),
            name: str_field(doc, &["name"]).unwrap_or_default(),
            price: amount_field(doc, "price"),
            description: str_field(doc, &["description"]),
        }
    }

    fn to_document(&self) -> Document {
        json!({
            "code": self.code,
            "name": self.name,
            "price": self.price,
            "description": self.description,
        })
    }
}

/// Catalog operations over a storage backend.
pub struct Catalog<'a, S: Storage> {
    store: &'a S,
}

impl<'a, S: Storage> Catalog<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Catalog { store }
    }

    /// Adds a catalog item.
    ///
    /// # Errors
    ///
    /// [`JobError::MissingProductField`] if code or name is blank,
    /// [`JobError::NegativeAmount`] for a negative price,
    /// [`JobError::DuplicateProductCode`] if the code (case-insensitively)
    /// already exists.
    pub fn add(&self, product: Product) -> Result<Product, JobError> {
        if product.code.trim().is_empty() || product.name.trim().is_empty() {
            return Err(JobError::MissingProductField);
        }
        if product.price < Decimal::ZERO {
            return Err(JobError::NegativeAmount);
        }

        let key = storage_key(&product.code);
        if self.store.get(PRODUCTS, &key)?.is_some() {
            return Err(JobError::DuplicateProductCode);
        }

        let product = Product {
            code: product.code.trim().to_string(),
            name: product.name.trim().to_string(),
            ..product
        };
        self.store.put(PRODUCTS, &key, product.to_document())?;
        Ok(product)
    }

    /// Removes a catalog item. Existing jobs keep their snapshots.
    pub fn remove(&self, code: &str) -> Result<(), JobError> {
        let key = storage_key(code);
        if self.store.get(PRODUCTS, &key)?.is_none() {
            return Err(JobError::ProductNotFound);
        }
        self.store.delete(PRODUCTS, &key)?;
        Ok(())
    }

    /// Looks up an item by code, case-insensitively.
    pub fn find(&self, code: &str) -> Result<Option<Product>, JobError> {
        let key = storage_key(code);
        Ok(self
            .store
            .get(PRODUCTS, &key)?
            .map(|doc| Product::from_document(&key, &doc)))
    }

    /// All items, sorted by code.
    pub fn list(&self) -> Result<Vec<Product>, JobError> {
        let mut products: Vec<Product> = self
            .store
            .list(PRODUCTS)?
            .into_iter()
            .map(|(key, doc)| Product::from_document(&key, &doc))
            .collect();
        products.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(products)
    }
}

fn storage_key(code: &str) -> String {
    code.trim().to_uppercase()
}
