//! Catalog trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{FarmerId, ProductId};
use domain::Money;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

/// Price, stock and owner of a product at the time it was read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub available: u32,
    pub farmer_id: FarmerId,
}

/// A quantity of one product to take out of (or put back into) stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl StockLine {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error(
        "Insufficient stock for product {product_id}: \
         {available} available, {requested} requested"
    )]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
        requested: u32,
    },

    #[error("Catalog database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

/// Read and decrement product stock.
///
/// Decrements are atomic per call: a concurrent decrement of the same
/// product can never drive stock below zero.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn get_product(
        &self,
        product_id: ProductId,
    ) -> Result<Option<ProductSnapshot>, CatalogError>;

    async fn decrement_stock(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), CatalogError>;

    /// Decrements every line or none of them.
    ///
    /// On failure the error names the first line, in input order, that could
    /// not be satisfied.
    async fn decrement_stock_batch(&self, lines: &[StockLine]) -> Result<(), CatalogError>;

    /// Puts stock back after a checkout that could not be completed.
    async fn restock_batch(&self, lines: &[StockLine]) -> Result<(), CatalogError>;
}

/// Sums quantities per product, keeping first-seen order.
pub(crate) fn merge_lines(lines: &[StockLine]) -> Vec<StockLine> {
    let mut merged: Vec<StockLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|m| m.product_id == line.product_id) {
            Some(existing) => existing.quantity += line.quantity,
            None => merged.push(*line),
        }
    }
    merged
}

#[derive(Debug, Default)]
struct CatalogState {
    products: HashMap<ProductId, ProductSnapshot>,
    fail_on_decrement: bool,
}

/// In-memory catalog. One lock covers check-then-decrement.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product.
    pub async fn upsert_product(&self, product: ProductSnapshot) {
        self.state
            .write()
            .await
            .products
            .insert(product.product_id, product);
    }

    pub async fn available(&self, product_id: ProductId) -> Option<u32> {
        self.state
            .read()
            .await
            .products
            .get(&product_id)
            .map(|p| p.available)
    }

    /// Makes every decrement fail as if the catalog were down.
    pub async fn set_fail_on_decrement(&self, fail: bool) {
        self.state.write().await.fail_on_decrement = fail;
    }
}

fn check_line(state: &CatalogState, line: &StockLine) -> Result<(), CatalogError> {
    let product = state
        .products
        .get(&line.product_id)
        .ok_or(CatalogError::ProductNotFound(line.product_id))?;

    if product.available < line.quantity {
        return Err(CatalogError::InsufficientStock {
            product_id: line.product_id,
            available: product.available,
            requested: line.quantity,
        });
    }
    Ok(())
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn get_product(
        &self,
        product_id: ProductId,
    ) -> Result<Option<ProductSnapshot>, CatalogError> {
        Ok(self.state.read().await.products.get(&product_id).cloned())
    }

    async fn decrement_stock(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), CatalogError> {
        self.decrement_stock_batch(&[StockLine::new(product_id, quantity)])
            .await
    }

    async fn decrement_stock_batch(&self, lines: &[StockLine]) -> Result<(), CatalogError> {
        let mut state = self.state.write().await;

        if state.fail_on_decrement {
            return Err(CatalogError::Unavailable("decrement rejected".to_string()));
        }

        let merged = merge_lines(lines);
        for line in &merged {
            check_line(&state, line)?;
        }

        for line in &merged {
            if let Some(product) = state.products.get_mut(&line.product_id) {
                product.available -= line.quantity;
            }
        }

        tracing::debug!(lines = merged.len(), "stock decremented");
        Ok(())
    }

    async fn restock_batch(&self, lines: &[StockLine]) -> Result<(), CatalogError> {
        let mut state = self.state.write().await;
        for line in lines {
            if let Some(product) = state.products.get_mut(&line.product_id) {
                product.available += line.quantity;
            }
        }
        Ok(())
    }
}
