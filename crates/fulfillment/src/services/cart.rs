//! Buyer carts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{BuyerId, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Error)]
pub enum CartError {
    #[error("Quantity must be greater than zero")]
    ZeroQuantity,

    #[error("Quantity for product {product_id} would exceed {max}")]
    QuantityTooLarge { product_id: ProductId, max: u32 },

    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),

    #[error("Cart storage unavailable: {0}")]
    Unavailable(String),
}

/// Storage for per-buyer carts.
///
/// A cart exists as soon as it is read; clearing empties it but keeps it.
/// Lines stay in the order they were first added.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn get_cart(&self, buyer_id: BuyerId) -> Result<Vec<CartLine>, CartError>;

    /// Adds a product, or increases its quantity if it is already there.
    async fn add_item(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Vec<CartLine>, CartError>;

    /// Replaces the quantity of a product already in the cart.
    async fn set_quantity(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Vec<CartLine>, CartError>;

    async fn remove_item(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
    ) -> Result<Vec<CartLine>, CartError>;

    /// Takes checked-out quantities back out of the cart.
    ///
    /// Each line's quantity is subtracted from the matching cart line, which
    /// is dropped once it reaches zero. Anything added after `ordered` was
    /// read stays in the cart.
    async fn remove_ordered(
        &self,
        buyer_id: BuyerId,
        ordered: &[CartLine],
    ) -> Result<Vec<CartLine>, CartError>;

    async fn clear_cart(&self, buyer_id: BuyerId) -> Result<(), CartError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<HashMap<BuyerId, Vec<CartLine>>>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn get_cart(&self, buyer_id: BuyerId) -> Result<Vec<CartLine>, CartError> {
        Ok(self
            .carts
            .read()
            .await
            .get(&buyer_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_item(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Vec<CartLine>, CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        let mut carts = self.carts.write().await;
        let cart = carts.entry(buyer_id).or_default();
        match cart.iter_mut().find(|line| line.product_id == product_id) {
            Some(line) => {
                line.quantity = line.quantity.checked_add(quantity).ok_or(
                    CartError::QuantityTooLarge {
                        product_id,
                        max: u32::MAX,
                    },
                )?;
            }
            None => cart.push(CartLine {
                product_id,
                quantity,
            }),
        }
        Ok(cart.clone())
    }

    async fn set_quantity(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Vec<CartLine>, CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        let mut carts = self.carts.write().await;
        let cart = carts.entry(buyer_id).or_default();
        let line = cart
            .iter_mut()
            .find(|line| line.product_id == product_id)
            .ok_or(CartError::NotInCart(product_id))?;
        line.quantity = quantity;
        Ok(cart.clone())
    }

    async fn remove_item(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
    ) -> Result<Vec<CartLine>, CartError> {
        let mut carts = self.carts.write().await;
        let cart = carts.entry(buyer_id).or_default();
        let before = cart.len();
        cart.retain(|line| line.product_id != product_id);
        if cart.len() == before {
            return Err(CartError::NotInCart(product_id));
        }
        Ok(cart.clone())
    }

    async fn remove_ordered(
        &self,
        buyer_id: BuyerId,
        ordered: &[CartLine],
    ) -> Result<Vec<CartLine>, CartError> {
        let mut carts = self.carts.write().await;
        let cart = carts.entry(buyer_id).or_default();
        for taken in ordered {
            if let Some(line) = cart
                .iter_mut()
                .find(|line| line.product_id == taken.product_id)
            {
                line.quantity = line.quantity.saturating_sub(taken.quantity);
            }
        }
        cart.retain(|line| line.quantity > 0);
        Ok(cart.clone())
    }

    async fn clear_cart(&self, buyer_id: BuyerId) -> Result<(), CartError> {
        self.carts.write().await.entry(buyer_id).or_default().clear();
        Ok(())
    }
}
