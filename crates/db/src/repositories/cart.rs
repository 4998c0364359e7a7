//! Cart and wishlist repositories.

use rolapet_common::{AppError, AppResult};

use crate::collections;
use crate::entities::{CartItem, WishlistEntry};
use crate::store::{Rows, Store, Table};

/// Cart lines of every user.
#[derive(Clone)]
pub struct CartRepository {
    table: Table<CartItem>,
}

impl CartRepository {
    /// Create a new cart repository.
    #[must_use]
    pub fn new(store: &Store) -> Self {
        Self {
            table: store.table(collections::CART),
        }
    }

    /// Lines in a user's cart, oldest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<CartItem>> {
        self.table.filter(|item| item.user_id == user_id).await
    }

    /// Run `f` over all cart lines as one locked cycle.
    pub async fn mutate<R, F>(&self, f: F) -> AppResult<R>
    where
        F: FnOnce(&mut Rows<CartItem>) -> AppResult<R>,
    {
        self.table.mutate(f).await
    }

    /// Remove one line owned by `user_id`. Fails with `NotFound` otherwise.
    pub async fn remove(&self, item_id: &str, user_id: &str) -> AppResult<()> {
        self.table
            .mutate(|rows| {
                let removed = rows.retain(|item| !(item.id == item_id && item.user_id == user_id));
                if removed == 0 {
                    return Err(AppError::NotFound(format!("Cart item {item_id}")));
                }
                Ok(())
            })
            .await
    }

    /// Remove every line of a user's cart, returning the removed lines.
    pub async fn take_user_cart(&self, user_id: &str) -> AppResult<Vec<CartItem>> {
        self.table
            .mutate(|rows| {
                let taken: Vec<CartItem> = rows
                    .iter()
                    .filter(|item| item.user_id == user_id)
                    .cloned()
                    .collect();
                rows.retain(|item| item.user_id != user_id);
                Ok(taken)
            })
            .await
    }

    /// Put lines back into their owners' carts. A line for a product the
    /// user has added again in the meantime is merged into that line.
    pub async fn restore(&self, items: Vec<CartItem>) -> AppResult<()> {
        self.table
            .mutate(move |rows| {
                for item in items {
                    if let Some(line) = rows.find_mut(|i| {
                        i.user_id == item.user_id && i.product.id == item.product.id
                    }) {
                        line.quantity = line.quantity.saturating_add(item.quantity);
                    } else {
                        rows.push(item)?;
                    }
                }
                Ok(())
            })
            .await
    }
}

/// Wishlist entries of every user.
#[derive(Clone)]
pub struct WishlistRepository {
    table: Table<WishlistEntry>,
}

impl WishlistRepository {
    /// Create a new wishlist repository.
    #[must_use]
    pub fn new(store: &Store) -> Self {
        Self {
            table: store.table(collections::WISHLIST),
        }
    }

    /// Entries of one user, oldest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<WishlistEntry>> {
        self.table.filter(|e| e.user_id == user_id).await
    }

    /// Add an entry unless the user already saved that product.
    pub async fn add(&self, entry: WishlistEntry) -> AppResult<WishlistEntry> {
        self.table
            .mutate(move |rows| {
                let taken = rows
                    .find(|e| e.user_id == entry.user_id && e.product_id == entry.product_id)
                    .is_some();
                if taken {
                    return Err(AppError::Duplicate(format!(
                        "product {} already in wishlist",
                        entry.product_id
                    )));
                }
                rows.push(entry.clone())?;
                Ok(entry)
            })
            .await
    }

    /// Remove a product from a user's wishlist. Fails with `NotFound` if absent.
    pub async fn remove(&self, user_id: &str, product_id: &str) -> AppResult<()> {
        self.table
            .mutate(|rows| {
                let removed =
                    rows.retain(|e| !(e.user_id == user_id && e.product_id == product_id));
                if removed == 0 {
                    return Err(AppError::NotFound(format!(
                        "Product {product_id} in wishlist"
                    )));
                }
                Ok(())
            })
            .await
    }
}
