//! Shopping cart, checkout and wishlist.

use rolapet_common::{AppError, AppResult, IdGenerator, SharedClock};
use rolapet_db::entities::{CartItem, Purchase, WishlistEntry};
use rolapet_db::repositories::{CartRepository, ProductRepository, WishlistRepository};
use serde::Serialize;
use tracing::{info, warn};

use super::rating::RatingService;

/// Result of a cart change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "change", rename_all = "camelCase")]
pub enum CartUpdate {
    /// A new line was added.
    Added { item: CartItem },
    /// The quantity of an existing line changed.
    Updated { item: CartItem },
    /// The line was removed.
    Removed { item_id: String },
}

impl CartUpdate {
    /// Caller-facing message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Added { .. } => "Product added to cart",
            Self::Updated { .. } => "Cart updated",
            Self::Removed { .. } => "Product removed from cart",
        }
    }
}

/// Cart subtotal and number of units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotal {
    pub subtotal: f64,
    pub item_count: u32,
}

/// Cart service.
#[derive(Clone)]
pub struct CartService {
    cart_repo: CartRepository,
    wishlist_repo: WishlistRepository,
    product_repo: ProductRepository,
    ratings: RatingService,
    clock: SharedClock,
    id_gen: IdGenerator,
}

impl CartService {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(
        cart_repo: CartRepository,
        wishlist_repo: WishlistRepository,
        product_repo: ProductRepository,
        ratings: RatingService,
        clock: SharedClock,
    ) -> Self {
        Self {
            cart_repo,
            wishlist_repo,
            product_repo,
            ratings,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add units of a product, merging into an existing line.
    pub async fn add_to_cart(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> AppResult<CartUpdate> {
        if quantity == 0 {
            return Err(AppError::Validation(
                "Quantity must be greater than zero".to_string(),
            ));
        }
        let product = self.product_repo.get_by_id(product_id).await?;
        if !product.is_available {
            return Err(AppError::Validation("Product is not available".to_string()));
        }

        let new_id = self.id_gen.generate();
        let now = self.clock.now();

        let update = self
            .cart_repo
            .mutate(move |rows| {
                if let Some(line) =
                    rows.find_mut(|i| i.user_id == user_id && i.product.id == product.id)
                {
                    let total = line.quantity.saturating_add(quantity);
                    if !product.has_stock_for(total) {
                        return Err(AppError::Validation("Not enough stock".to_string()));
                    }
                    line.quantity = total;
                    line.product = product;
                    return Ok(CartUpdate::Updated { item: line.clone() });
                }

                if !product.has_stock_for(quantity) {
                    return Err(AppError::Validation("Not enough stock".to_string()));
                }
                let item = CartItem {
                    id: new_id,
                    user_id: user_id.to_string(),
                    product,
                    quantity,
                    added_at: now,
                };
                rows.push(item.clone())?;
                Ok(CartUpdate::Added { item })
            })
            .await?;

        info!(user_id = %user_id, product_id = %product_id, quantity, "Cart changed");
        Ok(update)
    }

    /// Set the quantity of a line. Zero or less removes it.
    pub async fn update_cart_quantity(
        &self,
        user_id: &str,
        item_id: &str,
        quantity: i64,
    ) -> AppResult<CartUpdate> {
        if quantity <= 0 {
            self.cart_repo.remove(item_id, user_id).await?;
            return Ok(CartUpdate::Removed {
                item_id: item_id.to_string(),
            });
        }
        let quantity = u32::try_from(quantity)
            .map_err(|_| AppError::Validation("Quantity is too large".to_string()))?;

        self.cart_repo
            .mutate(|rows| {
                let line = rows
                    .find_mut(|i| i.id == item_id && i.user_id == user_id)
                    .ok_or_else(|| AppError::NotFound(format!("Cart item {item_id}")))?;
                if !line.product.has_stock_for(quantity) {
                    return Err(AppError::Validation("Not enough stock".to_string()));
                }
                line.quantity = quantity;
                Ok(CartUpdate::Updated { item: line.clone() })
            })
            .await
    }

    /// Remove one line from the cart.
    pub async fn remove_from_cart(&self, user_id: &str, item_id: &str) -> AppResult<CartUpdate> {
        self.cart_repo.remove(item_id, user_id).await?;
        Ok(CartUpdate::Removed {
            item_id: item_id.to_string(),
        })
    }

    /// Lines in a user's cart.
    pub async fn cart(&self, user_id: &str) -> AppResult<Vec<CartItem>> {
        self.cart_repo.find_by_user(user_id).await
    }

    /// Empty a user's cart. Returns the removed lines.
    pub async fn clear_cart(&self, user_id: &str) -> AppResult<Vec<CartItem>> {
        self.cart_repo.take_user_cart(user_id).await
    }

    /// Subtotal and unit count of a user's cart.
    pub async fn cart_total(&self, user_id: &str) -> AppResult<CartTotal> {
        let items = self.cart(user_id).await?;
        Ok(CartTotal {
            subtotal: items.iter().map(CartItem::line_total).sum(),
            item_count: items.iter().map(|i| i.quantity).sum(),
        })
    }

    /// Buy everything in the cart. One purchase is recorded per line.
    ///
    /// The cart is emptied first so lines added meanwhile stay for the next
    /// checkout. If a purchase cannot be recorded, the lines not yet paid
    /// for go back into the cart and the error is returned.
    pub async fn checkout(&self, user_id: &str) -> AppResult<Vec<Purchase>> {
        let items = self.cart_repo.take_user_cart(user_id).await?;
        if items.is_empty() {
            return Err(AppError::Validation("Cart is empty".to_string()));
        }

        let mut purchases = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match self
                .ratings
                .register_purchase(user_id, &item.product.id, &item.product.provider_id)
                .await
            {
                Ok(purchase) => purchases.push(purchase),
                Err(e) => {
                    let unpaid = items[index..].to_vec();
                    warn!(
                        user_id = %user_id,
                        purchased = index,
                        restored = unpaid.len(),
                        error = %e,
                        "Checkout interrupted"
                    );
                    self.cart_repo.restore(unpaid).await?;
                    return Err(e);
                }
            }
        }

        info!(user_id = %user_id, lines = purchases.len(), "Checkout completed");
        Ok(purchases)
    }

    /// Save a product for later.
    pub async fn add_to_wishlist(
        &self,
        user_id: &str,
        product_id: &str,
    ) -> AppResult<WishlistEntry> {
        self.product_repo.get_by_id(product_id).await?;
        self.wishlist_repo
            .add(WishlistEntry {
                id: self.id_gen.generate(),
                user_id: user_id.to_string(),
                product_id: product_id.to_string(),
                added_at: self.clock.now(),
            })
            .await
    }

    /// Drop a product from the wishlist.
    pub async fn remove_from_wishlist(&self, user_id: &str, product_id: &str) -> AppResult<()> {
        self.wishlist_repo.remove(user_id, product_id).await
    }

    /// Product IDs on a user's wishlist.
    pub async fn wishlist(&self, user_id: &str) -> AppResult<Vec<String>> {
        let entries = self.wishlist_repo.find_by_user(user_id).await?;
        Ok(entries.into_iter().map(|e| e.product_id).collect())
    }

    /// Whether the product is on the user's wishlist.
    pub async fn is_in_wishlist(&self, user_id: &str, product_id: &str) -> AppResult<bool> {
        let entries = self.wishlist_repo.find_by_user(user_id).await?;
        Ok(entries.iter().any(|e| e.product_id == product_id))
    }
}
