//! # Cart State
//!
//! Holds the shopper's cart and persists a snapshot after every change.
//!
//! ## Thread Safety
//! The cart is wrapped in `Arc<Mutex<T>>`: several commands may touch it, and
//! only one may change it at a time. The lock is never held across an
//! `.await`; the snapshot is cloned under the lock and written afterwards.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  mutate(|cart| cart.add_product(..))                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lock ──► run closure on a working copy                                 │
//! │              │                                                          │
//! │      Err ◄───┤                  (cart untouched)                       │
//! │              ▼                                                          │
//! │           Ok: swap copy in, clone snapshot ──► unlock                   │
//! │                                                  │                      │
//! │                                                  ▼                      │
//! │                                   storage.save(snapshot).await          │
//! │                                                  │                      │
//! │                        save failed ◄─────────────┤                      │
//! │                             │                    ▼                      │
//! │                  restore previous cart          Ok                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tekhnika_core::{Cart, CoreResult};
use tekhnika_db::{Database, DbError, DbResult};
use tracing::{debug, warn};

use crate::error::ApiError;

/// Where cart snapshots live between runs.
#[async_trait]
pub trait CartStorage: Send + Sync {
    /// Loads the last snapshot, if any.
    async fn load(&self) -> DbResult<Option<Cart>>;

    /// Replaces the stored snapshot.
    async fn save(&self, cart: &Cart) -> DbResult<()>;
}

/// Cart snapshots as JSON in the database key-value table.
#[derive(Debug, Clone)]
pub struct KvCartStorage {
    db: Database,
    key: String,
}

impl KvCartStorage {
    pub fn new(db: Database, key: impl Into<String>) -> Self {
        KvCartStorage {
            db,
            key: key.into(),
        }
    }
}

#[async_trait]
impl CartStorage for KvCartStorage {
    async fn load(&self) -> DbResult<Option<Cart>> {
        self.db.kv().get_json(&self.key).await
    }

    async fn save(&self, cart: &Cart) -> DbResult<()> {
        self.db.kv().put_json(&self.key, cart).await
    }
}

/// Process-local storage, for tests and one-off runs.
#[derive(Debug, Default)]
pub struct MemoryCartStorage {
    saved: Mutex<Option<Cart>>,
}

impl MemoryCartStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last saved snapshot.
    pub fn snapshot(&self) -> Option<Cart> {
        lock(&self.saved).clone()
    }
}

#[async_trait]
impl CartStorage for MemoryCartStorage {
    async fn load(&self) -> DbResult<Option<Cart>> {
        Ok(lock(&self.saved).clone())
    }

    async fn save(&self, cart: &Cart) -> DbResult<()> {
        *lock(&self.saved) = Some(cart.clone());
        Ok(())
    }
}

/// Locks, recovering the guard from a poisoned mutex.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The shopper's cart.
#[derive(Clone)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
    storage: Arc<dyn CartStorage>,
}

impl std::fmt::Debug for CartState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartState")
            .field("cart", &self.cart)
            .finish_non_exhaustive()
    }
}

impl CartState {
    /// Restores the cart from `storage`.
    ///
    /// A snapshot that no longer parses is dropped with a warning and the
    /// shopper starts with an empty cart.
    pub async fn load(storage: Arc<dyn CartStorage>) -> Result<Self, ApiError> {
        let cart = match storage.load().await {
            Ok(Some(cart)) => {
                debug!(lines = cart.item_count(), "Restored cart");
                cart
            }
            Ok(None) => Cart::new(),
            Err(DbError::Corrupt { message, .. }) => {
                warn!(error = %message, "Discarding unreadable cart snapshot");
                Cart::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(CartState {
            cart: Arc::new(Mutex::new(cart)),
            storage,
        })
    }

    /// Executes a function with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = lock(&self.cart);
        f(&cart)
    }

    /// Applies `f` to the cart and persists the result.
    ///
    /// When `f` fails the cart is left exactly as it was and nothing is
    /// written. When the save fails the previous cart is restored, unless
    /// another command changed the cart in the meantime.
    pub async fn mutate<F, R>(&self, f: F) -> Result<R, ApiError>
    where
        F: FnOnce(&mut Cart) -> CoreResult<R>,
    {
        let (result, previous, snapshot) = {
            let mut cart = lock(&self.cart);
            let mut working = cart.clone();
            let result = f(&mut working)?;
            let previous = std::mem::replace(&mut *cart, working);
            (result, previous, cart.clone())
        };

        if let Err(e) = self.storage.save(&snapshot).await {
            warn!(error = %e, "Cart snapshot not saved, reverting");
            let mut cart = lock(&self.cart);
            if *cart == snapshot {
                *cart = previous;
            }
            return Err(e.into());
        }

        Ok(result)
    }

    /// Like [`mutate`](Self::mutate) for closures that cannot fail.
    pub async fn update<F, R>(&self, f: F) -> Result<R, ApiError>
    where
        F: FnOnce(&mut Cart) -> R,
    {
        self.mutate(|cart| Ok(f(cart))).await
    }

    /// Returns a copy of the current cart.
    pub fn snapshot(&self) -> Cart {
        self.with_cart(Cart::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tekhnika_core::{CoreError, Money, Product};
    use tekhnika_db::DbConfig;

    fn kettle() -> Product {
        Product::new("kettle", "Чайник", Money::from_rubles(2_000)).with_stock(2)
    }

    #[tokio::test]
    async fn test_mutation_is_persisted() {
        let storage = Arc::new(MemoryCartStorage::new());
        let state = CartState::load(storage.clone()).await.unwrap();

        state
            .mutate(|cart| cart.add_product(&kettle(), 1, Utc::now()).map(|_| ()))
            .await
            .unwrap();

        let saved = storage.snapshot().unwrap();
        assert_eq!(saved.total_quantity(), 1);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_cart_untouched() {
        let storage = Arc::new(MemoryCartStorage::new());
        let state = CartState::load(storage.clone()).await.unwrap();

        let err = state
            .mutate(|cart| cart.add_product(&kettle(), 3, Utc::now()).map(|_| ()))
            .await
            .unwrap_err();

        assert_eq!(err.code, crate::error::ErrorCode::InsufficientStock);
        assert!(state.with_cart(|c| c.is_empty()));
        assert!(storage.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_partial_failure_rolls_back_working_copy() {
        let storage = Arc::new(MemoryCartStorage::new());
        let state = CartState::load(storage).await.unwrap();

        let result: Result<(), ApiError> = state
            .mutate(|cart| {
                cart.add_product(&kettle(), 1, Utc::now())?;
                Err(CoreError::EmptyCart)
            })
            .await;

        assert!(result.is_err());
        assert!(state.with_cart(|c| c.is_empty()));
    }

    struct FailingStorage;

    #[async_trait]
    impl CartStorage for FailingStorage {
        async fn load(&self) -> DbResult<Option<Cart>> {
            Ok(None)
        }

        async fn save(&self, _cart: &Cart) -> DbResult<()> {
            Err(DbError::QueryFailed("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failed_save_restores_previous_cart() {
        let state = CartState::load(Arc::new(FailingStorage)).await.unwrap();

        let err = state
            .mutate(|cart| cart.add_product(&kettle(), 1, Utc::now()).map(|_| ()))
            .await
            .unwrap_err();

        assert_eq!(err.code, crate::error::ErrorCode::DatabaseError);
        assert!(state.with_cart(|c| c.is_empty()));
    }

    #[tokio::test]
    async fn test_kv_storage_survives_reload() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let storage = Arc::new(KvCartStorage::new(db.clone(), "cart"));

        let state = CartState::load(storage.clone()).await.unwrap();
        state
            .mutate(|cart| cart.add_product(&kettle(), 2, Utc::now()).map(|_| ()))
            .await
            .unwrap();

        let reloaded = CartState::load(storage).await.unwrap();
        assert_eq!(reloaded.with_cart(|c| c.total_quantity()), 2);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_starts_empty() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.kv().put("cart", "[[[").await.unwrap();

        let state = CartState::load(Arc::new(KvCartStorage::new(db, "cart")))
            .await
            .unwrap();
        assert!(state.with_cart(|c| c.is_empty()));
    }
}
