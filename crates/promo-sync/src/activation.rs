//! # Activation Controller
//!
//! The admin-side entry point for changing which promotion is live.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  set_active(id)                                                         │
//! │     │                                                                   │
//! │     ├─► validate id                                                     │
//! │     ├─► store.activate_exclusive(id)   (one transaction)                │
//! │     │      ├─ Err ──► warn!, return Err (nothing changed, no event)     │
//! │     │      └─ Ok                                                        │
//! │     └─► notifier.notify()  ──►  every PromotionClient refetches         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Events are only published after the store write has committed.

use promo_core::validation::{validate_promotion_id, validate_promotion_name};
use promo_core::{Promotion, PromotionKind};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{SyncError, SyncResult};
use crate::notifier::ChangeNotifier;
use crate::store::PromotionStore;

/// Mutates the promotion set and announces every committed change.
#[derive(Clone)]
pub struct ActivationController {
    store: Arc<dyn PromotionStore>,
    notifier: ChangeNotifier,
}

impl ActivationController {
    pub fn new(store: Arc<dyn PromotionStore>, notifier: ChangeNotifier) -> Self {
        ActivationController { store, notifier }
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// Makes `promotion_id` the only active promotion.
    ///
    /// ## Returns
    /// * `Ok(Promotion)` - The now-active record
    /// * `Err(SyncError::PromotionNotFound)` - No such id; nothing changed
    /// * `Err(SyncError::Validation)` - `promotion_id` is not a UUID
    pub async fn set_active(&self, promotion_id: &str) -> SyncResult<Promotion> {
        validate_promotion_id(promotion_id)?;

        match self.store.activate_exclusive(promotion_id).await {
            Ok(promotion) => {
                let sequence = self.notifier.notify();
                info!(
                    promotion_id = %promotion.id,
                    name = %promotion.name,
                    version = promotion.version,
                    sequence,
                    "Promotion activated"
                );
                Ok(promotion)
            }
            Err(e) => {
                warn!(promotion_id = %promotion_id, error = %e, "Promotion activation failed");
                Err(e)
            }
        }
    }

    /// Switches every promotion off. Returns how many were active.
    pub async fn deactivate_all(&self) -> SyncResult<u64> {
        let changed = self.store.deactivate_all().await.map_err(|e| {
            warn!(error = %e, "Deactivating promotions failed");
            e
        })?;

        if changed > 0 {
            self.notifier.notify();
        }
        info!(changed, "Promotions deactivated");

        Ok(changed)
    }

    /// Creates a new, inactive promotion.
    pub async fn create_promotion(&self, name: &str, kind: PromotionKind) -> SyncResult<Promotion> {
        validate_promotion_name(name)?;

        let promotion = Promotion::new(name.trim(), kind);
        let saved = self.store.write(&promotion).await.map_err(|e| {
            warn!(name = %name, error = %e, "Creating promotion failed");
            e
        })?;

        info!(promotion_id = %saved.id, name = %saved.name, "Promotion created");
        Ok(saved)
    }

    /// Renames a promotion if its stored version still equals
    /// `expected_version`.
    ///
    /// ## Returns
    /// * `Err(SyncError::VersionConflict)` - Someone else wrote first
    pub async fn rename_promotion(
        &self,
        promotion_id: &str,
        name: &str,
        expected_version: i64,
    ) -> SyncResult<Promotion> {
        validate_promotion_id(promotion_id)?;
        validate_promotion_name(name)?;

        let mut promotion = self
            .store
            .get(promotion_id)
            .await?
            .ok_or_else(|| SyncError::PromotionNotFound(promotion_id.to_string()))?;

        promotion.name = name.trim().to_string();
        promotion.version = expected_version;

        let saved = self.store.write(&promotion).await.map_err(|e| {
            warn!(promotion_id = %promotion_id, error = %e, "Renaming promotion failed");
            e
        })?;

        // Viewers render the active promotion's name in the banner.
        if saved.is_active {
            self.notifier.notify();
        }
        info!(promotion_id = %saved.id, version = saved.version, "Promotion renamed");

        Ok(saved)
    }

    pub async fn delete_promotion(&self, promotion_id: &str) -> SyncResult<()> {
        validate_promotion_id(promotion_id)?;

        // Activeness is read by the delete statement itself.
        let was_active = self.store.delete(promotion_id).await.map_err(|e| {
            warn!(promotion_id = %promotion_id, error = %e, "Deleting promotion failed");
            e
        })?;

        if was_active {
            self.notifier.notify();
        }
        info!(promotion_id = %promotion_id, was_active, "Promotion deleted");

        Ok(())
    }

    pub async fn list_all(&self) -> SyncResult<Vec<Promotion>> {
        self.store.list_all().await
    }

    /// The active promotion as currently stored.
    pub async fn active(&self) -> SyncResult<Option<Promotion>> {
        self.store.fetch_active().await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
