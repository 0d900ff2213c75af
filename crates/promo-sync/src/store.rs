//! # Promotion Store Seam
//!
//! The async interface activation and viewer clients use to read and write
//! promotion records. Production uses the SQLite repository from promo-db;
//! tests substitute an in-memory store.

use async_trait::async_trait;
use promo_core::Promotion;
use promo_db::PromotionRepository;

use crate::error::SyncResult;

/// Persistent promotion records.
///
/// `activate_exclusive` must be atomic: no reader may observe zero or two
/// active promotions while it runs.
#[async_trait]
pub trait PromotionStore: Send + Sync + 'static {
    /// The single active promotion, if any.
    async fn fetch_active(&self) -> SyncResult<Option<Promotion>>;

    async fn list_all(&self) -> SyncResult<Vec<Promotion>>;

    async fn get(&self, id: &str) -> SyncResult<Option<Promotion>>;

    /// Inserts a new record, or updates an existing one if its stored
    /// version equals `promotion.version`.
    async fn write(&self, promotion: &Promotion) -> SyncResult<Promotion>;

    /// Deactivates every other promotion and activates `id`, atomically.
    async fn activate_exclusive(&self, id: &str) -> SyncResult<Promotion>;

    /// Returns how many records were switched off.
    async fn deactivate_all(&self) -> SyncResult<u64>;

    /// Returns whether the deleted record was the active one.
    async fn delete(&self, id: &str) -> SyncResult<bool>;
}

#[async_trait]
impl PromotionStore for PromotionRepository {
    async fn fetch_active(&self) -> SyncResult<Option<Promotion>> {
        Ok(PromotionRepository::fetch_active(self).await?)
    }

    async fn list_all(&self) -> SyncResult<Vec<Promotion>> {
        Ok(PromotionRepository::list_all(self).await?)
    }

    async fn get(&self, id: &str) -> SyncResult<Option<Promotion>> {
        Ok(self.get_by_id(id).await?)
    }

    async fn write(&self, promotion: &Promotion) -> SyncResult<Promotion> {
        Ok(PromotionRepository::write(self, promotion).await?)
    }

    async fn activate_exclusive(&self, id: &str) -> SyncResult<Promotion> {
        Ok(PromotionRepository::activate_exclusive(self, id).await?)
    }

    async fn deactivate_all(&self) -> SyncResult<u64> {
        Ok(PromotionRepository::deactivate_all(self).await?)
    }

    async fn delete(&self, id: &str) -> SyncResult<bool> {
        Ok(PromotionRepository::delete(self, id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use promo_core::PromotionKind;
    use promo_db::{Database, DbConfig};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_repository_through_trait_object() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store: Arc<dyn PromotionStore> = Arc::new(db.promotions());

        let promo = store
            .write(&Promotion::new("Trait", PromotionKind::BuyThreePayTwo))
            .await
            .unwrap();
        assert!(store.fetch_active().await.unwrap().is_none());

        store.activate_exclusive(&promo.id).await.unwrap();
        assert_eq!(store.fetch_active().await.unwrap().unwrap().id, promo.id);
        assert_eq!(store.deactivate_all().await.unwrap(), 1);

        assert!(!store.delete(&promo.id).await.unwrap());
        assert!(matches!(
            store.delete(&promo.id).await.unwrap_err(),
            SyncError::PromotionNotFound(_)
        ));
        assert!(store.list_all().await.unwrap().is_empty());
    }
}
