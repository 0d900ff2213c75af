use crate::error::{SyncError, SyncResult};
use crate::store::PromotionStore;
use async_trait::async_trait;
use chrono::Utc;
use promo_core::Promotion;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// In-memory store with switchable failure and latency.
pub struct FakeStore {
    pub records: Mutex<Vec<Promotion>>,
    pub fetch_calls: AtomicU64,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub read_delay: Mutex<Duration>,
}

impl Default for FakeStore {
    fn default() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fetch_calls: AtomicU64::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            read_delay: Mutex::new(Duration::ZERO),
        }
    }
}

impl FakeStore {
    pub fn with(records: Vec<Promotion>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    fn check_writes(&self) -> SyncResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SyncError::StoreUnavailable("fake write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PromotionStore for FakeStore {
    async fn fetch_active(&self) -> SyncResult<Option<Promotion>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.read_delay.lock().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SyncError::StoreUnavailable("fake read failure".to_string()));
        }
        Ok(self.records.lock().await.iter().find(|p| p.is_active).cloned())
    }

    async fn list_all(&self) -> SyncResult<Vec<Promotion>> {
        Ok(self.records.lock().await.clone())
    }

    async fn get(&self, id: &str) -> SyncResult<Option<Promotion>> {
        Ok(self.records.lock().await.iter().find(|p| p.id == id).cloned())
    }

    async fn write(&self, promotion: &Promotion) -> SyncResult<Promotion> {
        self.check_writes()?;
        let mut records = self.records.lock().await;
        match records.iter_mut().find(|p| p.id == promotion.id) {
            None => {
                records.push(promotion.clone());
                Ok(promotion.clone())
            }
            Some(existing) if existing.version != promotion.version => Err(SyncError::VersionConflict {
                id: promotion.id.clone(),
                expected: promotion.version,
                actual: existing.version,
            }),
            Some(existing) => {
                existing.name = promotion.name.clone();
                existing.kind = promotion.kind;
                existing.updated_at = Utc::now();
                existing.version += 1;
                Ok(existing.clone())
            }
        }
    }

    async fn activate_exclusive(&self, id: &str) -> SyncResult<Promotion> {
        self.check_writes()?;
        let mut records = self.records.lock().await;
        if !records.iter().any(|p| p.id == id) {
            return Err(SyncError::PromotionNotFound(id.to_string()));
        }
        let now = Utc::now();
        for p in records.iter_mut() {
            let target = p.id == id;
            if p.is_active != target || target {
                p.is_active = target;
                p.updated_at = now;
                p.version += 1;
            }
        }
        records
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| SyncError::PromotionNotFound(id.to_string()))
    }

    async fn deactivate_all(&self) -> SyncResult<u64> {
        self.check_writes()?;
        let now = Utc::now();
        let mut changed = 0;
        for p in self.records.lock().await.iter_mut().filter(|p| p.is_active) {
            p.is_active = false;
            p.updated_at = now;
            p.version += 1;
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete(&self, id: &str) -> SyncResult<bool> {
        self.check_writes()?;
        let mut records = self.records.lock().await;
        let position = records
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| SyncError::PromotionNotFound(id.to_string()))?;
        Ok(records.remove(position).is_active)
    }
}

mod tests {
    use super::*;
    use promo_core::PromotionKind;

    #[tokio::test]
    async fn test_deactivate_all_stamps_updated_at() {
        let mut promo = Promotion::new("A", PromotionKind::BuyThreePayTwo);
        promo.is_active = true;
        promo.updated_at = Utc::now() - chrono::Duration::days(1);
        let before = promo.updated_at;
        let store = FakeStore::with(vec![promo]);

        assert_eq!(store.deactivate_all().await.unwrap(), 1);

        let records = store.records.lock().await;
        assert!(!records[0].is_active);
        assert_eq!(records[0].version, 1);
        assert!(records[0].updated_at > before);
    }

    #[tokio::test]
    async fn test_delete_reports_activeness() {
        let a = Promotion::new("A", PromotionKind::BuyThreePayTwo);
        let store = FakeStore::with(vec![a.clone()]);
        store.activate_exclusive(&a.id).await.unwrap();

        assert!(store.delete(&a.id).await.unwrap());
        assert!(matches!(
            store.delete(&a.id).await,
            Err(SyncError::PromotionNotFound(_))
        ));
    }
}
