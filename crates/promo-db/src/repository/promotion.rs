//! # Promotion Repository
//!
//! All reads and writes of the `promotions` table.
//!
//! ## Activation Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  activate_exclusive(B)                                                  │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    UPDATE ... SET is_active = 0 WHERE is_active = 1 AND id != B        │
//! │    UPDATE ... SET is_active = 1 WHERE id = B                           │
//! │      └── 0 rows? → ROLLBACK, NotFound (A stays active)                 │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Readers (WAL) see either {A} or {B} active. Never both, never none.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The deactivation runs first because SQLite checks the single-active
//! unique index row by row, not at commit.

use chrono::Utc;
use promo_core::Promotion;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

const SELECT_COLUMNS: &str =
    "SELECT id, name, kind, is_active, created_at, updated_at, version FROM promotions";

/// Repository for promotion records.
#[derive(Debug, Clone)]
pub struct PromotionRepository {
    pool: SqlitePool,
}

impl PromotionRepository {
    /// Creates a new PromotionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PromotionRepository { pool }
    }

    /// Returns the currently active promotion, if any.
    pub async fn fetch_active(&self) -> DbResult<Option<Promotion>> {
        let sql = format!("{} WHERE is_active = 1 LIMIT 1", SELECT_COLUMNS);

        let promotion = sqlx::query_as::<_, Promotion>(&sql)
            .fetch_optional(&self.pool)
            .await?;

        Ok(promotion)
    }

    /// Lists every promotion, oldest first.
    pub async fn list_all(&self) -> DbResult<Vec<Promotion>> {
        let sql = format!("{} ORDER BY created_at ASC, id ASC", SELECT_COLUMNS);

        let promotions = sqlx::query_as::<_, Promotion>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(promotions)
    }

    /// Gets a promotion by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Promotion>> {
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);

        let promotion = sqlx::query_as::<_, Promotion>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(promotion)
    }

    /// Inserts a new promotion exactly as given.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Duplicate id, or the record is
    ///   active while another one already is
    pub async fn insert(&self, promotion: &Promotion) -> DbResult<Promotion> {
        debug!(id = %promotion.id, name = %promotion.name, "Inserting promotion");

        sqlx::query(
            r#"
            INSERT INTO promotions (id, name, kind, is_active, created_at, updated_at, version)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&promotion.id)
        .bind(&promotion.name)
        .bind(promotion.kind.as_str())
        .bind(promotion.is_active)
        .bind(promotion.created_at)
        .bind(promotion.updated_at)
        .bind(promotion.version)
        .execute(&self.pool)
        .await?;

        Ok(promotion.clone())
    }

    /// Updates name and kind if the stored version still equals
    /// `promotion.version`.
    ///
    /// `is_active` is left untouched; activation goes through
    /// [`activate_exclusive`](Self::activate_exclusive).
    ///
    /// ## Returns
    /// * `Ok(Promotion)` - The stored record with its new version
    /// * `Err(DbError::VersionConflict)` - Someone wrote first
    /// * `Err(DbError::NotFound)` - No such promotion
    pub async fn update_with_version(&self, promotion: &Promotion) -> DbResult<Promotion> {
        debug!(id = %promotion.id, version = promotion.version, "Updating promotion");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE promotions SET
                name = ?2,
                kind = ?3,
                updated_at = ?4,
                version = version + 1
            WHERE id = ?1 AND version = ?5
            "#,
        )
        .bind(&promotion.id)
        .bind(&promotion.name)
        .bind(promotion.kind.as_str())
        .bind(Utc::now())
        .bind(promotion.version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM promotions WHERE id = ?1")
                .bind(&promotion.id)
                .fetch_optional(&mut *tx)
                .await?;

            return Err(match actual {
                Some(actual) => DbError::VersionConflict {
                    id: promotion.id.clone(),
                    expected: promotion.version,
                    actual,
                },
                None => DbError::not_found("Promotion", &promotion.id),
            });
        }

        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let stored = sqlx::query_as::<_, Promotion>(&sql)
            .bind(&promotion.id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(stored)
    }

    /// Inserts the promotion if its id is new, otherwise performs a
    /// compare-and-swap update on `version`.
    pub async fn write(&self, promotion: &Promotion) -> DbResult<Promotion> {
        match self.get_by_id(&promotion.id).await? {
            None => self.insert(promotion).await,
            Some(_) => self.update_with_version(promotion).await,
        }
    }

    /// Makes `id` the only active promotion, in one transaction.
    ///
    /// ## Returns
    /// * `Ok(Promotion)` - The activated record
    /// * `Err(DbError::NotFound)` - Unknown id; nothing was changed
    pub async fn activate_exclusive(&self, id: &str) -> DbResult<Promotion> {
        debug!(id = %id, "Activating promotion");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let deactivated = sqlx::query(
            r#"
            UPDATE promotions SET
                is_active = 0,
                updated_at = ?2,
                version = version + 1
            WHERE is_active = 1 AND id != ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let activated = sqlx::query(
            r#"
            UPDATE promotions SET
                is_active = 1,
                updated_at = ?2,
                version = version + 1
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if activated.rows_affected() == 0 {
            // Dropping the transaction rolls back the deactivation.
            return Err(DbError::not_found("Promotion", id));
        }

        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let promotion = sqlx::query_as::<_, Promotion>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            id = %id,
            deactivated = deactivated.rows_affected(),
            "Promotion activated"
        );

        Ok(promotion)
    }

    /// Deactivates every active promotion. Returns the number of rows changed.
    pub async fn deactivate_all(&self) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE promotions SET
                is_active = 0,
                updated_at = ?1,
                version = version + 1
            WHERE is_active = 1
            "#,
        )
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Deletes a promotion.
    ///
    /// ## Returns
    /// * `Ok(true)` - The deleted row was the active promotion
    /// * `Ok(false)` - The deleted row was inactive
    /// * `Err(DbError::NotFound)` - No such promotion
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting promotion");

        let was_active: Option<bool> =
            sqlx::query_scalar("DELETE FROM promotions WHERE id = ?1 RETURNING is_active")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        was_active.ok_or_else(|| DbError::not_found("Promotion", id))
    }

    /// Number of promotions with `is_active = 1`. Diagnostics only.
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM promotions WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use promo_core::PromotionKind;

    async fn repo() -> PromotionRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().promotions()
    }

    /// A well-formed id that is never stored.
    fn unknown_id() -> String {
        Promotion::new("Ghost", PromotionKind::BuyThreePayTwo).id
    }

    async fn seeded(repo: &PromotionRepository, name: &str) -> Promotion {
        repo.insert(&Promotion::new(name, PromotionKind::BuyThreePayTwo))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = repo().await;
        let promo = seeded(&repo, "Weekend").await;

        let loaded = repo.get_by_id(&promo.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Weekend");
        assert_eq!(loaded.kind, PromotionKind::BuyThreePayTwo);
        assert!(!loaded.is_active);
        assert_eq!(loaded.version, 0);

        assert!(repo.get_by_id(&unknown_id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let repo = repo().await;
        let promo = seeded(&repo, "Weekend").await;

        let err = repo.insert(&promo).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_activate_exclusive_switches_active() {
        let repo = repo().await;
        let a = seeded(&repo, "A").await;
        let b = seeded(&repo, "B").await;

        repo.activate_exclusive(&a.id).await.unwrap();
        assert_eq!(repo.fetch_active().await.unwrap().unwrap().id, a.id);

        let activated = repo.activate_exclusive(&b.id).await.unwrap();
        assert!(activated.is_active);
        assert_eq!(activated.id, b.id);

        assert_eq!(repo.count_active().await.unwrap(), 1);
        assert_eq!(repo.fetch_active().await.unwrap().unwrap().id, b.id);

        let a_after = repo.get_by_id(&a.id).await.unwrap().unwrap();
        assert!(!a_after.is_active);
        assert_eq!(a_after.version, 2);
    }

    #[tokio::test]
    async fn test_activate_unknown_id_changes_nothing() {
        let repo = repo().await;
        let a = seeded(&repo, "A").await;
        repo.activate_exclusive(&a.id).await.unwrap();

        let err = repo.activate_exclusive(&unknown_id()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let still_active = repo.fetch_active().await.unwrap().unwrap();
        assert_eq!(still_active.id, a.id);
        assert_eq!(still_active.version, 1);
    }

    #[tokio::test]
    async fn test_activate_already_active_is_harmless() {
        let repo = repo().await;
        let a = seeded(&repo, "A").await;

        repo.activate_exclusive(&a.id).await.unwrap();
        repo.activate_exclusive(&a.id).await.unwrap();

        assert_eq!(repo.count_active().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_single_active_index_rejects_second_active_row() {
        let repo = repo().await;
        let a = seeded(&repo, "A").await;
        repo.activate_exclusive(&a.id).await.unwrap();

        let mut rogue = Promotion::new("Rogue", PromotionKind::BuyThreePayTwo);
        rogue.is_active = true;

        let err = repo.insert(&rogue).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(repo.count_active().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_deactivate_all() {
        let repo = repo().await;
        let a = seeded(&repo, "A").await;

        assert_eq!(repo.deactivate_all().await.unwrap(), 0);

        repo.activate_exclusive(&a.id).await.unwrap();
        assert_eq!(repo.deactivate_all().await.unwrap(), 1);
        assert!(repo.fetch_active().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_with_version_compare_and_swap() {
        let repo = repo().await;
        let original = seeded(&repo, "Old name").await;

        let mut edit = original.clone();
        edit.name = "New name".to_string();
        let stored = repo.update_with_version(&edit).await.unwrap();
        assert_eq!(stored.name, "New name");
        assert_eq!(stored.version, 1);

        // Stale copy still carries version 0.
        let mut stale = original.clone();
        stale.name = "Lost update".to_string();
        match repo.update_with_version(&stale).await.unwrap_err() {
            DbError::VersionConflict { expected, actual, .. } => {
                assert_eq!(expected, 0);
                assert_eq!(actual, 1);
            }
            other => panic!("expected VersionConflict, got {:?}", other),
        }

        let loaded = repo.get_by_id(&original.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "New name");
    }

    #[tokio::test]
    async fn test_update_does_not_touch_is_active() {
        let repo = repo().await;
        let a = seeded(&repo, "A").await;
        let active = repo.activate_exclusive(&a.id).await.unwrap();

        let mut edit = active.clone();
        edit.is_active = false;
        edit.name = "Renamed".to_string();
        let stored = repo.update_with_version(&edit).await.unwrap();

        assert!(stored.is_active);
    }

    #[tokio::test]
    async fn test_write_inserts_then_updates() {
        let repo = repo().await;
        let promo = Promotion::new("Fresh", PromotionKind::BuyThreePayTwo);

        let inserted = repo.write(&promo).await.unwrap();
        assert_eq!(inserted.version, 0);

        let mut edit = inserted.clone();
        edit.name = "Fresh v2".to_string();
        let updated = repo.write(&edit).await.unwrap();
        assert_eq!(updated.version, 1);
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let repo = repo().await;
        let ghost = Promotion::new("Ghost", PromotionKind::BuyThreePayTwo);

        let err = repo.update_with_version(&ghost).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repo().await;
        let a = seeded(&repo, "A").await;

        assert!(!repo.delete(&a.id).await.unwrap());
        assert!(repo.get_by_id(&a.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&a.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_delete_reports_active_row() {
        let repo = repo().await;
        let a = seeded(&repo, "A").await;
        repo.activate_exclusive(&a.id).await.unwrap();

        assert!(repo.delete(&a.id).await.unwrap());
        assert_eq!(repo.count_active().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_all_returns_every_record() {
        let repo = repo().await;
        for name in ["One", "Two", "Three"] {
            seeded(&repo, name).await;
        }

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 3);
    }
}
