//! # Repository Module
//!
//! Database repository implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  promo-sync (PromotionStore trait)                                     │
//! │       │                                                                 │
//! │       │  db.promotions().activate_exclusive(id)                         │
//! │       ▼                                                                 │
//! │  PromotionRepository                                                   │
//! │  ├── fetch_active / list_all / get_by_id                               │
//! │  ├── insert / update_with_version / write                              │
//! │  ├── activate_exclusive / deactivate_all                               │
//! │  └── delete                                                            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod promotion;
