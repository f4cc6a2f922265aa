//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Methods take any [`sqlx::PgExecutor`] so callers pass `&pool` for
//! one-off reads and `&mut *tx` inside a transaction.

pub mod claim_repo;
pub mod found_item_repo;
pub mod lost_item_repo;
pub mod match_repo;
pub mod user_repo;

pub use claim_repo::ClaimRepo;
pub use found_item_repo::FoundItemRepo;
pub use lost_item_repo::LostItemRepo;
pub use match_repo::MatchRepo;
pub use user_repo::UserRepo;
