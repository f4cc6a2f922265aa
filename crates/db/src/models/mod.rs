//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for inserts and request bodies

pub mod claim;
pub mod found_item;
pub mod item_match;
pub mod lost_item;
pub mod user;
