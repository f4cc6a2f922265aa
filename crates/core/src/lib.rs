//! Domain rules for the lost-and-found platform.
//!
//! Pure, I/O-free building blocks shared by the persistence, workflow, and
//! HTTP layers: identifiers, errors, status state machines, match
//! reconciliation, claim review rules, expiry, retry policy, and the keyed
//! TTL store used for rate limiting.

pub mod claim;
pub mod error;
pub mod expiry;
pub mod matching;
pub mod notification;
pub mod retry;
pub mod roles;
pub mod status;
pub mod ttl_store;
pub mod types;
