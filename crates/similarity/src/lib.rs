//! Client for the external similarity service.
//!
//! The embedding and scoring model runs out of process. This crate exposes
//! it as the [`SimilarityService`] trait, with an HTTP implementation in
//! [`client`] and the retrying wrapper used on the instant-matching path.

pub mod client;
pub mod error;
pub mod service;
pub mod types;

pub use client::{HttpSimilarityClient, SimilarityClientConfig};
pub use error::SimilarityError;
pub use service::{match_instant_with_retry, SimilarityService};
pub use types::{BackgroundMatch, InstantMatch, ItemFeatures, ItemKind};
