//! State management for the lost-and-found platform.
//!
//! - [`MatchOrchestrator`] turns candidate pairs into deduplicated matches.
//! - [`ClaimWorkflow`] runs the claim lifecycle and its cascades.
//! - [`Reconciler`] holds the periodic matching, expiry and health passes.
//! - [`ItemService`] reports items and runs instant matching.
//!
//! All status writes go through these types. Each mutation runs in one
//! transaction; notification intents are published on the event bus only
//! after it commits.

pub mod claims;
pub mod error;
pub mod items;
pub mod notify;
pub mod orchestrator;
pub mod reconcile;

pub use claims::ClaimWorkflow;
pub use error::WorkflowError;
pub use items::{ItemService, MatchingState, ReportedItem};
pub use orchestrator::{BatchSummary, MatchOrchestrator, MatchOutcome, SkipReason};
pub use reconcile::{ExpirySummary, MatchingPassSummary, Reconciler};
