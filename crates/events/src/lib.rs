//! Event bus and notification delivery for the lost-and-found platform.
//!
//! - [`EventBus`] is the in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`. Workflows publish after their transaction
//!   commits, so a slow gateway never holds a database lock.
//! - [`PlatformEvent`] is the event envelope, carrying its recipients.
//! - [`NotificationGateway`] is the outbound seam, with a logging
//!   implementation and a webhook one in [`delivery`].
//! - [`NotificationDispatcher`] drains the bus into a gateway.

pub mod bus;
pub mod delivery;
pub mod dispatcher;
pub mod gateway;

pub use bus::{EventBus, PlatformEvent};
pub use delivery::webhook::{WebhookError, WebhookGateway};
pub use dispatcher::NotificationDispatcher;
pub use gateway::{LogGateway, NotificationGateway};
