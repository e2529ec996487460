//! Best-effort notification dispatch for workflow transitions.
//!
//! State transitions produce an outbox of notification events; the
//! dispatcher renders and delivers them strictly after the transition has
//! committed. Delivery is fire-and-forget: a sink failure is logged and
//! never propagated into the approval transaction.
//!
//! # Modules
//!
//! - `types` - Notification events, rendered notifications, and the sink seam
//! - `dispatcher` - Outbox rendering and best-effort delivery

pub mod dispatcher;
pub mod types;

pub use dispatcher::NotificationDispatcher;
pub use types::{
    Notification, NotificationKind, NotificationPriority, NotificationSink, OutboxEvent, SinkError,
};
