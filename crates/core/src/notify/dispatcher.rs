//! Outbox rendering and best-effort delivery.

use std::sync::Arc;

use serde_json::json;

use acumen_shared::config::NotificationSettings;

use super::types::{
    Notification, NotificationKind, NotificationPriority, NotificationSink, OutboxEvent,
};

/// Renders outbox events and hands them to the sink, fire-and-forget.
///
/// The dispatcher is never part of the transactional boundary: callers
/// invoke it only after the state transition has committed, and sink
/// failures are logged rather than propagated.
pub struct NotificationDispatcher {
    sink: Arc<dyn NotificationSink>,
    settings: NotificationSettings,
}

impl NotificationDispatcher {
    /// Creates a dispatcher over the given sink.
    #[must_use]
    pub fn new(sink: Arc<dyn NotificationSink>, settings: NotificationSettings) -> Self {
        Self { sink, settings }
    }

    /// Delivers every event, best-effort.
    ///
    /// Returns the number of successfully delivered notifications.
    pub fn dispatch_all(&self, events: &[OutboxEvent]) -> usize {
        let mut delivered = 0;
        for event in events {
            let notification = self.render(event);
            match self.sink.send(&notification) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    tracing::warn!(
                        kind = %event.kind,
                        instance_id = %event.instance_id,
                        recipient = %event.recipient,
                        %err,
                        "notification delivery failed, continuing"
                    );
                }
            }
        }
        delivered
    }

    fn render(&self, event: &OutboxEvent) -> Notification {
        let serial = &event.serial_no;
        let category = event.category.as_str();
        let (title, body, priority) = match event.kind {
            NotificationKind::Created => (
                format!("Approval requested: {serial}"),
                format!("A {category} audit awaits your review."),
                NotificationPriority::Normal,
            ),
            NotificationKind::Advanced => (
                format!("Approval advanced: {serial}"),
                format!("The {category} audit has reached your step."),
                NotificationPriority::Normal,
            ),
            NotificationKind::Approved => (
                format!("Approved: {serial}"),
                format!("Your {category} request was approved."),
                NotificationPriority::Normal,
            ),
            NotificationKind::Rejected => (
                format!("Rejected: {serial}"),
                format!("Your {category} request was rejected."),
                NotificationPriority::High,
            ),
        };

        Notification {
            recipient: event.recipient,
            title,
            body,
            priority,
            deep_link: format!("{}/{}", self.settings.deep_link_base, event.instance_id),
            metadata: json!({
                "kind": event.kind.as_str(),
                "serial_no": event.serial_no,
                "category": category,
                "step_number": event.step_number,
            }),
        }
    }
}
