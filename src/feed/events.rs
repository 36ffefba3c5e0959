use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::UniqueId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A transient, user-facing message (what a UI would show as a toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    PageLoaded { added: usize, has_more: bool },
    Exhausted,
    Refreshed,
    Replaced { count: usize },
    ItemUpdated(UniqueId),
    ItemRemoved(UniqueId),
    ItemRestored(UniqueId),
    Notification(Notification),
}

/// Publish/subscribe channel for feed changes.
///
/// Each subscriber owns its receiver; dropping the receiver unsubscribes.
#[derive(Debug, Clone)]
pub struct FeedEvents {
    tx: broadcast::Sender<FeedEvent>,
}

impl FeedEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn publish(&self, event: FeedEvent) {
        // Err only means nobody is listening
        if self.tx.send(event).is_err() {
            trace!("Feed event dropped: no subscribers");
        }
    }

    pub fn notify(&self, notification: Notification) {
        self.publish(FeedEvent::Notification(notification));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostKind;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let events = FeedEvents::new(8);
        let mut rx = events.subscribe();

        events.publish(FeedEvent::Refreshed);
        events.notify(Notification::error("Failed to delete post"));

        assert_eq!(rx.recv().await.unwrap(), FeedEvent::Refreshed);
        assert_eq!(
            rx.recv().await.unwrap(),
            FeedEvent::Notification(Notification::error("Failed to delete post"))
        );
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let events = FeedEvents::new(8);
        events.publish(FeedEvent::ItemRemoved(UniqueId::new(PostKind::Text, 1)));
        assert_eq!(events.subscriber_count(), 0);
    }

    #[test]
    fn test_dropping_receiver_unsubscribes() {
        let events = FeedEvents::new(8);
        let rx = events.subscribe();
        assert_eq!(events.subscriber_count(), 1);
        drop(rx);
        assert_eq!(events.subscriber_count(), 0);
    }
}
