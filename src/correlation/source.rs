use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 64;

/// One text message as delivered by the device inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(body: impl Into<String>) -> Self {
        Self::at(body, Utc::now())
    }

    pub fn at(body: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            body: body.into(),
            timestamp,
        }
    }
}

/// Push-based stream of inbound messages. Each subscriber sees messages
/// published after it subscribed, in delivery order.
pub trait MessageSource: Send + Sync + 'static {
    fn subscribe(&self) -> broadcast::Receiver<InboundMessage>;
}

/// In-process inbox fed by whatever bridges the platform's message store.
#[derive(Debug, Clone)]
pub struct InboxChannel {
    sender: broadcast::Sender<InboundMessage>,
}

impl Default for InboxChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl InboxChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns how many subscribers received the message.
    pub fn publish(&self, message: InboundMessage) -> usize {
        self.sender.send(message).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl MessageSource for InboxChannel {
    fn subscribe(&self) -> broadcast::Receiver<InboundMessage> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_without_subscribers_is_dropped() {
        let inbox = InboxChannel::default();
        assert_eq!(inbox.publish(InboundMessage::new("hola")), 0);

        let mut rx = inbox.subscribe();
        assert_eq!(inbox.publish(InboundMessage::new("uno")), 1);
        assert_eq!(rx.recv().await.unwrap().body, "uno");
    }
}
