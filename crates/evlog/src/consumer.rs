use tokio::sync::broadcast;

use crate::broker::MemoryBroker;
use crate::error::LogError;
use crate::record::Delivered;

/// Reads topics on behalf of one consumer group.
///
/// Every group receives every record of a topic it subscribes to; there is no
/// load-sharing between subscriptions created under the same group id.
pub struct Consumer {
    broker: MemoryBroker,
    group_id: String,
}

impl Consumer {
    pub(crate) fn new(broker: MemoryBroker, group_id: String) -> Self {
        Self { broker, group_id }
    }

    /// The group id this consumer reads under.
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Subscribe to `topic` from its current tail.
    ///
    /// Records appended before the subscription existed are not replayed.
    pub fn subscribe(&self, topic: &str) -> Subscription {
        Subscription {
            receiver: self.broker.subscribe(topic),
            topic: topic.to_string(),
            group_id: self.group_id.clone(),
        }
    }
}

/// An active subscription of one consumer group to one topic.
pub struct Subscription {
    receiver: broadcast::Receiver<Delivered>,
    topic: String,
    group_id: String,
}

impl Subscription {
    /// The topic this subscription reads.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The group id this subscription reads under.
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Receive the next record in append order.
    ///
    /// Returns [`LogError::Lagged`] when the subscription fell behind the
    /// topic's retention window; receiving may continue afterwards from the
    /// oldest retained record. Returns [`LogError::Closed`] when the broker
    /// is gone.
    pub async fn recv(&mut self) -> Result<Delivered, LogError> {
        match self.receiver.recv().await {
            Ok(delivered) => Ok(delivered),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                Err(LogError::Lagged { skipped })
            }
            Err(broadcast::error::RecvError::Closed) => Err(LogError::Closed),
        }
    }
}
