//! Write path: mutation requests become ordered log appends.

use evlog::{LogRecord, Producer};
use tracing::debug;

use crate::error::Result;
use crate::events::MutationEvent;
use crate::resource::Operation;
use crate::store::Record;

/// Record key attached to every mutation event, a partition-affinity hint
/// for brokers that shard topics.
const MESSAGE_KEY: &str = "data";

/// Appends mutation events to the collection's log topic.
///
/// Publishing acknowledges the append only; the store reflects the mutation
/// once the event applier has consumed it. Consistency is eventual.
pub struct EventPublisher {
    producer: Producer,
    topic: String,
    collection: String,
}

impl EventPublisher {
    pub fn new(producer: Producer, topic: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            producer,
            topic: topic.into(),
            collection: collection.into(),
        }
    }

    /// Wrap `data` as a mutation event and append it, returning the offset.
    pub fn publish(&self, operation: Operation, data: Record) -> Result<u64> {
        let event = MutationEvent::new(operation, &self.collection, data);
        let payload = serde_json::to_vec(&event)?;
        let offset = self
            .producer
            .send(&self.topic, LogRecord::keyed(MESSAGE_KEY, payload))?;

        debug!(
            topic = %self.topic,
            offset,
            operation = %operation,
            "mutation event published"
        );
        Ok(offset)
    }
}
