use tracing::trace;

use crate::broker::MemoryBroker;
use crate::error::LogError;
use crate::record::LogRecord;

/// Appends records to topics on behalf of one named client.
pub struct Producer {
    broker: MemoryBroker,
    client_id: String,
}

impl Producer {
    pub(crate) fn new(broker: MemoryBroker, client_id: String) -> Self {
        Self { broker, client_id }
    }

    /// The client id this producer appends under.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Append a record to `topic`, returning its offset.
    pub fn send(&self, topic: &str, record: LogRecord) -> Result<u64, LogError> {
        let offset = self.broker.append(topic, record)?;
        trace!(
            client_id = %self.client_id,
            topic,
            offset,
            "record appended"
        );
        Ok(offset)
    }
}
