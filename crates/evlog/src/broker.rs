use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::consumer::Consumer;
use crate::error::LogError;
use crate::producer::Producer;
use crate::record::{Delivered, LogRecord};

/// Default per-topic channel capacity.
const DEFAULT_TOPIC_CAPACITY: usize = 256;

struct Topic {
    sender: broadcast::Sender<Delivered>,
    next_offset: u64,
}

struct BrokerInner {
    topics: Mutex<HashMap<String, Topic>>,
    capacity: usize,
}

/// In-process log broker.
///
/// Cheaply clone-able handle to a shared set of topics. Appends to a topic
/// are totally ordered; the append lock assigns offsets, so two producers can
/// never interleave records out of offset order.
#[derive(Clone)]
pub struct MemoryBroker {
    inner: Arc<BrokerInner>,
}

impl MemoryBroker {
    /// Create a broker with the default per-topic capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TOPIC_CAPACITY)
    }

    /// Create a broker with a custom per-topic capacity.
    ///
    /// A subscriber that falls more than `capacity` records behind observes
    /// [`LogError::Lagged`] on its next receive.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                topics: Mutex::new(HashMap::new()),
                capacity,
            }),
        }
    }

    /// Create a producer identified by `client_id`.
    pub fn producer(&self, client_id: impl Into<String>) -> Producer {
        Producer::new(self.clone(), client_id.into())
    }

    /// Create a consumer belonging to the group `group_id`.
    pub fn consumer(&self, group_id: impl Into<String>) -> Consumer {
        Consumer::new(self.clone(), group_id.into())
    }

    pub(crate) fn append(&self, topic: &str, record: LogRecord) -> Result<u64, LogError> {
        if topic.trim().is_empty() {
            return Err(LogError::InvalidTopic(topic.to_string()));
        }

        let mut topics = self.inner.topics.lock();
        let entry = topics
            .entry(topic.to_string())
            .or_insert_with(|| Topic::with_capacity(self.inner.capacity));

        let offset = entry.next_offset;
        entry.next_offset += 1;

        // send() errs when no subscriber exists yet; the record is still
        // counted so offsets stay contiguous.
        let _ = entry.sender.send(Delivered { offset, record });

        Ok(offset)
    }

    pub(crate) fn subscribe(&self, topic: &str) -> broadcast::Receiver<Delivered> {
        let mut topics = self.inner.topics.lock();
        topics
            .entry(topic.to_string())
            .or_insert_with(|| Topic::with_capacity(self.inner.capacity))
            .sender
            .subscribe()
    }
}

impl Topic {
    fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            next_offset: 0,
        }
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}
