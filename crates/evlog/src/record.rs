use bytes::Bytes;

/// A record appended to a topic.
///
/// The optional key is a partition-affinity hint for brokers that shard
/// topics; the in-process broker keeps one partition per topic and ignores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub key: Option<String>,
    pub value: Bytes,
}

impl LogRecord {
    /// Create an unkeyed record.
    pub fn new(value: impl Into<Bytes>) -> Self {
        Self {
            key: None,
            value: value.into(),
        }
    }

    /// Create a keyed record.
    pub fn keyed(key: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self {
            key: Some(key.into()),
            value: value.into(),
        }
    }
}

/// A record as seen by a subscriber, tagged with its topic offset.
#[derive(Debug, Clone)]
pub struct Delivered {
    /// Position of the record within its topic, starting at 0.
    pub offset: u64,
    pub record: LogRecord,
}
