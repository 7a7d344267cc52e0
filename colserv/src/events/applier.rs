//! Read path from the log: events become store mutations.

use std::sync::Arc;

use evlog::{Consumer, Delivered, LogError};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::events::MutationEvent;
use crate::resource::Operation;
use crate::store::{CollectionStore, StoreError};

/// A single event failed to apply. The subscription is not affected.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("undecodable event payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Long-lived subscriber that applies this collection's mutation events.
///
/// One applier runs per instance, under a consumer group scoped to the
/// instance, so every instance sees every event. Events are applied in
/// delivery order; a failing event is logged and skipped. No deduplication
/// or sequence check guards against redelivery, so a redelivered `create`
/// simply inserts again. Known consistency weakness, kept deliberately.
pub struct EventApplier {
    store: Arc<CollectionStore>,
    consumer: Consumer,
    topic: String,
}

impl EventApplier {
    pub fn new(store: Arc<CollectionStore>, consumer: Consumer, topic: impl Into<String>) -> Self {
        Self {
            store,
            consumer,
            topic: topic.into(),
        }
    }

    /// Consume the topic until cancelled or the log closes.
    pub async fn run(self, cancel: CancellationToken) {
        let mut subscription = self.consumer.subscribe(&self.topic);
        info!(
            topic = %self.topic,
            group_id = %self.consumer.group_id(),
            "event applier subscribed"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(topic = %self.topic, "event applier stopping");
                    break;
                }
                delivered = subscription.recv() => match delivered {
                    Ok(delivered) => {
                        info!(topic = %self.topic, offset = delivered.offset, "mutation event received");
                        if let Err(apply_error) = self.apply(&delivered) {
                            error!(
                                topic = %self.topic,
                                offset = delivered.offset,
                                error = %apply_error,
                                "failed to apply event, skipping"
                            );
                        }
                    }
                    Err(LogError::Lagged { skipped }) => {
                        warn!(topic = %self.topic, skipped, "event applier lagged, continuing");
                    }
                    Err(log_error) => {
                        warn!(topic = %self.topic, error = %log_error, "event subscription ended");
                        break;
                    }
                },
            }
        }
    }

    /// Spawn [`Self::run`] as a background task.
    pub fn spawn(self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }

    fn apply(&self, delivered: &Delivered) -> Result<(), ApplyError> {
        let event: MutationEvent = serde_json::from_slice(&delivered.record.value)?;

        match event.operation() {
            Ok(Operation::Create) => {
                self.store.insert(event.data)?;
            }
            Ok(Operation::Update) => {
                let touched = self.store.merge_update(&event.data)?;
                if touched == 0 {
                    debug!(topic = %self.topic, "update matched no record");
                }
            }
            Ok(Operation::Delete) => {
                let removed = self.store.remove_matching(&event.data)?;
                debug!(topic = %self.topic, removed, "delete applied");
            }
            Err(unknown) => {
                warn!(topic = %self.topic, operation = %unknown.0, "unrecognized operation, skipping");
            }
        }
        Ok(())
    }
}
