//! Mutation events and their producers/consumers.
//!
//! A mutation accepted over HTTP is never applied directly: it is wrapped as
//! a [`MutationEvent`], appended to the collection's log topic, and applied
//! by every instance's [`applier::EventApplier`] in delivery order,
//! including the instance that published it.

pub mod applier;
pub mod publisher;

use serde::{Deserialize, Serialize};

use crate::resource::{Operation, UnknownOperation};
use crate::store::Record;

pub use applier::EventApplier;
pub use publisher::EventPublisher;

/// One ordered mutation on a collection replica.
///
/// The operation travels as a plain string so that an event produced by a
/// newer instance still decodes on an older one; [`MutationEvent::operation`]
/// resolves it to the [`Operation`] dispatch table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationEvent {
    pub operation: String,
    pub collection: String,
    pub data: Record,
}

impl MutationEvent {
    pub fn new(operation: Operation, collection: impl Into<String>, data: Record) -> Self {
        Self {
            operation: operation.as_str().to_string(),
            collection: collection.into(),
            data,
        }
    }

    /// Resolve the wire operation string.
    pub fn operation(&self) -> Result<Operation, UnknownOperation> {
        self.operation.parse()
    }
}
