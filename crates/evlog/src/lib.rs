//! Ordered, append-only in-process event log.
//!
//! An `evlog` broker holds a set of named topics. Each topic is a totally
//! ordered log of records: producers append, and every consumer group
//! receives every record in append order. Group ids exist for identity and
//! logging; they do NOT load-share a topic between members of the same group.
//! That mirrors deployments where each service instance subscribes under its
//! own group and is expected to see the full stream.
//!
//! Delivery is at-least-once from the consumer's point of view: a subscriber
//! that falls too far behind observes [`LogError::Lagged`] with the number of
//! records it missed, and may keep receiving afterwards.

mod broker;
mod consumer;
mod error;
mod producer;
mod record;

pub use broker::MemoryBroker;
pub use consumer::{Consumer, Subscription};
pub use error::LogError;
pub use producer::Producer;
pub use record::{Delivered, LogRecord};
