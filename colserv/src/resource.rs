//! Resource identity and mutation operations.
//!
//! A [`Resource`] fixes the collection name and its primary-key field once at
//! construction; nothing downstream re-derives key names from strings per
//! request.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One resource collection and its derived key names.
///
/// The primary key is the singular resource name suffixed with `Id`
/// (`accounts` → `accountId`). Records may refer to another resource through
/// an internal array field named `_` + singular + `Ids` (`_accountIds`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    name: String,
    primary_key: String,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let primary_key = format!("{}Id", singular(&name));
        Self { name, primary_key }
    }

    /// The collection name, e.g. `accounts`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The primary-key field, e.g. `accountId`.
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// The internal foreign-key field pointing at `related`,
    /// e.g. `_accountIds` for `accounts`.
    pub fn related_key(related: &str) -> String {
        format!("_{}Ids", singular(related))
    }
}

/// Strip a trailing plural `s` from a resource name.
fn singular(name: &str) -> &str {
    name.strip_suffix('s').unwrap_or(name)
}

/// A mutation to apply to a collection replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

/// The operation value carried by an event was not recognized.
///
/// The applier treats this as a logged no-op rather than a failure, so an
/// event produced by a newer instance never stalls an older one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Operation::Create),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            other => Err(UnknownOperation(other.to_string())),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_key_derivation() {
        assert_eq!(Resource::new("accounts").primary_key(), "accountId");
        assert_eq!(Resource::new("customers").primary_key(), "customerId");
        assert_eq!(Resource::new("transactions").primary_key(), "transactionId");
    }

    #[test]
    fn test_non_plural_name_keeps_its_form() {
        // Only a trailing `s` is stripped; anything else passes through.
        assert_eq!(Resource::new("inventory").primary_key(), "inventoryId");
    }

    #[test]
    fn test_related_key() {
        assert_eq!(Resource::related_key("accounts"), "_accountIds");
        assert_eq!(Resource::related_key("contacts"), "_contactIds");
    }

    #[test]
    fn test_operation_round_trip() {
        for op in [Operation::Create, Operation::Update, Operation::Delete] {
            assert_eq!(op.as_str().parse::<Operation>(), Ok(op));
        }
    }

    #[test]
    fn test_unknown_operation() {
        assert_eq!(
            "upsert".parse::<Operation>(),
            Err(UnknownOperation("upsert".to_string()))
        );
    }
}
