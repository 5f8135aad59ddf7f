// Domain model types
pub mod supplier;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Validated unique identifier backing every aggregate id.
///
/// Constructing without a value generates a fresh v4 UUID; parsing accepts
/// only canonically valid UUID strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Result<Self, ServiceError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| ServiceError::ValidationError(format!("Invalid identifier: {}", value)))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EntityId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for EntityId {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn fresh_ids_are_unique() {
        assert_ne!(EntityId::new(), EntityId::new());
    }

    #[test]
    fn parse_round_trips_canonical_uuids() {
        let id = EntityId::new();
        let parsed = EntityId::parse(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_malformed_input() {
        let err = EntityId::parse("not-a-uuid").unwrap_err();
        assert_matches!(
            err,
            ServiceError::ValidationError(msg) if msg == "Invalid identifier: not-a-uuid"
        );
    }

    #[test]
    fn serializes_as_the_bare_uuid_string() {
        let id = EntityId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }
}
