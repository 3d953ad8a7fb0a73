//! Entity identity for the time series.
//!
//! An entity is a named subject of the series (a city, in the original
//! exercise). Names are validated once at construction; the simulator also
//! pins the entity set at initialization via [`Roster`] so that unknown
//! entities cannot slip in mid-run.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::record::Snapshot;

/// Validated entity identifier.
///
/// Construction trims surrounding whitespace and rejects empty names, so a
/// held `EntityName` is always a usable key. Deserialization goes through
/// the same validation.
///
/// # Examples
///
/// ```
/// use popsim::EntityName;
///
/// let miami = EntityName::new("Miami").unwrap();
/// assert_eq!(miami.as_str(), "Miami");
/// assert!(EntityName::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityName(String);

impl EntityName {
    /// Creates a validated entity name.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyEntityName`] if the name is empty or
    /// all whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyEntityName);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for EntityName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntityName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityName> for String {
    fn from(name: EntityName) -> Self {
        name.0
    }
}

/// The fixed set of entities a simulation run operates on.
///
/// Captured once from the base-year snapshot. Entities are fixed at
/// initialization; the simulator checks later snapshots against the roster
/// and rejects entities it has never seen instead of silently carrying
/// them forward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster(BTreeSet<EntityName>);

impl Roster {
    /// Builds a roster from the entities present in a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self(snapshot.entities().cloned().collect())
    }

    /// Returns true if the entity is part of this roster.
    #[must_use]
    pub fn contains(&self, entity: &EntityName) -> bool {
        self.0.contains(entity)
    }

    /// Number of entities in the roster.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the roster holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the roster in ascending name order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityName> {
        self.0.iter()
    }
}
