//! Entity identifiers.

use aspekt_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Uniform resource name identifying an entity.
///
/// Canonical text form is `urn:<namespace>:<entity-type>:<key>`. The key is
/// everything after the third colon and may itself contain colons, commas,
/// or a nested URN in parentheses.
///
/// # Examples
///
/// ```
/// use aspekt_record::Urn;
///
/// let urn: Urn = "urn:li:corpuser:alice".parse().unwrap();
/// assert_eq!(urn.entity_type(), "corpuser");
/// assert_eq!(urn.key(), "alice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Urn {
    namespace: String,
    entity_type: String,
    key: String,
}

impl Urn {
    /// Creates a URN from its parts.
    pub fn new<N, T, K>(namespace: N, entity_type: T, key: K) -> Result<Self>
    where
        N: Into<String>,
        T: Into<String>,
        K: Into<String>,
    {
        let urn = Self {
            namespace: namespace.into(),
            entity_type: entity_type.into(),
            key: key.into(),
        };
        if urn.namespace.is_empty()
            || urn.entity_type.is_empty()
            || urn.key.is_empty()
            || urn.namespace.contains(':')
            || urn.entity_type.contains(':')
        {
            return Err(Error::InvalidUrn {
                value: urn.to_string(),
            });
        }
        Ok(urn)
    }

    /// Returns the namespace (`li` in `urn:li:corpuser:alice`).
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the entity type (`corpuser` in `urn:li:corpuser:alice`).
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Returns the entity key (`alice` in `urn:li:corpuser:alice`).
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "urn:{}:{}:{}", self.namespace, self.entity_type, self.key)
    }
}

impl FromStr for Urn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidUrn {
            value: s.to_string(),
        };
        let rest = s.strip_prefix("urn:").ok_or_else(invalid)?;
        let mut parts = rest.splitn(3, ':');
        let namespace = parts.next().ok_or_else(invalid)?;
        let entity_type = parts.next().ok_or_else(invalid)?;
        let key = parts.next().ok_or_else(invalid)?;
        Self::new(namespace, entity_type, key).map_err(|_| invalid())
    }
}

impl TryFrom<String> for Urn {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Urn> for String {
    fn from(urn: Urn) -> Self {
        urn.to_string()
    }
}
