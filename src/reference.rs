//! Location descriptors for deferred values.
//!
//! A [`Reference`] names where a value lives: a `location` identifying a loadable
//! unit and a `member` inside it. The textual form is `"location:member"` with
//! exactly one `:` and neither side empty.
//!
//! ```rust
//! use lazyregistry::Reference;
//!
//! let reference: Reference = "pkg.mod:Attr".parse().unwrap();
//! assert_eq!(reference.location(), "pkg.mod");
//! assert_eq!(reference.member(), "Attr");
//! assert_eq!(reference.to_string(), "pkg.mod:Attr");
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

pub const SEPARATOR: char = ':';

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Reference {
    location: String,
    member: String,
}

impl Reference {
    pub fn new(location: impl Into<String>, member: impl Into<String>) -> RegistryResult<Self> {
        let location = location.into();
        let member = member.into();
        let raw = format!("{}{}{}", location, SEPARATOR, member);
        Self::validate(&raw, &location, &member)?;
        Ok(Self { location, member })
    }

    pub fn parse(raw: &str) -> RegistryResult<Self> {
        let (location, member) = raw.split_once(SEPARATOR).ok_or_else(|| {
            RegistryError::invalid_reference(raw, format!("missing '{}' separator", SEPARATOR))
        })?;
        Self::validate(raw, location, member)?;
        Ok(Self {
            location: location.to_string(),
            member: member.to_string(),
        })
    }

    fn validate(raw: &str, location: &str, member: &str) -> RegistryResult<()> {
        if location.contains(SEPARATOR) || member.contains(SEPARATOR) {
            return Err(RegistryError::invalid_reference(
                raw,
                format!("expected exactly one '{}'", SEPARATOR),
            ));
        }
        if location.is_empty() {
            return Err(RegistryError::invalid_reference(raw, "empty location"));
        }
        if member.is_empty() {
            return Err(RegistryError::invalid_reference(raw, "empty member"));
        }
        Ok(())
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn member(&self) -> &str {
        &self.member
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.location, SEPARATOR, self.member)
    }
}

impl FromStr for Reference {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Reference {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Reference> for String {
    fn from(reference: Reference) -> Self {
        reference.to_string()
    }
}
