use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SCHEME: &str = "at://";

#[derive(Debug, Clone, Error, PartialEq)]
#[error("Invalid AT-URI: {0}")]
pub struct UriError(pub String);

/// A record-level `at://<authority>/<collection>/<rkey>` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AtUri {
    pub authority: String,
    pub collection: String,
    pub rkey: String,
}

impl AtUri {
    pub fn new(authority: impl Into<String>, collection: impl Into<String>, rkey: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            collection: collection.into(),
            rkey: rkey.into(),
        }
    }

    pub fn parse(value: &str) -> Result<Self, UriError> {
        let rest = value
            .strip_prefix(SCHEME)
            .ok_or_else(|| UriError(value.to_string()))?;

        if rest.contains(['?', '#', '\0']) {
            return Err(UriError(value.to_string()));
        }

        let mut parts = rest.split('/');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(authority), Some(collection), Some(rkey), None)
                if !authority.is_empty() && !collection.is_empty() && !rkey.is_empty() =>
            {
                Ok(Self::new(authority, collection, rkey))
            }
            _ => Err(UriError(value.to_string())),
        }
    }
}

impl FromStr for AtUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AtUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}/{}", SCHEME, self.authority, self.collection, self.rkey)
    }
}
