//! Payload column addressing for upserts
//!
//! Upserts target a column by namespace. The set of namespaces is closed:
//! each variant maps to a fixed column identifier, and parsing a string is
//! the only way untrusted input becomes a `Namespace`.

use crate::StoreError;
use std::fmt;
use std::str::FromStr;

/// A payload column that upserts may target
///
/// These are the same columns `insert` fills from a [`Record`](super::Record):
/// `Primary` is `primary_payload`, `Secondary` is `secondary_payload`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Primary,
    Secondary,
}

impl Namespace {
    pub const ALL: [Namespace; 2] = [Namespace::Primary, Namespace::Secondary];

    /// Column identifier backing this namespace
    pub fn column(&self) -> &'static str {
        match self {
            Namespace::Primary => "primaryPayload",
            Namespace::Secondary => "secondaryPayload",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Namespace {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Namespace::ALL
            .into_iter()
            .find(|ns| ns.column() == s)
            .ok_or_else(|| {
                StoreError::InvalidNamespace(format!(
                    "'{}' is not a payload column (expected one of: primaryPayload, secondaryPayload)",
                    s
                ))
            })
    }
}
