//! Local ID prefixes and remote identifiers.
//!
//! Local hierarchy rows get IDs of the form `{prefix}-{8 hex chars}`, generated
//! by the database. Remote IDs are assigned by the identity provider; during a
//! dry run the engine fabricates [`RemoteId::Simulated`] values so that later
//! phases can still resolve references to entities that were never created.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::enums::HierarchyKind;

pub const PREFIX_DISTRIBUTOR: &str = "dst";
pub const PREFIX_RESELLER: &str = "rsl";
pub const PREFIX_CUSTOMER: &str = "cus";
pub const PREFIX_USER: &str = "usr";
pub const PREFIX_AUDIT: &str = "aud";

/// Local ID prefix for a hierarchy level.
#[must_use]
pub const fn prefix_for(kind: HierarchyKind) -> &'static str {
    match kind {
        HierarchyKind::Distributor => PREFIX_DISTRIBUTOR,
        HierarchyKind::Reseller => PREFIX_RESELLER,
        HierarchyKind::Customer => PREFIX_CUSTOMER,
        HierarchyKind::User => PREFIX_USER,
    }
}

const SIMULATED_PREFIX: &str = "dry-run-";

/// Identifier of a remote entity.
///
/// Simulated IDs exist only inside a dry run and must never reach the
/// remote API. `Display` renders them as `dry-run-{kind}-{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "origin", content = "value", rename_all = "snake_case")]
pub enum RemoteId {
    Real(String),
    Simulated(String),
}

impl RemoteId {
    /// Fabricate a dry-run ID for an entity of `kind` named `name`.
    #[must_use]
    pub fn simulated(kind: &str, name: &str) -> Self {
        Self::Simulated(format!("{kind}-{}", name.to_lowercase()))
    }

    #[must_use]
    pub const fn is_simulated(&self) -> bool {
        matches!(self, Self::Simulated(_))
    }

    /// The remote ID if it was assigned by the provider.
    #[must_use]
    pub fn as_real(&self) -> Option<&str> {
        match self {
            Self::Real(id) => Some(id),
            Self::Simulated(_) => None,
        }
    }
}

impl From<String> for RemoteId {
    fn from(id: String) -> Self {
        Self::Real(id)
    }
}

impl From<&str> for RemoteId {
    fn from(id: &str) -> Self {
        Self::Real(id.to_string())
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real(id) => f.write_str(id),
            Self::Simulated(inner) => write!(f, "{SIMULATED_PREFIX}{inner}"),
        }
    }
}
