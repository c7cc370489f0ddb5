//! Set difference between current and desired permission names.

use std::collections::BTreeSet;

use crate::protect::MarkerTable;

/// Names to grant and revoke. Both lists are sorted and disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionDiff {
    pub to_add: Vec<String>,
    pub to_remove: Vec<String>,
}

impl PermissionDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Drop names `table` protects from `to_remove`.
    #[must_use]
    pub fn without_protected(mut self, table: &MarkerTable) -> Self {
        self.to_remove.retain(|name| !table.protects(name, ""));
        self
    }
}

/// `to_add = desired \ current`, `to_remove = current \ desired`.
pub fn calculate_permission_diff<C, D>(current: &[C], desired: &[D]) -> PermissionDiff
where
    C: AsRef<str>,
    D: AsRef<str>,
{
    let current: BTreeSet<&str> = current.iter().map(AsRef::as_ref).collect();
    let desired: BTreeSet<&str> = desired.iter().map(AsRef::as_ref).collect();
    PermissionDiff {
        to_add: desired.difference(&current).map(|s| (*s).to_string()).collect(),
        to_remove: current.difference(&desired).map(|s| (*s).to_string()).collect(),
    }
}
