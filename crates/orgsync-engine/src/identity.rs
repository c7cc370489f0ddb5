//! Bidirectional name ↔ remote id maps built from remote listings.
//!
//! When two remote entities share a name the later one wins, in both
//! directions for that name; the two maps always stay inverse to each other. Role mappings fold names to lowercase so lookups
//! match regardless of case; the reverse direction keeps the remote spelling.

use std::collections::BTreeMap;

use orgsync_core::ids::RemoteId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityMapping {
    name_to_id: BTreeMap<String, RemoteId>,
    id_to_name: BTreeMap<RemoteId, String>,
    fold_case: bool,
}

impl IdentityMapping {
    /// Empty mapping with exact name matching.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty mapping that matches names case-insensitively.
    #[must_use]
    pub fn case_insensitive() -> Self {
        Self {
            fold_case: true,
            ..Self::default()
        }
    }

    /// Build from `(name, id)` pairs in enumeration order.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut mapping = Self::new();
        mapping.extend(entries);
        mapping
    }

    /// Case-insensitive variant of [`Self::from_entries`], used for roles.
    pub fn from_entries_case_insensitive<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let mut mapping = Self::case_insensitive();
        mapping.extend(entries);
        mapping
    }

    fn key(&self, name: &str) -> String {
        if self.fold_case {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }

    fn extend<'a>(&mut self, entries: impl IntoIterator<Item = (&'a str, &'a str)>) {
        for (name, id) in entries {
            self.insert(name, RemoteId::from(id));
        }
    }

    /// Record `name` ↔ `id`. A previous id for the same name, or a previous
    /// name for the same id, is dropped in both directions.
    pub fn insert(&mut self, name: &str, id: RemoteId) {
        let key = self.key(name);
        if let Some(previous_name) = self.id_to_name.remove(&id) {
            let previous_key = self.key(&previous_name);
            if previous_key != key {
                self.name_to_id.remove(&previous_key);
            }
        }
        if let Some(previous_id) = self.name_to_id.insert(key, id.clone())
            && previous_id != id
        {
            self.id_to_name.remove(&previous_id);
        }
        self.id_to_name.insert(id, name.to_string());
    }

    /// Forget `name` and its id.
    pub fn remove(&mut self, name: &str) -> Option<RemoteId> {
        let id = self.name_to_id.remove(&self.key(name))?;
        self.id_to_name.remove(&id);
        Some(id)
    }

    /// Record a dry-run id for `name` unless it is already mapped.
    pub fn simulate(&mut self, kind: &str, name: &str) -> RemoteId {
        if let Some(id) = self.id_for(name) {
            return id.clone();
        }
        let id = RemoteId::simulated(kind, name);
        self.insert(name, id.clone());
        id
    }

    #[must_use]
    pub fn id_for(&self, name: &str) -> Option<&RemoteId> {
        self.name_to_id.get(&self.key(name))
    }

    #[must_use]
    pub fn name_for(&self, id: &RemoteId) -> Option<&str> {
        self.id_to_name.get(id).map(String::as_str)
    }

    /// Names for `ids`, dropping ids this mapping does not know.
    pub fn names_for<'a>(&self, ids: impl IntoIterator<Item = &'a RemoteId>) -> Vec<String> {
        ids.into_iter()
            .filter_map(|id| self.name_for(id))
            .map(ToString::to_string)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.name_to_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name_to_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lookups_work_in_both_directions() {
        let mapping = IdentityMapping::from_entries([("systems", "r1"), ("users", "r2")]);
        assert_eq!(mapping.id_for("systems"), Some(&RemoteId::from("r1")));
        assert_eq!(mapping.name_for(&RemoteId::from("r2")), Some("users"));
        assert_eq!(mapping.id_for("Systems"), None);
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn duplicate_names_keep_the_last_entry() {
        let mapping = IdentityMapping::from_entries([("dup", "first"), ("dup", "second")]);
        assert_eq!(mapping.id_for("dup"), Some(&RemoteId::from("second")));
        assert_eq!(mapping.name_for(&RemoteId::from("first")), None);
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn reassigned_ids_leave_no_stale_entries() {
        let mut mapping = IdentityMapping::from_entries([("old", "1"), ("new", "1")]);
        assert_eq!(mapping.id_for("old"), None);
        assert_eq!(mapping.name_for(&RemoteId::from("1")), Some("new"));

        mapping.insert("new", RemoteId::from("2"));
        assert_eq!(mapping.name_for(&RemoteId::from("1")), None);
        assert_eq!(mapping.name_for(&RemoteId::from("2")), Some("new"));
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn reinserting_a_pair_keeps_both_directions() {
        let mut mapping = IdentityMapping::case_insensitive();
        mapping.insert("Admin", RemoteId::from("r1"));
        mapping.insert("admin", RemoteId::from("r1"));
        assert_eq!(mapping.id_for("ADMIN"), Some(&RemoteId::from("r1")));
        assert_eq!(mapping.name_for(&RemoteId::from("r1")), Some("admin"));
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn role_mappings_fold_case() {
        let mapping = IdentityMapping::from_entries_case_insensitive([("Admin", "role-1")]);
        assert_eq!(mapping.id_for("admin"), Some(&RemoteId::from("role-1")));
        assert_eq!(mapping.id_for("ADMIN"), Some(&RemoteId::from("role-1")));
        assert_eq!(mapping.name_for(&RemoteId::from("role-1")), Some("Admin"));
    }

    #[test]
    fn simulate_only_fills_missing_names() {
        let mut mapping = IdentityMapping::from_entries([("read:systems", "s1")]);
        let existing = mapping.simulate("scope", "read:systems");
        assert_eq!(existing, RemoteId::from("s1"));

        let fresh = mapping.simulate("scope", "manage:systems");
        assert!(fresh.is_simulated());
        assert_eq!(fresh.to_string(), "dry-run-scope-manage:systems");
        assert_eq!(mapping.name_for(&fresh), Some("manage:systems"));
    }

    #[test]
    fn names_for_drops_unknown_ids() {
        let mapping = IdentityMapping::from_entries([("a", "1"), ("b", "2")]);
        let ids = [RemoteId::from("2"), RemoteId::from("9"), RemoteId::from("1")];
        assert_eq!(mapping.names_for(&ids), vec!["b", "a"]);
    }
}
