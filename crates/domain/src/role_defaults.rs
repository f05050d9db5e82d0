use std::collections::{BTreeMap, BTreeSet};

use crate::{PermissionKey, RoleName};

/// Baseline grant set per role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleDefaults {
    grants: BTreeMap<RoleName, BTreeSet<PermissionKey>>,
}

impl RoleDefaults {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the full default set of a role.
    pub fn set_role(&mut self, role: RoleName, keys: BTreeSet<PermissionKey>) {
        self.grants.insert(role, keys);
    }

    /// Returns the defaults of a role; unknown roles have none.
    #[must_use]
    pub fn defaults_for(&self, role: &RoleName) -> Option<&BTreeSet<PermissionKey>> {
        self.grants.get(role)
    }
}
