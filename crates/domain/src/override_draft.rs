use brigada_core::{AppError, AppResult};

use crate::template::join_keys;
use crate::{
    BranchId, OverrideSet, OverrideState, PermissionCatalog, PermissionKey, PermissionScope, UserId,
};

/// Editing state of the overrides of one (user, branch) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideDraft {
    user_id: UserId,
    branch_id: BranchId,
    original: OverrideSet,
    working: OverrideSet,
}

impl OverrideDraft {
    /// Starts a draft from the stored overrides.
    #[must_use]
    pub fn new(user_id: UserId, branch_id: BranchId, stored: OverrideSet) -> Self {
        Self {
            user_id,
            branch_id,
            working: stored.clone(),
            original: stored,
        }
    }

    /// Returns the edited user.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the edited branch.
    #[must_use]
    pub fn branch_id(&self) -> BranchId {
        self.branch_id
    }

    /// Returns the stored baseline.
    #[must_use]
    pub fn original(&self) -> &OverrideSet {
        &self.original
    }

    /// Returns the working overrides.
    #[must_use]
    pub fn working(&self) -> &OverrideSet {
        &self.working
    }

    /// Returns the working state of a key.
    #[must_use]
    pub fn state(&self, key: &PermissionKey) -> OverrideState {
        self.working.state(key)
    }

    /// Advances a key to its next state and returns it.
    pub fn cycle(&mut self, key: PermissionKey, inherited_value: bool) -> OverrideState {
        let next = self.working.state(&key).next(inherited_value);
        self.working.set(key, next);
        next
    }

    /// Sets a key to an explicit state.
    pub fn set_state(&mut self, key: PermissionKey, state: OverrideState) {
        self.working.set(key, state);
    }

    /// Replaces the whole working set.
    pub fn set_working(&mut self, overrides: OverrideSet) {
        self.working = overrides;
    }

    /// Returns every key to `Inherited` in one step.
    pub fn reset_to_template(&mut self) {
        self.working.clear();
    }

    /// Returns whether the working set differs from the baseline.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.working != self.original
    }

    /// Makes the working set the new baseline after a confirmed save.
    pub fn mark_saved(&mut self) {
        self.original = self.working.clone();
    }

    /// Checks the working set before it is written.
    ///
    /// Keys missing from the catalog yield [`AppError::UnknownPermission`];
    /// overrides on brand permissions yield [`AppError::Validation`].
    pub fn validate(&self, catalog: &PermissionCatalog) -> AppResult<()> {
        let unknown = catalog.unknown_keys(self.working.keys());
        if !unknown.is_empty() {
            return Err(AppError::UnknownPermission(join_keys(&unknown)));
        }

        let brand_keys: Vec<PermissionKey> = self
            .working
            .keys()
            .filter(|key| {
                catalog
                    .get(key)
                    .is_some_and(|definition| definition.scope() == PermissionScope::Brand)
            })
            .cloned()
            .collect();
        if !brand_keys.is_empty() {
            return Err(AppError::Validation(format!(
                "brand permissions cannot be overridden per branch: {}",
                join_keys(&brand_keys)
            )));
        }

        Ok(())
    }
}
