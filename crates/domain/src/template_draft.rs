use std::collections::BTreeSet;

use serde::Serialize;

use crate::{PermissionCatalog, PermissionKey, PermissionScope, TemplateId};

/// Keys added to and removed from a template since its last baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateChanges {
    /// Keys present in the working set only.
    pub added: BTreeSet<PermissionKey>,
    /// Keys present in the baseline only.
    pub removed: BTreeSet<PermissionKey>,
}

impl TemplateChanges {
    /// Returns whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Editing state of one template permission set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDraft {
    template_id: TemplateId,
    scope: PermissionScope,
    original: BTreeSet<PermissionKey>,
    working: BTreeSet<PermissionKey>,
}

impl TemplateDraft {
    /// Starts a draft from the stored permission set.
    #[must_use]
    pub fn new(
        template_id: TemplateId,
        scope: PermissionScope,
        stored: BTreeSet<PermissionKey>,
    ) -> Self {
        Self {
            template_id,
            scope,
            working: stored.clone(),
            original: stored,
        }
    }

    /// Returns the edited template.
    #[must_use]
    pub fn template_id(&self) -> TemplateId {
        self.template_id
    }

    /// Returns the template scope.
    #[must_use]
    pub fn scope(&self) -> PermissionScope {
        self.scope
    }

    /// Returns the baseline set.
    #[must_use]
    pub fn original(&self) -> &BTreeSet<PermissionKey> {
        &self.original
    }

    /// Returns the working set.
    #[must_use]
    pub fn working(&self) -> &BTreeSet<PermissionKey> {
        &self.working
    }

    /// Returns whether the key is selected in the working set.
    #[must_use]
    pub fn is_selected(&self, key: &PermissionKey) -> bool {
        self.working.contains(key)
    }

    /// Flips one key and returns its new selection.
    pub fn toggle(&mut self, key: PermissionKey) -> bool {
        if self.working.remove(&key) {
            false
        } else {
            self.working.insert(key);
            true
        }
    }

    /// Replaces the working set.
    pub fn set_working(&mut self, keys: BTreeSet<PermissionKey>) {
        self.working = keys;
    }

    /// Selects or clears exactly the keys of one module in the template scope.
    ///
    /// When every key of the module is already selected they are all cleared,
    /// otherwise they are all selected. Returns the new module selection.
    pub fn toggle_module(&mut self, catalog: &PermissionCatalog, module: &str) -> bool {
        let module_keys = catalog.keys_in_module(module, self.scope);
        if module_keys.is_empty() {
            return false;
        }

        let all_selected = module_keys.iter().all(|key| self.working.contains(key));
        if all_selected {
            for key in &module_keys {
                self.working.remove(key);
            }
            false
        } else {
            self.working.extend(module_keys);
            true
        }
    }

    /// Returns whether the working set differs from the baseline.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.working
            .symmetric_difference(&self.original)
            .next()
            .is_some()
    }

    /// Returns the keys added and removed since the baseline.
    #[must_use]
    pub fn changes(&self) -> TemplateChanges {
        TemplateChanges {
            added: self.working.difference(&self.original).cloned().collect(),
            removed: self.original.difference(&self.working).cloned().collect(),
        }
    }

    /// Makes the working set the new baseline after a successful save.
    pub fn mark_saved(&mut self) {
        self.original = self.working.clone();
    }
}
