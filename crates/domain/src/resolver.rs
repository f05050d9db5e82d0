//! Effective permission resolution.
//!
//! Three layers are combined for one (user, branch) pair:
//!
//! 1. the role defaults, or the bound template which replaces them entirely;
//! 2. the sparse per-user per-branch overrides (local scope only);
//! 3. the catalog, which decides which keys exist in the requested scope.
//!
//! Resolution is a pure function of its inputs and never fails: reference
//! data problems degrade to `false` and are reported as
//! [`ConfigurationIssue`]s next to the result.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::{
    OverrideSet, OverrideState, PermissionCatalog, PermissionKey, PermissionScope, RoleDefaults,
    RoleName,
};


/// Template layer bound for a resolution.
#[derive(Debug, Clone, Copy)]
pub struct TemplateLayer<'a> {
    /// Scope of the bound template.
    pub scope: PermissionScope,
    /// Keys granted by the template.
    pub permissions: &'a BTreeSet<PermissionKey>,
}

/// Inputs of one resolution.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionInput<'a> {
    /// Permission catalog.
    pub catalog: &'a PermissionCatalog,
    /// Scope to resolve.
    pub scope: PermissionScope,
    /// Role of the user; `None` behaves like an unknown role.
    pub role: Option<&'a RoleName>,
    /// Role default table.
    pub role_defaults: &'a RoleDefaults,
    /// Bound template, replacing role defaults when present.
    pub template: Option<TemplateLayer<'a>>,
    /// Overrides of the (user, branch) pair.
    pub overrides: &'a OverrideSet,
}

/// Layer that decided a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionSource {
    /// Role default table.
    RoleDefault,
    /// Bound template.
    Template,
    /// Explicit per-user per-branch override.
    Override,
}

impl PermissionSource {
    /// Returns a stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleDefault => "role_default",
            Self::Template => "template",
            Self::Override => "override",
        }
    }
}

/// Resolved value of one permission key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedPermission {
    /// Value coming from role defaults or template.
    pub inherited: bool,
    /// Override state applied on top of the inherited value.
    pub override_state: OverrideState,
    /// Final value.
    pub effective: bool,
    /// Layer that decided `effective`.
    pub source: PermissionSource,
}

/// Reference data problem detected while resolving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigurationIssue {
    /// The bound template belongs to another scope; the key resolves to `false`.
    TemplateScopeMismatch {
        /// Affected key.
        key: PermissionKey,
        /// Scope of the bound template.
        template_scope: PermissionScope,
        /// Scope of the permission.
        permission_scope: PermissionScope,
    },
    /// An override targets a brand permission, which has no override layer.
    OverrideOnBrandPermission {
        /// Affected key.
        key: PermissionKey,
    },
    /// An override references a key missing from the catalog.
    UnknownOverrideKey {
        /// Affected key.
        key: PermissionKey,
    },
}

/// Effective permission set for one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectivePermissions {
    scope: PermissionScope,
    entries: BTreeMap<PermissionKey, ResolvedPermission>,
    issues: Vec<ConfigurationIssue>,
}

impl EffectivePermissions {
    /// Returns the resolved scope.
    #[must_use]
    pub fn scope(&self) -> PermissionScope {
        self.scope
    }

    /// Returns whether the key is effectively granted. Keys outside the
    /// resolved scope are denied.
    #[must_use]
    pub fn is_granted(&self, key: &PermissionKey) -> bool {
        self.entries.get(key).is_some_and(|entry| entry.effective)
    }

    /// Returns the inherited value of a key, before overrides.
    #[must_use]
    pub fn inherited(&self, key: &PermissionKey) -> bool {
        self.entries.get(key).is_some_and(|entry| entry.inherited)
    }

    /// Returns the resolved entry for a key.
    #[must_use]
    pub fn get(&self, key: &PermissionKey) -> Option<&ResolvedPermission> {
        self.entries.get(key)
    }

    /// Iterates all resolved entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&PermissionKey, &ResolvedPermission)> {
        self.entries.iter()
    }

    /// Returns the effectively granted keys.
    #[must_use]
    pub fn granted_keys(&self) -> BTreeSet<PermissionKey> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.effective)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Returns the plain `key -> effective` map.
    #[must_use]
    pub fn to_bool_map(&self) -> BTreeMap<PermissionKey, bool> {
        self.entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.effective))
            .collect()
    }

    /// Returns the configuration issues found while resolving.
    #[must_use]
    pub fn issues(&self) -> &[ConfigurationIssue] {
        self.issues.as_slice()
    }
}

/// Resolves the effective permissions of every catalog key in the input scope.
#[must_use]
pub fn resolve(input: &ResolutionInput<'_>) -> EffectivePermissions {
    let mut issues = Vec::new();
    let role_base = input
        .role
        .and_then(|role| input.role_defaults.defaults_for(role));

    let mut entries = BTreeMap::new();
    for definition in input.catalog.in_scope(input.scope) {
        let key = definition.key();

        let (inherited, inherited_source) = match input.template {
            Some(template) if template.scope != definition.scope() => {
                issues.push(ConfigurationIssue::TemplateScopeMismatch {
                    key: key.clone(),
                    template_scope: template.scope,
                    permission_scope: definition.scope(),
                });
                (false, PermissionSource::Template)
            }
            Some(template) => (
                template.permissions.contains(key),
                PermissionSource::Template,
            ),
            None => (
                role_base.is_some_and(|keys| keys.contains(key)),
                PermissionSource::RoleDefault,
            ),
        };

        let override_state = match definition.scope() {
            PermissionScope::Local => input.overrides.state(key),
            PermissionScope::Brand => OverrideState::Inherited,
        };

        let source = match override_state {
            OverrideState::Inherited => inherited_source,
            OverrideState::Grant | OverrideState::Revoke => PermissionSource::Override,
        };

        entries.insert(
            key.clone(),
            ResolvedPermission {
                inherited,
                override_state,
                effective: override_state.effective(inherited),
                source,
            },
        );
    }

    for key in input.overrides.keys() {
        match input.catalog.get(key) {
            None => issues.push(ConfigurationIssue::UnknownOverrideKey { key: key.clone() }),
            Some(definition) if definition.scope() == PermissionScope::Brand => {
                issues.push(ConfigurationIssue::OverrideOnBrandPermission { key: key.clone() });
            }
            Some(_) => {}
        }
    }

    EffectivePermissions {
        scope: input.scope,
        entries,
        issues,
    }
}
