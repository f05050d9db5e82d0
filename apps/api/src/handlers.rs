use brigada_core::AppResult;
use brigada_domain::PermissionScope;

pub mod health;
pub mod overrides;
pub mod permissions;
pub mod templates;

#[cfg(test)]
mod tests;

fn parse_scope(scope: Option<&str>) -> AppResult<Option<PermissionScope>> {
    scope
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(PermissionScope::from_transport)
        .transpose()
}
