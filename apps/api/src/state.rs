use std::sync::Arc;

use brigada_application::{PermissionAdminService, PermissionResolutionService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub resolution_service: PermissionResolutionService,
    pub admin_service: PermissionAdminService,
    pub gateway_shared_secret: Arc<str>,
}

impl AppState {
    pub fn new(
        resolution_service: PermissionResolutionService,
        admin_service: PermissionAdminService,
        gateway_shared_secret: String,
    ) -> Self {
        Self {
            resolution_service,
            admin_service,
            gateway_shared_secret: Arc::from(gateway_shared_secret),
        }
    }
}
