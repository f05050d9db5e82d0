use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppError, AppResult, TenantId};

/// Staff member identity forwarded by the authenticating gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: Uuid,
    display_name: Option<String>,
    tenant_id: TenantId,
}

impl UserIdentity {
    /// Creates an identity from an already-parsed subject.
    #[must_use]
    pub fn new(subject: Uuid, display_name: Option<String>, tenant_id: TenantId) -> Self {
        Self {
            subject,
            display_name,
            tenant_id,
        }
    }

    /// Parses an identity from gateway-provided transport values.
    pub fn from_transport(
        subject: &str,
        display_name: Option<&str>,
        tenant_id: &str,
    ) -> AppResult<Self> {
        let subject = Uuid::parse_str(subject.trim())
            .map_err(|error| AppError::Unauthorized(format!("invalid subject: {error}")))?;
        let tenant_id = Uuid::parse_str(tenant_id.trim())
            .map(TenantId::from_uuid)
            .map_err(|error| AppError::Unauthorized(format!("invalid tenant: {error}")))?;
        let display_name = display_name
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned);

        Ok(Self::new(subject, display_name, tenant_id))
    }

    /// Returns the stable subject (user id) of the actor.
    #[must_use]
    pub fn subject(&self) -> Uuid {
        self.subject
    }

    /// Returns the display name, falling back to the subject.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| self.subject.to_string())
    }

    /// Returns the brand the actor is acting in.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
