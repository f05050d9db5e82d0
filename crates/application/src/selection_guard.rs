use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use brigada_core::{AppResult, UserIdentity};
use brigada_domain::{BranchId, UserId};
use tracing::debug;

use crate::{OverrideEditSession, PermissionAdminService};

/// Generation handed out when a selection starts loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SelectionTicket(u64);

/// Result of a fetch checked against the latest selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    /// The fetch belongs to the latest selection.
    Current(T),
    /// A newer selection started while the fetch was in flight.
    Stale,
}

impl<T> Fetched<T> {
    /// Returns the value for the latest selection, if any.
    pub fn into_current(self) -> Option<T> {
        match self {
            Self::Current(value) => Some(value),
            Self::Stale => None,
        }
    }
}

/// Discards results of fetches superseded by a newer selection.
///
/// Every call to [`SelectionGuard::begin`] supersedes all earlier tickets.
#[derive(Debug, Default)]
pub struct SelectionGuard {
    latest: AtomicU64,
}

impl SelectionGuard {
    /// Creates a guard with no selection in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new selection and returns its ticket.
    pub fn begin(&self) -> SelectionTicket {
        SelectionTicket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Returns whether no newer selection started after `ticket`.
    #[must_use]
    pub fn is_current(&self, ticket: SelectionTicket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// Wraps a fetched value according to the ticket freshness.
    pub fn accept<T>(&self, ticket: SelectionTicket, value: T) -> Fetched<T> {
        if self.is_current(ticket) {
            Fetched::Current(value)
        } else {
            debug!(
                generation = ticket.0,
                latest = self.latest.load(Ordering::Acquire),
                "discarding fetch for superseded selection"
            );
            Fetched::Stale
        }
    }
}

/// Loads override editing sessions for the latest (user, branch) selection.
#[derive(Clone)]
pub struct OverrideSelectionLoader {
    admin_service: PermissionAdminService,
    guard: Arc<SelectionGuard>,
}

impl OverrideSelectionLoader {
    /// Creates a loader sharing one guard across calls.
    #[must_use]
    pub fn new(admin_service: PermissionAdminService, guard: Arc<SelectionGuard>) -> Self {
        Self {
            admin_service,
            guard,
        }
    }

    /// Selects a (user, branch) pair and loads its overrides.
    ///
    /// When another selection starts before this one finishes the result is
    /// [`Fetched::Stale`], errors included.
    pub async fn load(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        branch_id: BranchId,
    ) -> AppResult<Fetched<OverrideEditSession>> {
        let ticket = self.guard.begin();
        let result = self
            .admin_service
            .open_overrides(actor, user_id, branch_id)
            .await;

        if !self.guard.is_current(ticket) {
            debug!(%user_id, %branch_id, generation = ticket.0, "override selection superseded");
            return Ok(Fetched::Stale);
        }

        result.map(|session| self.guard.accept(ticket, session))
    }
}
