//! Subscription workflows: one locked fetch → transform → commit cycle each.
//!
//! Every workflow validates its input before touching the store, takes the
//! path locks of every file it rewrites, computes all replacement texts, and
//! only then hands them to [`commit_staged`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mts_authfiles::{
    validate_group, validate_login, validate_password, AuthFileError, CredentialEntry,
    CredentialStore, GroupMembership, GroupStore, MountTable,
};
use mts_reconcile::{full_sync, grant, revoke, ReconcileError};
use mts_store::{commit_staged, fetch_baseline, CommitError, LockError, StagedWrite, TransferError};
use thiserror::Error;
use tracing::{info, warn};

use crate::api_types::{
    ActivateRequest, ActivateResponse, DeactivateRequest, DeactivateResponse, ErrorResponse,
    SyncRequest, SyncResponse,
};
use crate::credentials::default_group_for;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// ServiceError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("login {login} already exists")]
    DuplicateLogin { login: String },

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Commit(#[from] CommitError),
}

impl ServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation",
            ServiceError::DuplicateLogin { .. } => "duplicate_login",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Lock(_) => "lock_timeout",
            ServiceError::Transfer(_) | ServiceError::Commit(_) => "transfer",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::DuplicateLogin { .. } => StatusCode::CONFLICT,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Lock(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Transfer(_) | ServiceError::Commit(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<AuthFileError> for ServiceError {
    fn from(e: AuthFileError) -> Self {
        match e {
            AuthFileError::DuplicateLogin { login } => ServiceError::DuplicateLogin { login },
            AuthFileError::LoginNotFound { .. } => ServiceError::NotFound(e.to_string()),
            AuthFileError::InvalidIdentifier { .. } => ServiceError::Validation(e.to_string()),
        }
    }
}

impl From<ReconcileError> for ServiceError {
    fn from(e: ReconcileError) -> Self {
        ServiceError::Validation(e.to_string())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
                kind: self.kind().to_string(),
            }),
        )
            .into_response()
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Activate
// ---------------------------------------------------------------------------

/// New subscription: credential line, group membership, and mount grants.
pub async fn activate(st: &AppState, req: ActivateRequest) -> Result<ActivateResponse, ServiceError> {
    let (Some(serial), Some(stations)) = (non_empty(req.serial), req.stations) else {
        return Err(ServiceError::Validation(
            "serial and stations are required, and stations must be an array".to_string(),
        ));
    };

    let generated = st.credentials.generate();
    let login = non_empty(req.login).unwrap_or(generated.login);
    let password = non_empty(req.password).unwrap_or(generated.password);
    let group = non_empty(req.group).unwrap_or_else(|| default_group_for(&login));
    validate_login(&login)?;
    validate_password(&password)?;
    validate_group(&group)?;

    // Dry run against an empty table so bad station input fails before any I/O.
    grant(&mut MountTable::empty(), &stations, &group)?;

    let (users_path, groups_path, mounts_path) = (st.users_path(), st.groups_path(), st.mounts_path());
    let _guard = st
        .locks
        .acquire(
            &[users_path, groups_path, mounts_path],
            st.config.store.lock_timeout(),
        )
        .await?;

    let store = st.store.as_ref();
    let users_prev = fetch_baseline(store, users_path).await?;
    let groups_prev = fetch_baseline(store, groups_path).await?;
    let mounts_prev = fetch_baseline(store, mounts_path).await?;

    let mut users = CredentialStore::parse(users_prev.as_deref().unwrap_or_default());
    users.append(CredentialEntry::new(login.clone(), password.clone()))?;

    let mut groups = GroupStore::parse(groups_prev.as_deref().unwrap_or_default());
    groups.append(GroupMembership::new(group.clone(), login.clone()))?;

    let mut table = MountTable::parse(mounts_prev.as_deref().unwrap_or_default());
    let report = grant(&mut table, &stations, &group)?;

    let writes = [
        StagedWrite::new(users_path, users_prev, users.serialize()),
        StagedWrite::new(groups_path, groups_prev, groups.serialize()),
        StagedWrite::new(mounts_path, mounts_prev, table.serialize()),
    ];
    commit_staged(store, &writes).await?;

    info!(
        %serial,
        login = %login,
        group = %group,
        changes = report.changes.len(),
        "subscription activated"
    );

    Ok(ActivateResponse {
        success: true,
        login,
        password,
        group,
        changes: report.changes,
    })
}

// ---------------------------------------------------------------------------
// Deactivate
// ---------------------------------------------------------------------------

/// Cancelled subscription: drop the credential line, the group's
/// memberships, and the group from every mount.
pub async fn deactivate(
    st: &AppState,
    req: DeactivateRequest,
) -> Result<DeactivateResponse, ServiceError> {
    let (Some(login), Some(group)) = (non_empty(req.login), non_empty(req.group)) else {
        return Err(ServiceError::Validation(
            "login and group are required".to_string(),
        ));
    };
    validate_login(&login)?;
    validate_group(&group)?;

    let (users_path, groups_path, mounts_path) = (st.users_path(), st.groups_path(), st.mounts_path());
    let _guard = st
        .locks
        .acquire(
            &[users_path, groups_path, mounts_path],
            st.config.store.lock_timeout(),
        )
        .await?;

    let store = st.store.as_ref();
    let users_prev = fetch_baseline(store, users_path).await?;
    let users_next = CredentialStore::remove(users_prev.as_deref().unwrap_or_default(), &login)?;

    let groups_prev = fetch_baseline(store, groups_path).await?;
    let (groups_next, memberships_removed) =
        GroupStore::remove_group(groups_prev.as_deref().unwrap_or_default(), &group);
    if memberships_removed == 0 {
        warn!(group = %group, "group had no memberships to remove");
    }

    let mounts_prev = fetch_baseline(store, mounts_path).await?;
    let mut table = MountTable::parse(mounts_prev.as_deref().unwrap_or_default());
    let report = revoke(&mut table, &group)?;

    let writes = [
        StagedWrite::new(users_path, users_prev, users_next),
        StagedWrite::new(groups_path, groups_prev, groups_next),
        StagedWrite::new(mounts_path, mounts_prev, table.serialize()),
    ];
    commit_staged(store, &writes).await?;

    info!(
        login = %login,
        group = %group,
        memberships_removed,
        changes = report.changes.len(),
        "subscription deactivated"
    );

    Ok(DeactivateResponse {
        success: true,
        login,
        group,
        memberships_removed,
        changes: report.changes,
    })
}

// ---------------------------------------------------------------------------
// Station sync
// ---------------------------------------------------------------------------

/// Converge one group onto the CRM's complete station snapshot.
pub async fn sync_stations(st: &AppState, req: SyncRequest) -> Result<SyncResponse, ServiceError> {
    let (Some(group), Some(desired)) = (non_empty(req.group), req.stations) else {
        return Err(ServiceError::Validation(
            "group and stations are required, and stations must be an array".to_string(),
        ));
    };

    full_sync(&mut MountTable::empty(), &desired, &group)?;

    let mounts_path = st.mounts_path();
    let _guard = st
        .locks
        .acquire(&[mounts_path], st.config.store.lock_timeout())
        .await?;

    let store = st.store.as_ref();
    let mounts_prev = fetch_baseline(store, mounts_path).await?;
    let mut table = MountTable::parse(mounts_prev.as_deref().unwrap_or_default());
    let report = full_sync(&mut table, &desired, &group)?;

    commit_staged(
        store,
        &[StagedWrite::new(mounts_path, mounts_prev, table.serialize())],
    )
    .await?;

    info!(
        group = %group,
        desired = desired.len(),
        changes = report.changes.len(),
        "stations synced"
    );

    Ok(SyncResponse {
        success: true,
        group,
        changes: report.changes,
    })
}
