//! Error types for the access layer
//!
//! Authorization denials are never errors; they are plain `false` answers or
//! a denied gate. Only backend failures and rejected mutations show up here.

use common::error::BackendError;
use thiserror::Error;

use crate::models::StaffId;

/// Error stored on the permission store when a load fails
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The staff directory could not be fetched
    #[error("Failed to load staff directory: {0}")]
    Staff(#[source] BackendError),

    /// The role-assignment document could not be fetched
    #[error("Failed to load permissions for {staff_id}: {source}")]
    Permissions {
        staff_id: StaffId,
        #[source]
        source: BackendError,
    },
}

/// Error returned by permission store mutations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No staff member with this id
    #[error("Staff member not found: {0}")]
    NotFound(StaffId),

    /// Role key absent from the catalog
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Feature key absent from the catalog
    #[error("Unknown feature: {0}")]
    UnknownFeature(String),

    /// Another staff member already uses this email
    #[error("Email already in use: {0}")]
    DuplicateEmail(String),

    /// Invalid input
    #[error("Validation error: {0}")]
    Validation(String),

    /// A mutation for the same staff member has not completed yet
    #[error("A change for {0} is already in progress")]
    MutationInFlight(String),

    /// The store was cleared or reloaded while the mutation was in flight
    #[error("Permission store was reset during the operation")]
    Superseded,

    /// The backend rejected or failed the call
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Type alias for store mutation results
pub type StoreResult<T> = Result<T, StoreError>;
