//! Staff directory backends
//!
//! The permission store never talks to a transport directly. It goes through
//! a [`StaffDirectory`], which is either the in-process [`InMemoryDirectory`]
//! or the [`HttpDirectory`] client of the API service.

use common::error::BackendResult;
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::models::{RoleAssignment, StaffId, StaffMember};

pub mod http;
pub mod memory;

pub use http::HttpDirectory;
pub use memory::InMemoryDirectory;

/// Backend holding staff records and their role-assignment documents
pub trait StaffDirectory: Send + Sync {
    /// Every staff record visible to the caller
    fn fetch_staff(&self) -> impl Future<Output = BackendResult<Vec<StaffMember>>> + Send;

    /// The coarse role-assignment document of one staff member
    fn fetch_role_assignments(
        &self,
        staff_id: &StaffId,
    ) -> impl Future<Output = BackendResult<Vec<RoleAssignment>>> + Send;

    /// Insert or replace a staff record
    fn save_staff(&self, member: &StaffMember) -> impl Future<Output = BackendResult<()>> + Send;

    /// Delete a staff record and its role-assignment document
    fn delete_staff(&self, staff_id: &StaffId) -> impl Future<Output = BackendResult<()>> + Send;

    /// Replace the role-assignment document of one staff member
    fn save_role_assignments(
        &self,
        staff_id: &StaffId,
        assignments: &[RoleAssignment],
    ) -> impl Future<Output = BackendResult<()>> + Send;
}

/// `{ "data": ... }` wrapper used by every backend response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Body of `GET /admin/permissions/{staffId}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsDocument {
    #[serde(default)]
    pub role_assignments: Vec<RoleAssignment>,
}
