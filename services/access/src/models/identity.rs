//! Authenticated identity as supplied by the auth provider

use serde::{Deserialize, Serialize};

use super::role::ADMIN_ROLE;
use super::staff::StaffId;

/// The caller on whose behalf permissions are evaluated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(alias = "_id")]
    pub id: StaffId,
    pub email: String,
    pub role: String,
}

impl Identity {
    pub fn new(id: impl Into<StaffId>, email: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            role: role.into(),
        }
    }

    /// The auth provider's `admin` role overrides every permission check
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}
