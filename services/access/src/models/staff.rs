//! Staff member model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::feature::FeaturePermissions;
use super::role::RoleKey;

/// Identifier of a staff member
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffId(String);

impl StaffId {
    /// Fresh random identifier for a newly added member
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StaffId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for StaffId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Employment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StaffStatus {
    #[default]
    Active,
    Inactive,
    #[serde(rename = "On Leave")]
    OnLeave,
}

/// Staff member entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: StaffId,
    pub name: String,
    pub email: String,
    pub department: String,
    /// Primary role, for display
    pub role: String,
    #[serde(default)]
    pub assigned_roles: Vec<RoleKey>,
    pub join_date: NaiveDate,
    #[serde(default)]
    pub status: StaffStatus,
    #[serde(default)]
    pub permissions: FeaturePermissions,
}

impl StaffMember {
    pub fn has_assigned_role(&self, role: &str) -> bool {
        self.assigned_roles.iter().any(|r| r.as_str() == role)
    }

    /// Emails are compared case-insensitively
    pub fn matches_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}

/// New staff member creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStaffMember {
    pub name: String,
    pub email: String,
    pub department: String,
    pub role: String,
    #[serde(default)]
    pub assigned_roles: Vec<RoleKey>,
    /// Defaults to the current date
    #[serde(default)]
    pub join_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: StaffStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_member_wire_format() {
        let member: StaffMember = serde_json::from_str(
            r#"{
                "id": "staff-7",
                "name": "Asha Rao",
                "email": "Asha@School.edu",
                "department": "Library",
                "role": "Librarian",
                "assignedRoles": ["librarian"],
                "joinDate": "2021-06-01",
                "status": "On Leave",
                "permissions": {"library": {"issue_books": true}}
            }"#,
        )
        .expect("staff member should parse");

        assert_eq!(member.status, StaffStatus::OnLeave);
        assert!(member.has_assigned_role("librarian"));
        assert!(member.matches_email("asha@school.edu"));
        assert!(!member.permissions.is_empty());
    }
}
