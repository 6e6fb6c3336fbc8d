//! In-process staff directory

use chrono::NaiveDate;
use common::error::{BackendError, BackendResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use super::StaffDirectory;
use crate::models::{
    AccessLevel, FeatureKey, FeaturePermissions, RoleAssignment, RoleKey, StaffId, StaffMember,
    StaffStatus,
};

/// Staff directory kept in memory, with an optional simulated round trip
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    staff: Arc<RwLock<Vec<StaffMember>>>,
    assignments: Arc<RwLock<HashMap<StaffId, Vec<RoleAssignment>>>>,
    latency: Duration,
}

impl InMemoryDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory holding the given records
    pub fn seeded(
        staff: Vec<StaffMember>,
        assignments: impl IntoIterator<Item = (StaffId, Vec<RoleAssignment>)>,
    ) -> Self {
        Self {
            staff: Arc::new(RwLock::new(staff)),
            assignments: Arc::new(RwLock::new(assignments.into_iter().collect())),
            latency: Duration::ZERO,
        }
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// A small school staff used for local runs
    pub fn sample() -> Self {
        let staff = vec![
            sample_member(
                "staff-admin",
                "Meera Iyer",
                "admin@school.edu",
                "Administration",
                "Administrator",
                &["admin"],
                &[],
            ),
            sample_member(
                "staff-library",
                "Asha Rao",
                "librarian@school.edu",
                "Library",
                "Librarian",
                &["librarian"],
                &[
                    "library.manage_books",
                    "library.issue_books",
                    "inventory.view_inventory",
                ],
            ),
            sample_member(
                "staff-counsel",
                "Daniel Okafor",
                "counselor@school.edu",
                "Student Welfare",
                "Counselor",
                &["counselor"],
                &["counseling.manage_sessions", "counseling.view_sessions"],
            ),
            sample_member(
                "staff-transport",
                "Ravi Menon",
                "transport@school.edu",
                "Transport",
                "Transport Manager",
                &["transport_manager"],
                &["transport.manage_routes", "transport.manage_logs"],
            ),
            sample_member(
                "staff-events",
                "Lina Haddad",
                "events@school.edu",
                "Activities",
                "Event Handler",
                &["event_handler", "soft_skills_manager"],
                &["events.manage_events"],
            ),
        ];

        let assignments = vec![
            (
                StaffId::from("staff-library"),
                vec![RoleAssignment::new("librarian", AccessLevel::Edit)],
            ),
            (
                StaffId::from("staff-counsel"),
                vec![RoleAssignment::new("counselor", AccessLevel::Edit)],
            ),
            (
                StaffId::from("staff-transport"),
                vec![RoleAssignment::new("transport_manager", AccessLevel::View)],
            ),
            (
                StaffId::from("staff-events"),
                vec![
                    RoleAssignment::new("event_handler", AccessLevel::Edit),
                    RoleAssignment::new("soft_skills_manager", AccessLevel::View),
                ],
            ),
        ];

        Self::seeded(staff, assignments)
    }

    async fn round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn sample_member(
    id: &str,
    name: &str,
    email: &str,
    department: &str,
    role: &str,
    assigned_roles: &[&str],
    granted: &[&str],
) -> StaffMember {
    let permissions = granted
        .iter()
        .filter_map(|key| key.parse::<FeatureKey>().ok())
        .fold(FeaturePermissions::new(), |acc, key| acc.with(&key, true));

    StaffMember {
        id: StaffId::from(id),
        name: name.to_string(),
        email: email.to_string(),
        department: department.to_string(),
        role: role.to_string(),
        assigned_roles: assigned_roles.iter().map(|r| RoleKey::from(*r)).collect(),
        join_date: NaiveDate::from_ymd_opt(2022, 6, 1).unwrap_or(NaiveDate::MIN),
        status: StaffStatus::Active,
        permissions,
    }
}

impl StaffDirectory for InMemoryDirectory {
    async fn fetch_staff(&self) -> BackendResult<Vec<StaffMember>> {
        self.round_trip().await;
        Ok(self.staff.read().await.clone())
    }

    async fn fetch_role_assignments(&self, staff_id: &StaffId) -> BackendResult<Vec<RoleAssignment>> {
        self.round_trip().await;
        Ok(self
            .assignments
            .read()
            .await
            .get(staff_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_staff(&self, member: &StaffMember) -> BackendResult<()> {
        self.round_trip().await;
        let mut staff = self.staff.write().await;
        match staff.iter_mut().find(|m| m.id == member.id) {
            Some(existing) => *existing = member.clone(),
            None => staff.push(member.clone()),
        }
        debug!("Saved staff record {}", member.id);
        Ok(())
    }

    async fn delete_staff(&self, staff_id: &StaffId) -> BackendResult<()> {
        self.round_trip().await;
        let mut staff = self.staff.write().await;
        let before = staff.len();
        staff.retain(|m| &m.id != staff_id);
        if staff.len() == before {
            return Err(BackendError::NotFound(staff_id.to_string()));
        }
        drop(staff);

        self.assignments.write().await.remove(staff_id);
        debug!("Deleted staff record {}", staff_id);
        Ok(())
    }

    async fn save_role_assignments(
        &self,
        staff_id: &StaffId,
        assignments: &[RoleAssignment],
    ) -> BackendResult<()> {
        self.round_trip().await;
        self.assignments
            .write()
            .await
            .insert(staff_id.clone(), assignments.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_directory_contents() {
        let directory = InMemoryDirectory::sample();
        let staff = directory.fetch_staff().await.expect("fetch should succeed");
        assert_eq!(staff.len(), 5);

        let assignments = directory
            .fetch_role_assignments(&StaffId::from("staff-library"))
            .await
            .expect("fetch should succeed");
        assert_eq!(
            assignments,
            vec![RoleAssignment::new("librarian", AccessLevel::Edit)]
        );
    }

    #[tokio::test]
    async fn test_missing_document_is_empty() {
        let directory = InMemoryDirectory::new();
        let assignments = directory
            .fetch_role_assignments(&StaffId::from("nobody"))
            .await
            .expect("fetch should succeed");
        assert!(assignments.is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_staff() {
        let directory = InMemoryDirectory::new();
        let result = directory.delete_staff(&StaffId::from("ghost")).await;
        assert_eq!(result, Err(BackendError::NotFound("ghost".into())));
    }
}
