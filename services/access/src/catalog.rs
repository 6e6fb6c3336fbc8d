//! Static role, feature and dashboard catalogs
//!
//! The catalog is built once when a [`PermissionStore`](crate::store::PermissionStore)
//! is created and never changes afterwards; `clear()` keeps it.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{
    ADMIN_ROLE, Dashboard, FeatureKey, FeaturePermissions, RoleDefinition, RoleKey,
    WILDCARD_PERMISSION,
};

// Dashboard -> role key required to see it
const DASHBOARD_ROLES: &[(Dashboard, &str)] = &[
    (Dashboard::Library, "librarian"),
    (Dashboard::Counselor, "counselor"),
    (Dashboard::PhysicalEducation, "pt_teacher"),
    (Dashboard::Events, "event_handler"),
    (Dashboard::Transport, "transport_manager"),
    (Dashboard::SoftSkills, "soft_skills_manager"),
    (Dashboard::Parent, "parent"),
    (Dashboard::Admin, ADMIN_ROLE),
];

// Feature categories and their features
const FEATURES: &[(&str, &[&str])] = &[
    ("library", &["manage_books", "issue_books", "view_reports"]),
    ("inventory", &["manage_inventory", "view_inventory"]),
    ("counseling", &["manage_sessions", "view_sessions"]),
    ("sports", &["manage_events", "record_attendance"]),
    ("events", &["manage_events", "approve_budget"]),
    ("transport", &["manage_routes", "manage_logs"]),
    ("fees", &["view_payments", "record_payments"]),
    ("leave", &["approve_requests", "submit_requests"]),
    ("messages", &["send_messages", "broadcast"]),
];

/// Role key required to open `dashboard`
pub fn required_role(dashboard: Dashboard) -> &'static str {
    DASHBOARD_ROLES
        .iter()
        .find(|(d, _)| *d == dashboard)
        .map(|(_, role)| *role)
        .unwrap_or(ADMIN_ROLE)
}

fn role(
    key: &str,
    name: &str,
    description: &str,
    permissions: &[&str],
    color: &str,
    icon: &str,
) -> RoleDefinition {
    RoleDefinition {
        key: RoleKey::from(key),
        name: name.to_string(),
        description: description.to_string(),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
        color: color.to_string(),
        icon: icon.to_string(),
    }
}

/// Role definitions plus the set of known feature keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    roles: Vec<RoleDefinition>,
    features: BTreeMap<String, Vec<String>>,
}

impl Catalog {
    pub fn new(roles: Vec<RoleDefinition>, features: BTreeMap<String, Vec<String>>) -> Self {
        Self { roles, features }
    }

    /// The school's role and feature catalog
    pub fn school() -> Self {
        let roles = vec![
            role(
                ADMIN_ROLE,
                "Administrator",
                "Full access to every dashboard and setting",
                &[WILDCARD_PERMISSION],
                "red",
                "shield",
            ),
            role(
                "librarian",
                "Librarian",
                "Manages the book catalog and lending",
                &[
                    "view_library_dashboard",
                    "manage_books",
                    "issue_books",
                    "view_library_reports",
                ],
                "blue",
                "book",
            ),
            role(
                "counselor",
                "Counselor",
                "Runs counseling sessions and follows student wellbeing",
                &[
                    "view_counselor_dashboard",
                    "manage_counseling_sessions",
                    "view_student_records",
                ],
                "green",
                "heart",
            ),
            role(
                "pt_teacher",
                "PT Teacher",
                "Organises sports and records fitness results",
                &[
                    "view_pt_dashboard",
                    "manage_sports_events",
                    "record_fitness_scores",
                ],
                "orange",
                "activity",
            ),
            role(
                "event_handler",
                "Event Handler",
                "Plans school events and their budgets",
                &["view_event_dashboard", "manage_events", "manage_event_budget"],
                "purple",
                "calendar",
            ),
            role(
                "transport_manager",
                "Transport Manager",
                "Manages bus routes and transport logs",
                &[
                    "view_transport_dashboard",
                    "manage_routes",
                    "manage_transport_logs",
                    "view_transport_fees",
                ],
                "yellow",
                "bus",
            ),
            role(
                "soft_skills_manager",
                "Soft Skills Manager",
                "Schedules soft-skills sessions",
                &["view_soft_skills_dashboard", "manage_soft_skills_sessions"],
                "teal",
                "users",
            ),
            role(
                "parent",
                "Parent",
                "Follows a child's fees, leave requests and messages",
                &[
                    "view_parent_dashboard",
                    "view_fee_payments",
                    "submit_leave_requests",
                    "send_messages",
                ],
                "gray",
                "home",
            ),
        ];

        let features = FEATURES
            .iter()
            .map(|(category, features)| {
                (
                    category.to_string(),
                    features.iter().map(|f| f.to_string()).collect(),
                )
            })
            .collect();

        Self::new(roles, features)
    }

    pub fn roles(&self) -> &[RoleDefinition] {
        &self.roles
    }

    pub fn role(&self, key: &str) -> Option<&RoleDefinition> {
        self.roles.iter().find(|r| r.key.as_str() == key)
    }

    pub fn contains_role(&self, key: &str) -> bool {
        self.role(key).is_some()
    }

    pub fn contains_feature(&self, key: &FeatureKey) -> bool {
        self.features
            .get(key.category())
            .is_some_and(|features| features.iter().any(|f| f == key.feature()))
    }

    /// Every known feature key, in catalog order
    pub fn feature_keys(&self) -> Vec<FeatureKey> {
        self.features
            .iter()
            .flat_map(|(category, features)| {
                features
                    .iter()
                    .filter_map(move |feature| FeatureKey::new(category, feature).ok())
            })
            .collect()
    }

    /// A permission map with every known feature set to `false`
    pub fn denied_features(&self) -> FeaturePermissions {
        self.feature_keys()
            .iter()
            .fold(FeaturePermissions::new(), |acc, key| acc.with(key, false))
    }

    /// Restrict `permissions` to known features, filling the rest with `false`
    ///
    /// Returns the normalized map and the entries that were dropped.
    pub fn normalize_features(
        &self,
        permissions: &FeaturePermissions,
    ) -> (FeaturePermissions, Vec<String>) {
        let mut normalized = self.denied_features();
        let mut dropped = Vec::new();

        for (category, feature, granted) in permissions.entries() {
            match FeatureKey::new(category, feature) {
                Ok(key) if self.contains_feature(&key) => normalized.set(&key, granted),
                _ => dropped.push(format!("{}.{}", category, feature)),
            }
        }

        (normalized, dropped)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::school()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_dashboard_role_is_in_catalog() {
        let catalog = Catalog::school();
        for dashboard in Dashboard::ALL {
            assert!(
                catalog.contains_role(required_role(dashboard)),
                "missing role for {}",
                dashboard
            );
        }
    }

    #[test]
    fn test_only_admin_is_unrestricted() {
        let catalog = Catalog::school();
        let unrestricted: Vec<&str> = catalog
            .roles()
            .iter()
            .filter(|r| r.is_unrestricted())
            .map(|r| r.key.as_str())
            .collect();
        assert_eq!(unrestricted, vec![ADMIN_ROLE]);
    }

    #[test]
    fn test_denied_features_cover_catalog() {
        let catalog = Catalog::school();
        let denied = catalog.denied_features();
        assert_eq!(denied.entries().count(), catalog.feature_keys().len());
        assert!(denied.entries().all(|(_, _, granted)| !granted));
    }

    #[test]
    fn test_normalize_drops_unknown_features() {
        let catalog = Catalog::school();
        let manage: FeatureKey = "inventory.manage_inventory".parse().expect("valid key");
        let unknown: FeatureKey = "inventory.teleport".parse().expect("valid key");
        let input = FeaturePermissions::new()
            .with(&manage, true)
            .with(&unknown, true);

        let (normalized, dropped) = catalog.normalize_features(&input);

        assert!(normalized.is_granted(&manage));
        assert!(!normalized.is_granted(&unknown));
        assert_eq!(dropped, vec!["inventory.teleport".to_string()]);
    }
}
