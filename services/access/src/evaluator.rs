//! Access evaluation
//!
//! Two granularities share one evaluator: coarse dashboard access derived
//! from role assignments, and fine feature flags stored per staff member.
//! Every query is synchronous, never fails, and answers with the most
//! restrictive result when data is missing or malformed.

use std::sync::Arc;
use tracing::debug;

use crate::catalog::{Catalog, required_role};
use crate::models::{
    AccessLevel, Dashboard, DashboardAccess, FeatureKey, Identity, RoleAssignment,
    RoleDefinition, StaffMember,
};
use crate::store::PermissionSnapshot;

/// Something access can be asked about
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    Dashboard(Dashboard),
    Feature(FeatureKey),
}

/// Query surface used by guards and route handlers
pub trait AccessEvaluator {
    /// Access level of the subject on `resource`
    fn access_level(&self, resource: &Resource) -> AccessLevel;

    /// Whether the subject holds the feature flag `key`
    fn feature_flag(&self, key: &FeatureKey) -> bool;

    /// Like [`feature_flag`](Self::feature_flag), for a raw `category.feature` string
    fn feature_flag_str(&self, key: &str) -> bool;
}

/// Evaluates one identity against a permission snapshot
#[derive(Debug, Clone)]
pub struct Evaluator {
    catalog: Arc<Catalog>,
    snapshot: Arc<PermissionSnapshot>,
    identity: Option<Identity>,
    assignments: Vec<RoleAssignment>,
}

impl Evaluator {
    /// Evaluator for `identity`
    ///
    /// When `identity` is the snapshot's own identity, the snapshot's
    /// role-assignment document is used for dashboard checks.
    pub fn new(
        catalog: Arc<Catalog>,
        snapshot: Arc<PermissionSnapshot>,
        identity: Option<Identity>,
    ) -> Self {
        let assignments = match (&identity, snapshot.identity()) {
            (Some(caller), Some(owner)) if caller.id == owner.id => {
                snapshot.role_assignments().to_vec()
            }
            _ => Vec::new(),
        };

        Self {
            catalog,
            snapshot,
            identity,
            assignments,
        }
    }

    /// Evaluator without any loaded state: denies everything
    pub fn detached(catalog: Arc<Catalog>) -> Self {
        Self::new(catalog, Arc::new(PermissionSnapshot::default()), None)
    }

    /// Use `assignments` as the caller's role-assignment document
    pub fn with_role_assignments(mut self, assignments: Vec<RoleAssignment>) -> Self {
        self.assignments = assignments;
        self
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn role_assignments(&self) -> &[RoleAssignment] {
        &self.assignments
    }

    /// Staff record of the caller, matched by email
    pub fn staff_member(&self) -> Option<&StaffMember> {
        let identity = self.identity.as_ref()?;
        self.snapshot.find_by_email(&identity.email)
    }

    fn assigned_definitions(&self) -> impl Iterator<Item = &RoleDefinition> {
        self.staff_member()
            .into_iter()
            .flat_map(|member| member.assigned_roles.iter())
            .filter_map(|role| self.catalog.role(role.as_str()))
    }

    /// Admin identity, or an assigned role carrying the wildcard
    pub fn is_superuser(&self) -> bool {
        if self.identity.as_ref().is_some_and(Identity::is_admin) {
            return true;
        }
        self.assigned_definitions().any(RoleDefinition::is_unrestricted)
    }

    /// Whether the caller holds any of `roles`
    pub fn has_role<R: AsRef<str>>(&self, roles: &[R]) -> bool {
        if self.is_superuser() {
            return true;
        }
        self.staff_member().is_some_and(|member| {
            roles
                .iter()
                .any(|role| member.has_assigned_role(role.as_ref()))
        })
    }

    /// Whether an assigned role grants the coarse `permission`
    pub fn has_permission(&self, permission: &str) -> bool {
        if self.is_superuser() {
            return true;
        }
        self.assigned_definitions().any(|role| role.grants(permission))
    }

    /// Whether the caller holds `category.feature`
    ///
    /// A malformed key is denied unless the caller is a superuser.
    pub fn has_feature_permission(&self, key: &str) -> bool {
        match key.parse::<FeatureKey>() {
            Ok(key) => self.feature_flag(&key),
            Err(e) => {
                debug!("Malformed feature key: {}", e);
                self.is_superuser()
            }
        }
    }

    /// Dashboard access derived from `assignments`
    pub fn dashboard_access(
        &self,
        dashboard: Dashboard,
        assignments: &[RoleAssignment],
    ) -> DashboardAccess {
        DashboardAccess::from(self.dashboard_level(dashboard, assignments))
    }

    pub fn can_access_dashboard(&self, dashboard: Dashboard, assignments: &[RoleAssignment]) -> bool {
        self.dashboard_access(dashboard, assignments).can_view
    }

    pub fn can_edit_in_dashboard(&self, dashboard: Dashboard, assignments: &[RoleAssignment]) -> bool {
        self.dashboard_access(dashboard, assignments).can_edit
    }

    /// The most permissive assignment for the dashboard's required role wins
    fn dashboard_level(&self, dashboard: Dashboard, assignments: &[RoleAssignment]) -> AccessLevel {
        if self.is_superuser() {
            return AccessLevel::Edit;
        }

        let role = required_role(dashboard);
        assignments
            .iter()
            .filter(|a| a.role.as_str() == role)
            .map(|a| a.access)
            .max()
            .unwrap_or(AccessLevel::Unauthorized)
    }
}

impl AccessEvaluator for Evaluator {
    fn access_level(&self, resource: &Resource) -> AccessLevel {
        match resource {
            Resource::Dashboard(dashboard) => self.dashboard_level(*dashboard, &self.assignments),
            Resource::Feature(key) => {
                if self.feature_flag(key) {
                    AccessLevel::Edit
                } else {
                    AccessLevel::Unauthorized
                }
            }
        }
    }

    fn feature_flag(&self, key: &FeatureKey) -> bool {
        if self.is_superuser() {
            return true;
        }
        self.staff_member()
            .is_some_and(|member| member.permissions.is_granted(key))
    }

    fn feature_flag_str(&self, key: &str) -> bool {
        self.has_feature_permission(key)
    }
}
