//! Access layer models

pub mod dashboard;
pub mod feature;
pub mod identity;
pub mod role;
pub mod staff;

// Re-export for convenience
pub use dashboard::Dashboard;
pub use feature::{FeatureKey, FeatureKeyError, FeaturePermissions};
pub use identity::Identity;
pub use role::{
    ADMIN_ROLE, AccessLevel, DashboardAccess, RoleAssignment, RoleDefinition, RoleKey,
    WILDCARD_PERMISSION,
};
pub use staff::{NewStaffMember, StaffId, StaffMember, StaffStatus};
