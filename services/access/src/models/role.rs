//! Role catalog entries and coarse role assignments

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;

/// Role key that overrides every check
pub const ADMIN_ROLE: &str = "admin";

/// Permission entry granting every coarse permission
pub const WILDCARD_PERMISSION: &str = "*";

/// Key of a role in the catalog, e.g. `librarian`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleKey(String);

impl RoleKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoleKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for RoleKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl Borrow<str> for RoleKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static catalog entry describing a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub key: RoleKey,
    pub name: String,
    pub description: String,
    /// Coarse permission strings, or `*` for all of them
    pub permissions: Vec<String>,
    pub color: String,
    pub icon: String,
}

impl RoleDefinition {
    /// Whether the role carries the wildcard permission
    pub fn is_unrestricted(&self) -> bool {
        self.permissions.iter().any(|p| p == WILDCARD_PERMISSION)
    }

    /// Whether the role grants `permission`, directly or via the wildcard
    pub fn grants(&self, permission: &str) -> bool {
        self.permissions
            .iter()
            .any(|p| p == WILDCARD_PERMISSION || p == permission)
    }
}

/// Access level of a role assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum AccessLevel {
    #[default]
    Unauthorized,
    View,
    Edit,
}

impl AccessLevel {
    /// Wire representation used by the permissions backend
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Unauthorized => "Unauthorized",
            AccessLevel::View => "View Access",
            AccessLevel::Edit => "Edit Access",
        }
    }

    /// Parse a wire string; anything unrecognised is `Unauthorized`
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim() {
            "Edit Access" => AccessLevel::Edit,
            "View Access" => AccessLevel::View,
            _ => AccessLevel::Unauthorized,
        }
    }

    pub fn can_view(&self) -> bool {
        *self >= AccessLevel::View
    }

    pub fn can_edit(&self) -> bool {
        *self == AccessLevel::Edit
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AccessLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AccessLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(AccessLevel::parse_lenient(&value))
    }
}

/// One entry of a staff member's permissions document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role: RoleKey,
    pub access: AccessLevel,
}

impl RoleAssignment {
    pub fn new(role: impl Into<RoleKey>, access: AccessLevel) -> Self {
        Self {
            role: role.into(),
            access,
        }
    }
}

/// View/edit capability on one dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAccess {
    pub can_view: bool,
    pub can_edit: bool,
}

impl DashboardAccess {
    pub const FULL: DashboardAccess = DashboardAccess {
        can_view: true,
        can_edit: true,
    };
}

impl From<AccessLevel> for DashboardAccess {
    fn from(level: AccessLevel) -> Self {
        Self {
            can_view: level.can_view(),
            can_edit: level.can_edit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_level_wire_format() {
        let assignments: Vec<RoleAssignment> = serde_json::from_str(
            r#"[{"role":"librarian","access":"Edit Access"},
                {"role":"counselor","access":"View Access"},
                {"role":"parent","access":"Read Only"}]"#,
        )
        .expect("assignments should parse");

        assert_eq!(assignments[0].access, AccessLevel::Edit);
        assert_eq!(assignments[1].access, AccessLevel::View);
        assert_eq!(assignments[2].access, AccessLevel::Unauthorized);

        let json = serde_json::to_string(&assignments[1]).expect("assignment should serialize");
        assert_eq!(json, r#"{"role":"counselor","access":"View Access"}"#);
    }

    #[test]
    fn test_dashboard_access_from_level() {
        assert_eq!(
            DashboardAccess::from(AccessLevel::Unauthorized),
            DashboardAccess::default()
        );
        assert_eq!(
            DashboardAccess::from(AccessLevel::View),
            DashboardAccess {
                can_view: true,
                can_edit: false
            }
        );
        assert_eq!(DashboardAccess::from(AccessLevel::Edit), DashboardAccess::FULL);
    }

    #[test]
    fn test_wildcard_grants_everything() {
        let role = RoleDefinition {
            key: RoleKey::from("admin"),
            name: "Administrator".into(),
            description: String::new(),
            permissions: vec![WILDCARD_PERMISSION.into()],
            color: "red".into(),
            icon: "shield".into(),
        };
        assert!(role.is_unrestricted());
        assert!(role.grants("anything_at_all"));
    }
}
