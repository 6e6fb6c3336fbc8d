//! Role-specific top-level surfaces

use serde::{Deserialize, Serialize};
use std::fmt;

/// A dashboard gated by the coarse role-assignment scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dashboard {
    Library,
    Counselor,
    PhysicalEducation,
    Events,
    Transport,
    SoftSkills,
    Parent,
    Admin,
}

impl Dashboard {
    pub const ALL: [Dashboard; 8] = [
        Dashboard::Library,
        Dashboard::Counselor,
        Dashboard::PhysicalEducation,
        Dashboard::Events,
        Dashboard::Transport,
        Dashboard::SoftSkills,
        Dashboard::Parent,
        Dashboard::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dashboard::Library => "library",
            Dashboard::Counselor => "counselor",
            Dashboard::PhysicalEducation => "physical_education",
            Dashboard::Events => "events",
            Dashboard::Transport => "transport",
            Dashboard::SoftSkills => "soft_skills",
            Dashboard::Parent => "parent",
            Dashboard::Admin => "admin",
        }
    }
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
