use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Permission;

/// Role tier assigned to a user. Users whose record carries no role are
/// treated as the lowest tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Analyst,
    #[default]
    User,
}

const ADMIN_GRANTS: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::EditDashboard,
    Permission::DeleteDashboard,
    Permission::ViewDatasource,
    Permission::EditDatasource,
    Permission::DeleteDatasource,
    Permission::ViewDataset,
    Permission::EditDataset,
    Permission::DeleteDataset,
    Permission::ViewChart,
    Permission::EditChart,
    Permission::DeleteChart,
    Permission::ManageUsers,
    Permission::ViewSettings,
    Permission::EditSettings,
];

const MANAGER_GRANTS: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::EditDashboard,
    Permission::ViewDatasource,
    Permission::EditDatasource,
    Permission::ViewDataset,
    Permission::EditDataset,
    Permission::ViewChart,
    Permission::EditChart,
    Permission::ViewSettings,
];

const ANALYST_GRANTS: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::ViewDatasource,
    Permission::EditDatasource,
    Permission::ViewDataset,
    Permission::EditDataset,
    Permission::ViewChart,
    Permission::EditChart,
];

const USER_GRANTS: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::ViewDatasource,
    Permission::ViewDataset,
    Permission::ViewChart,
];

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Manager, Role::Analyst, Role::User];

    /// The static grant table for this tier.
    pub fn grants(&self) -> &'static [Permission] {
        match self {
            Role::Admin => ADMIN_GRANTS,
            Role::Manager => MANAGER_GRANTS,
            Role::Analyst => ANALYST_GRANTS,
            Role::User => USER_GRANTS,
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.grants().contains(&permission)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Analyst => "analyst",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "analyst" => Ok(Role::Analyst),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role: {other}")),
        }
    }
}
