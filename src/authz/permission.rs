use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single granted capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewDashboard,
    EditDashboard,
    DeleteDashboard,
    ViewDatasource,
    EditDatasource,
    DeleteDatasource,
    ViewDataset,
    EditDataset,
    DeleteDataset,
    ViewChart,
    EditChart,
    DeleteChart,
    ManageUsers,
    ViewSettings,
    EditSettings,
}

impl Permission {
    pub const ALL: [Permission; 15] = [
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

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewDashboard => "view_dashboard",
            Permission::EditDashboard => "edit_dashboard",
            Permission::DeleteDashboard => "delete_dashboard",
            Permission::ViewDatasource => "view_datasource",
            Permission::EditDatasource => "edit_datasource",
            Permission::DeleteDatasource => "delete_datasource",
            Permission::ViewDataset => "view_dataset",
            Permission::EditDataset => "edit_dataset",
            Permission::DeleteDataset => "delete_dataset",
            Permission::ViewChart => "view_chart",
            Permission::EditChart => "edit_chart",
            Permission::DeleteChart => "delete_chart",
            Permission::ManageUsers => "manage_users",
            Permission::ViewSettings => "view_settings",
            Permission::EditSettings => "edit_settings",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .find(|perm| perm.as_str() == value)
            .copied()
            .ok_or_else(|| format!("unknown permission: {value}"))
    }
}
