//! User Model

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Staff role (RBAC 角色)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Waiter,
    Chef,
    Trainee,
}

/// Dashboard shown after login
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dashboard {
    SuperAdmin,
    Admin,
    Waiter,
    Chef,
    Trainee,
}

/// Write operations gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ManageTables,
    ManageUsers,
    ManageReservations,
    UpdateOrders,
}

impl Role {
    pub fn dashboard(self) -> Dashboard {
        match self {
            Role::SuperAdmin => Dashboard::SuperAdmin,
            Role::Admin => Dashboard::Admin,
            Role::Waiter => Dashboard::Waiter,
            Role::Chef => Dashboard::Chef,
            Role::Trainee => Dashboard::Trainee,
        }
    }

    fn is_admin(self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }

    /// Trainees are read-only
    pub fn allows(self, capability: Capability) -> bool {
        match capability {
            Capability::ManageTables | Capability::ManageUsers => self.is_admin(),
            Capability::ManageReservations => self.is_admin() || self == Role::Waiter,
            Capability::UpdateOrders => {
                self.is_admin() || matches!(self, Role::Waiter | Role::Chef)
            }
        }
    }

    /// Super admins assign any role; admins only staff roles.
    pub fn can_assign(self, target: Role) -> bool {
        match self {
            Role::SuperAdmin => true,
            Role::Admin => matches!(target, Role::Waiter | Role::Chef | Role::Trainee),
            _ => false,
        }
    }
}

/// Account status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

/// User entity (without password)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub status: UserStatus,
}

/// Create user payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Update user payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// `PUT /users/:id/role` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRoleUpdate {
    pub role: Role,
}

/// `PUT /users/:id/status` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatusUpdate {
    pub status: UserStatus,
}
