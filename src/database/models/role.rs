use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Name of the role created with every tenant
pub const SUPER_ADMIN_ROLE: &str = "Super Admin";

/// Role label reported for employees without an assigned role
pub const DEFAULT_ROLE_LABEL: &str = "Employee";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i32,
    pub tenant_id: i32,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRole {
    pub tenant_id: i32,
    pub name: String,
    pub description: String,
}
