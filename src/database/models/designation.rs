use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Designation {
    pub id: i32,
    pub tenant_id: i32,
    pub name: String,
    /// Ordinal seniority, 1 being the most senior
    pub level: i32,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDesignation {
    pub tenant_id: i32,
    pub name: String,
    pub level: i32,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct DesignationChanges {
    pub name: String,
    pub level: i32,
    pub description: String,
}
