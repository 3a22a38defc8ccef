use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::DepartmentStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Department {
    pub id: i32,
    pub tenant_id: i32,
    pub name: String,
    pub hod_id: Option<i32>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDepartment {
    pub tenant_id: i32,
    pub name: String,
    pub status: DepartmentStatus,
}

#[derive(Debug, Clone)]
pub struct DepartmentChanges {
    pub name: String,
    pub hod_id: Option<i32>,
    pub status: DepartmentStatus,
}
