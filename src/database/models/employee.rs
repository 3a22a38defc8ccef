use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::EmployeeStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub id: i32,
    pub tenant_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub department_id: i32,
    pub designation_id: i32,
    pub manager_id: Option<i32>,
    /// Attached after creation via a separate role assignment
    pub role_id: Option<i32>,
    pub status: String,
    pub hire_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub tenant_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub department_id: i32,
    pub designation_id: i32,
    pub manager_id: Option<i32>,
    pub status: EmployeeStatus,
    pub hire_date: Option<NaiveDate>,
}

/// Login projection: an employee joined with the name of its assigned role
#[derive(Debug, Clone, FromRow)]
pub struct EmployeeCredentials {
    pub employee_id: i32,
    pub tenant_id: i32,
    pub email: String,
    pub password_hash: String,
    pub role_name: Option<String>,
}
