/// Shared types used across the codebase

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::database::models::{Company, Employee};

/// Employment status stored on `employees.status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
    Terminated,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::Inactive => "inactive",
            EmployeeStatus::Terminated => "terminated",
        }
    }
}

/// Department status stored on `departments.status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DepartmentStatus {
    #[default]
    Active,
    Inactive,
}

impl DepartmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepartmentStatus::Active => "active",
            DepartmentStatus::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
    #[serde(default)]
    pub industry: String,
    pub country: String,
    pub timezone: String,
    pub admin_email: String,
    pub admin_name: String,
    pub admin_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCompanyRequest {
    pub name: String,
    #[serde(default)]
    pub industry: String,
    pub country: String,
    pub timezone: String,
}

/// Public projection of a company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyResponse {
    pub id: i32,
    pub name: String,
    pub industry: String,
    pub country: String,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Company> for CompanyResponse {
    fn from(company: Company) -> Self {
        Self {
            id: company.id,
            name: company.name,
            industry: company.industry,
            country: company.country,
            timezone: company.timezone,
            created_at: company.created_at,
            updated_at: company.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEmployeeRequest {
    pub email: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
    pub department_id: i32,
    pub designation_id: i32,
    #[serde(default)]
    pub manager_id: Option<i32>,
    pub role_id: i32,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignRoleRequest {
    pub role_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeResponse {
    pub id: i32,
    pub tenant_id: i32,
    pub email: String,
    pub name: String,
    pub role: String,
    pub status: String,
}

impl EmployeeResponse {
    pub fn new(employee: &Employee, role: impl Into<String>) -> Self {
        Self {
            id: employee.id,
            tenant_id: employee.tenant_id,
            email: employee.email.clone(),
            name: employee.full_name(),
            role: role.into(),
            status: employee.status.clone(),
        }
    }
}
