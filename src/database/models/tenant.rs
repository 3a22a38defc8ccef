use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Organizational namespace owned by exactly one company.
///
/// `super_admin_id` stays empty until the company's admin employee exists,
/// and once set always names an employee of this tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: i32,
    pub company_id: i32,
    pub super_admin_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTenant {
    pub company_id: i32,
}
