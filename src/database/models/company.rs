use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub id: i32,
    pub name: String,
    pub industry: String,
    pub country: String,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub industry: String,
    pub country: String,
    pub timezone: String,
}

/// Full replacement of a company's mutable fields
#[derive(Debug, Clone)]
pub struct CompanyChanges {
    pub name: String,
    pub industry: String,
    pub country: String,
    pub timezone: String,
}
