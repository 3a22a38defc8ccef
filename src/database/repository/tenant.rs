use sqlx::PgExecutor;

use crate::database::models::{NewTenant, Tenant};

const COLUMNS: &str = "id, company_id, super_admin_id, created_at, updated_at";

pub async fn insert<'e, E: PgExecutor<'e>>(
    executor: E,
    tenant: &NewTenant,
) -> Result<Tenant, sqlx::Error> {
    let sql = format!(
        "INSERT INTO tenants (company_id) VALUES ($1) RETURNING {}",
        COLUMNS
    );
    sqlx::query_as::<_, Tenant>(&sql)
        .bind(tenant.company_id)
        .fetch_one(executor)
        .await
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i32,
) -> Result<Option<Tenant>, sqlx::Error> {
    let sql = format!("SELECT {} FROM tenants WHERE id = $1", COLUMNS);
    sqlx::query_as::<_, Tenant>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_company<'e, E: PgExecutor<'e>>(
    executor: E,
    company_id: i32,
) -> Result<Option<Tenant>, sqlx::Error> {
    let sql = format!("SELECT {} FROM tenants WHERE company_id = $1", COLUMNS);
    sqlx::query_as::<_, Tenant>(&sql)
        .bind(company_id)
        .fetch_optional(executor)
        .await
}

/// Only links employees that belong to the tenant; no row comes back otherwise.
pub async fn set_super_admin<'e, E: PgExecutor<'e>>(
    executor: E,
    tenant_id: i32,
    employee_id: i32,
) -> Result<Option<Tenant>, sqlx::Error> {
    let sql = format!(
        "UPDATE tenants SET super_admin_id = $2, updated_at = NOW() \
         WHERE id = $1 AND EXISTS (SELECT 1 FROM employees WHERE id = $2 AND tenant_id = $1) \
         RETURNING {}",
        COLUMNS
    );
    sqlx::query_as::<_, Tenant>(&sql)
        .bind(tenant_id)
        .bind(employee_id)
        .fetch_optional(executor)
        .await
}

pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tenants WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
