use sqlx::PgExecutor;

use crate::database::models::{NewRole, Role};

const COLUMNS: &str = "id, tenant_id, name, description, created_at, updated_at";

pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, role: &NewRole) -> Result<Role, sqlx::Error> {
    let sql = format!(
        "INSERT INTO roles (tenant_id, name, description) VALUES ($1, $2, $3) RETURNING {}",
        COLUMNS
    );
    sqlx::query_as::<_, Role>(&sql)
        .bind(role.tenant_id)
        .bind(&role.name)
        .bind(&role.description)
        .fetch_one(executor)
        .await
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i32,
) -> Result<Option<Role>, sqlx::Error> {
    let sql = format!("SELECT {} FROM roles WHERE id = $1", COLUMNS);
    sqlx::query_as::<_, Role>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_name<'e, E: PgExecutor<'e>>(
    executor: E,
    tenant_id: i32,
    name: &str,
) -> Result<Option<Role>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM roles WHERE tenant_id = $1 AND name = $2",
        COLUMNS
    );
    sqlx::query_as::<_, Role>(&sql)
        .bind(tenant_id)
        .bind(name)
        .fetch_optional(executor)
        .await
}

pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM roles WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
