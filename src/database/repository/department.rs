use sqlx::PgExecutor;

use crate::database::models::{Department, DepartmentChanges, NewDepartment};

const COLUMNS: &str = "id, tenant_id, name, hod_id, status, created_at, updated_at";

pub async fn insert<'e, E: PgExecutor<'e>>(
    executor: E,
    department: &NewDepartment,
) -> Result<Department, sqlx::Error> {
    let sql = format!(
        "INSERT INTO departments (tenant_id, name, status) VALUES ($1, $2, $3) RETURNING {}",
        COLUMNS
    );
    sqlx::query_as::<_, Department>(&sql)
        .bind(department.tenant_id)
        .bind(&department.name)
        .bind(department.status.as_str())
        .fetch_one(executor)
        .await
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i32,
) -> Result<Option<Department>, sqlx::Error> {
    let sql = format!("SELECT {} FROM departments WHERE id = $1", COLUMNS);
    sqlx::query_as::<_, Department>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn update<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i32,
    changes: &DepartmentChanges,
) -> Result<Option<Department>, sqlx::Error> {
    let sql = format!(
        "UPDATE departments SET name = $2, hod_id = $3, status = $4, updated_at = NOW() \
         WHERE id = $1 RETURNING {}",
        COLUMNS
    );
    sqlx::query_as::<_, Department>(&sql)
        .bind(id)
        .bind(&changes.name)
        .bind(changes.hod_id)
        .bind(changes.status.as_str())
        .fetch_optional(executor)
        .await
}

pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM departments WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
