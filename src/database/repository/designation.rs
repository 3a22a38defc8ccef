use sqlx::PgExecutor;

use crate::database::models::{Designation, DesignationChanges, NewDesignation};

const COLUMNS: &str = "id, tenant_id, name, level, description, created_at, updated_at";

pub async fn insert<'e, E: PgExecutor<'e>>(
    executor: E,
    designation: &NewDesignation,
) -> Result<Designation, sqlx::Error> {
    let sql = format!(
        "INSERT INTO designations (tenant_id, name, level, description) \
         VALUES ($1, $2, $3, $4) RETURNING {}",
        COLUMNS
    );
    sqlx::query_as::<_, Designation>(&sql)
        .bind(designation.tenant_id)
        .bind(&designation.name)
        .bind(designation.level)
        .bind(&designation.description)
        .fetch_one(executor)
        .await
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i32,
) -> Result<Option<Designation>, sqlx::Error> {
    let sql = format!("SELECT {} FROM designations WHERE id = $1", COLUMNS);
    sqlx::query_as::<_, Designation>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn update<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i32,
    changes: &DesignationChanges,
) -> Result<Option<Designation>, sqlx::Error> {
    let sql = format!(
        "UPDATE designations SET name = $2, level = $3, description = $4, updated_at = NOW() \
         WHERE id = $1 RETURNING {}",
        COLUMNS
    );
    sqlx::query_as::<_, Designation>(&sql)
        .bind(id)
        .bind(&changes.name)
        .bind(changes.level)
        .bind(&changes.description)
        .fetch_optional(executor)
        .await
}

pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM designations WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
