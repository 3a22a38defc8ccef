use sqlx::PgExecutor;

use crate::database::models::{Company, CompanyChanges, NewCompany};

const COLUMNS: &str = "id, name, industry, country, timezone, created_at, updated_at";

pub async fn insert<'e, E: PgExecutor<'e>>(
    executor: E,
    company: &NewCompany,
) -> Result<Company, sqlx::Error> {
    let sql = format!(
        "INSERT INTO companies (name, industry, country, timezone) \
         VALUES ($1, $2, $3, $4) RETURNING {}",
        COLUMNS
    );
    sqlx::query_as::<_, Company>(&sql)
        .bind(&company.name)
        .bind(&company.industry)
        .bind(&company.country)
        .bind(&company.timezone)
        .fetch_one(executor)
        .await
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i32,
) -> Result<Option<Company>, sqlx::Error> {
    let sql = format!("SELECT {} FROM companies WHERE id = $1", COLUMNS);
    sqlx::query_as::<_, Company>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_name<'e, E: PgExecutor<'e>>(
    executor: E,
    name: &str,
) -> Result<Option<Company>, sqlx::Error> {
    let sql = format!("SELECT {} FROM companies WHERE name = $1", COLUMNS);
    sqlx::query_as::<_, Company>(&sql)
        .bind(name)
        .fetch_optional(executor)
        .await
}

pub async fn update<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i32,
    changes: &CompanyChanges,
) -> Result<Option<Company>, sqlx::Error> {
    let sql = format!(
        "UPDATE companies SET name = $2, industry = $3, country = $4, timezone = $5, \
         updated_at = NOW() WHERE id = $1 RETURNING {}",
        COLUMNS
    );
    sqlx::query_as::<_, Company>(&sql)
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.industry)
        .bind(&changes.country)
        .bind(&changes.timezone)
        .fetch_optional(executor)
        .await
}

pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM companies WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
