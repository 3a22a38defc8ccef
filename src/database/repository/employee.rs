use sqlx::PgExecutor;

use crate::database::models::{Employee, EmployeeCredentials, NewEmployee};

const COLUMNS: &str = "id, tenant_id, first_name, last_name, email, phone, password_hash, \
    department_id, designation_id, manager_id, role_id, status, hire_date, created_at, updated_at";

pub async fn insert<'e, E: PgExecutor<'e>>(
    executor: E,
    employee: &NewEmployee,
) -> Result<Employee, sqlx::Error> {
    let sql = format!(
        "INSERT INTO employees (tenant_id, first_name, last_name, email, phone, password_hash, \
         department_id, designation_id, manager_id, status, hire_date) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {}",
        COLUMNS
    );
    sqlx::query_as::<_, Employee>(&sql)
        .bind(employee.tenant_id)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(&employee.password_hash)
        .bind(employee.department_id)
        .bind(employee.designation_id)
        .bind(employee.manager_id)
        .bind(employee.status.as_str())
        .bind(employee.hire_date)
        .fetch_one(executor)
        .await
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i32,
) -> Result<Option<Employee>, sqlx::Error> {
    let sql = format!("SELECT {} FROM employees WHERE id = $1", COLUMNS);
    sqlx::query_as::<_, Employee>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_email<'e, E: PgExecutor<'e>>(
    executor: E,
    email: &str,
) -> Result<Option<Employee>, sqlx::Error> {
    let sql = format!("SELECT {} FROM employees WHERE email = $1", COLUMNS);
    sqlx::query_as::<_, Employee>(&sql)
        .bind(email)
        .fetch_optional(executor)
        .await
}

pub async fn find_credentials<'e, E: PgExecutor<'e>>(
    executor: E,
    email: &str,
) -> Result<Option<EmployeeCredentials>, sqlx::Error> {
    sqlx::query_as::<_, EmployeeCredentials>(
        "SELECT e.id AS employee_id, e.tenant_id, e.email, e.password_hash, r.name AS role_name \
         FROM employees e LEFT JOIN roles r ON r.id = e.role_id \
         WHERE e.email = $1",
    )
    .bind(email)
    .fetch_optional(executor)
    .await
}

/// The role must belong to the employee's tenant; no row comes back otherwise.
pub async fn assign_role<'e, E: PgExecutor<'e>>(
    executor: E,
    employee_id: i32,
    role_id: i32,
) -> Result<Option<Employee>, sqlx::Error> {
    let sql = format!(
        "UPDATE employees SET role_id = $2, updated_at = NOW() \
         WHERE id = $1 AND EXISTS \
         (SELECT 1 FROM roles WHERE roles.id = $2 AND roles.tenant_id = employees.tenant_id) \
         RETURNING {}",
        COLUMNS
    );
    sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .bind(role_id)
        .fetch_optional(executor)
        .await
}

pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM employees WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
