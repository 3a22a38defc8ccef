// handlers/employees.rs - tenant-scoped employee management (Super Admin only)

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::types::{AssignRoleRequest, CreateEmployeeRequest, EmployeeResponse};

/// POST /api/employees - Onboard an employee into the caller's tenant
pub async fn create_employee(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateEmployeeRequest>, JsonRejection>,
) -> ApiResult<EmployeeResponse> {
    user.require_super_admin()?;
    let Json(request) = payload?;

    let (employee, role) = state
        .bounded(state.employees.create_employee(user.tenant_id, request))
        .await?;

    Ok(ApiResponse::created(EmployeeResponse::new(&employee, role.name))
        .with_message("Employee created successfully"))
}

/// PUT /api/employees/:id/role - Replace an employee's role
pub async fn assign_role(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(employee_id): Path<i32>,
    payload: Result<Json<AssignRoleRequest>, JsonRejection>,
) -> ApiResult<EmployeeResponse> {
    user.require_super_admin()?;
    let Json(request) = payload?;

    let (employee, role) = state
        .bounded(
            state
                .employees
                .assign_role(user.tenant_id, employee_id, request.role_id),
        )
        .await?;

    Ok(ApiResponse::success(EmployeeResponse::new(&employee, role.name))
        .with_message("Role assigned successfully"))
}
