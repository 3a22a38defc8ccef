// handlers/companies.rs - company provisioning and maintenance

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::{CompanyResponse, CreateCompanyRequest, UpdateCompanyRequest};
use crate::validation::ValidationError;

#[derive(Debug, Deserialize)]
pub struct CompanyQuery {
    pub name: Option<String>,
}

/// POST /companies - Provision a company with its tenant and admin employee
///
/// Expected Input:
/// ```json
/// {
///   "name": "Acme",
///   "industry": "Manufacturing",
///   "country": "Nigeria",
///   "timezone": "Africa/Lagos",
///   "admin_email": "a@acme.com",
///   "admin_name": "Ada",
///   "admin_password": "password123"
/// }
/// ```
///
/// Responds 201 with the company; 409 when the name is taken.
pub async fn create_company(
    State(state): State<AppState>,
    payload: Result<Json<CreateCompanyRequest>, JsonRejection>,
) -> ApiResult<CompanyResponse> {
    let Json(request) = payload?;

    let company = state
        .provisioning
        .create_company(request, Some(state.deadline()))
        .await?;

    Ok(ApiResponse::created(CompanyResponse::from(company))
        .with_message("Company created successfully"))
}

/// GET /companies?name= - Look a company up by its exact name
pub async fn find_company(
    State(state): State<AppState>,
    Query(query): Query<CompanyQuery>,
) -> ApiResult<CompanyResponse> {
    let name = query
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::from(ValidationError::new("name", "Company name is required")))?;

    let company = state.bounded(state.companies.find_by_name(&name)).await?;
    Ok(ApiResponse::success(company.into()))
}

/// GET /companies/:id
pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<CompanyResponse> {
    let company = state.bounded(state.companies.get_company(id)).await?;
    Ok(ApiResponse::success(company.into()))
}

/// PUT /companies/:id - Replace name, industry, country and timezone
pub async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<Json<UpdateCompanyRequest>, JsonRejection>,
) -> ApiResult<CompanyResponse> {
    let Json(request) = payload?;
    let company = state
        .bounded(state.companies.update_company(id, request))
        .await?;
    Ok(ApiResponse::success(company.into()).with_message("Company updated successfully"))
}

/// DELETE /companies/:id - Remove the company and everything in its tenant
pub async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Value> {
    state.bounded(state.companies.delete_company(id)).await?;
    Ok(ApiResponse::success(json!({ "id": id })).with_message("Company deleted successfully"))
}
