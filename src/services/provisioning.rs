//! Company provisioning: one request creates a company together with its
//! tenant, default role, department, designation and admin employee.
//!
//! All writes share a single unit of work, so a failure at any step (or an
//! expired deadline) leaves nothing behind. Errors name the step that failed.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::auth::{CredentialHasher, PasswordError};
use crate::database::models::{
    Company, NewCompany, NewDepartment, NewDesignation, NewEmployee, NewRole, NewTenant,
    SUPER_ADMIN_ROLE,
};
use crate::database::{StoreError, TransactionalStore, UnitOfWork};
use crate::types::{CreateCompanyRequest, DepartmentStatus, EmployeeStatus};
use crate::validation::{normalize_email, validate_create_company, ValidationError};

pub const SUPER_ADMIN_DESCRIPTION: &str = "Company owner with full access";
pub const DEFAULT_DEPARTMENT: &str = "General";
pub const OWNER_DESIGNATION: &str = "Owner";
pub const OWNER_DESIGNATION_DESCRIPTION: &str = "Company owner";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningStep {
    HashPassword,
    Begin,
    CheckName,
    CreateCompany,
    CreateTenant,
    CreateRole,
    CreateDepartment,
    CreateDesignation,
    CreateAdmin,
    AssignRole,
    LinkSuperAdmin,
    Commit,
}

impl ProvisioningStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisioningStep::HashPassword => "hash_password",
            ProvisioningStep::Begin => "begin",
            ProvisioningStep::CheckName => "check_name",
            ProvisioningStep::CreateCompany => "create_company",
            ProvisioningStep::CreateTenant => "create_tenant",
            ProvisioningStep::CreateRole => "create_role",
            ProvisioningStep::CreateDepartment => "create_department",
            ProvisioningStep::CreateDesignation => "create_designation",
            ProvisioningStep::CreateAdmin => "create_admin",
            ProvisioningStep::AssignRole => "assign_role",
            ProvisioningStep::LinkSuperAdmin => "link_super_admin",
            ProvisioningStep::Commit => "commit",
        }
    }
}

impl fmt::Display for ProvisioningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Company name already exists: {0}")]
    NameTaken(String),

    #[error("Provisioning failed at {step}: {source}")]
    StepFailed {
        step: ProvisioningStep,
        #[source]
        source: StoreError,
    },

    #[error("Password hashing failed: {0}")]
    Hashing(#[source] PasswordError),

    #[error("Provisioning deadline exceeded at {step}")]
    DeadlineExceeded { step: ProvisioningStep },
}

impl ProvisioningError {
    /// The step that failed; `None` for rejected input
    pub fn step(&self) -> Option<ProvisioningStep> {
        match self {
            ProvisioningError::Validation(_) => None,
            ProvisioningError::NameTaken(_) => Some(ProvisioningStep::CheckName),
            ProvisioningError::StepFailed { step, .. } => Some(*step),
            ProvisioningError::Hashing(_) => Some(ProvisioningStep::HashPassword),
            ProvisioningError::DeadlineExceeded { step } => Some(*step),
        }
    }

    /// Duplicate company name, whether caught up front or by the unique index
    pub fn is_conflict(&self) -> bool {
        match self {
            ProvisioningError::NameTaken(_) => true,
            ProvisioningError::StepFailed {
                step: ProvisioningStep::CheckName | ProvisioningStep::CreateCompany,
                source,
            } => source.is_conflict(),
            _ => false,
        }
    }

    /// The admin email already belongs to an employee
    pub fn is_email_taken(&self) -> bool {
        matches!(
            self,
            ProvisioningError::StepFailed {
                step: ProvisioningStep::CreateAdmin,
                source,
            } if source.is_conflict()
        )
    }
}

async fn attempt<T>(
    current: &mut ProvisioningStep,
    step: ProvisioningStep,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, ProvisioningError> {
    *current = step;
    call.await
        .map_err(|source| ProvisioningError::StepFailed { step, source })
}

pub struct ProvisioningService {
    store: Arc<dyn TransactionalStore>,
    hasher: CredentialHasher,
}

impl ProvisioningService {
    pub fn new(store: Arc<dyn TransactionalStore>, hasher: CredentialHasher) -> Self {
        Self { store, hasher }
    }

    /// Provision a company and its tenant, all or nothing.
    ///
    /// When `deadline` passes the in-flight call is abandoned and the
    /// transaction rolled back.
    pub async fn create_company(
        &self,
        request: CreateCompanyRequest,
        deadline: Option<Instant>,
    ) -> Result<Company, ProvisioningError> {
        validate_create_company(&request)?;

        let mut step = ProvisioningStep::HashPassword;
        let work = self.provision(&request, &mut step);
        let outcome = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, work).await.ok(),
            None => Some(work.await),
        };

        match outcome {
            Some(result) => result,
            None => {
                warn!(step = %step, "Provisioning deadline exceeded, rolled back");
                Err(ProvisioningError::DeadlineExceeded { step })
            }
        }
    }

    async fn provision(
        &self,
        request: &CreateCompanyRequest,
        step: &mut ProvisioningStep,
    ) -> Result<Company, ProvisioningError> {
        // Hash outside the transaction so the slow part holds no locks
        *step = ProvisioningStep::HashPassword;
        let password_hash = self
            .hasher
            .hash_blocking(request.admin_password.clone())
            .await
            .map_err(ProvisioningError::Hashing)?;

        let uow = attempt(step, ProvisioningStep::Begin, self.store.begin()).await?;

        match Self::run_steps(uow.as_ref(), request, password_hash, step).await {
            Ok(company) => {
                attempt(step, ProvisioningStep::Commit, uow.commit()).await?;
                Ok(company)
            }
            Err(err) => {
                warn!(step = %step, error = %err, "Provisioning failed, rolling back");
                if let Err(rollback_err) = uow.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn run_steps(
        uow: &dyn UnitOfWork,
        request: &CreateCompanyRequest,
        password_hash: String,
        step: &mut ProvisioningStep,
    ) -> Result<Company, ProvisioningError> {
        let name = request.name.trim();

        *step = ProvisioningStep::CheckName;
        match uow.company_by_name(name).await {
            Ok(_) => return Err(ProvisioningError::NameTaken(name.to_string())),
            Err(StoreError::NotFound(_)) => {}
            Err(source) => {
                return Err(ProvisioningError::StepFailed {
                    step: ProvisioningStep::CheckName,
                    source,
                })
            }
        }

        let company = attempt(
            step,
            ProvisioningStep::CreateCompany,
            uow.create_company(NewCompany {
                name: name.to_string(),
                industry: request.industry.trim().to_string(),
                country: request.country.trim().to_string(),
                timezone: request.timezone.trim().to_string(),
            }),
        )
        .await?;

        let tenant = attempt(
            step,
            ProvisioningStep::CreateTenant,
            uow.create_tenant(NewTenant {
                company_id: company.id,
            }),
        )
        .await?;

        attempt(
            step,
            ProvisioningStep::CreateRole,
            uow.create_role(NewRole {
                tenant_id: tenant.id,
                name: SUPER_ADMIN_ROLE.to_string(),
                description: SUPER_ADMIN_DESCRIPTION.to_string(),
            }),
        )
        .await?;

        let department = attempt(
            step,
            ProvisioningStep::CreateDepartment,
            uow.create_department(NewDepartment {
                tenant_id: tenant.id,
                name: DEFAULT_DEPARTMENT.to_string(),
                status: DepartmentStatus::Active,
            }),
        )
        .await?;

        let designation = attempt(
            step,
            ProvisioningStep::CreateDesignation,
            uow.create_designation(NewDesignation {
                tenant_id: tenant.id,
                name: OWNER_DESIGNATION.to_string(),
                level: 1,
                description: OWNER_DESIGNATION_DESCRIPTION.to_string(),
            }),
        )
        .await?;

        let admin = attempt(
            step,
            ProvisioningStep::CreateAdmin,
            uow.create_employee(NewEmployee {
                tenant_id: tenant.id,
                first_name: request.admin_name.trim().to_string(),
                last_name: String::new(),
                email: normalize_email(&request.admin_email),
                phone: None,
                password_hash,
                department_id: department.id,
                designation_id: designation.id,
                manager_id: None,
                status: EmployeeStatus::Active,
                hire_date: Some(Utc::now().date_naive()),
            }),
        )
        .await?;

        let role = attempt(
            step,
            ProvisioningStep::AssignRole,
            uow.role_by_name(tenant.id, SUPER_ADMIN_ROLE),
        )
        .await?;
        attempt(
            step,
            ProvisioningStep::AssignRole,
            uow.assign_role(admin.id, role.id),
        )
        .await?;

        attempt(
            step,
            ProvisioningStep::LinkSuperAdmin,
            uow.set_super_admin(tenant.id, admin.id),
        )
        .await?;

        info!(
            company_id = company.id,
            tenant_id = tenant.id,
            admin_id = admin.id,
            "Provisioned company"
        );
        Ok(company)
    }
}
