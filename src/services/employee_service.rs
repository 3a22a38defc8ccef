use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::auth::{CredentialHasher, PasswordError};
use crate::database::models::{Employee, NewEmployee, Role};
use crate::database::{StoreError, TransactionalStore};
use crate::types::{CreateEmployeeRequest, EmployeeStatus};
use crate::validation::{normalize_email, validate_create_employee, ValidationError};

#[derive(Debug, Error)]
pub enum EmployeeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Email already in use: {0}")]
    EmailTaken(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Storage(StoreError),

    #[error(transparent)]
    Hashing(#[from] PasswordError),
}

impl From<StoreError> for EmployeeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => EmployeeError::NotFound(entity),
            other => EmployeeError::Storage(other),
        }
    }
}

/// A referenced row that is missing or owned by another tenant is invalid input;
/// any other storage failure passes through untouched.
fn in_tenant<T>(
    found: Result<T, StoreError>,
    owner: impl Fn(&T) -> i32,
    tenant_id: i32,
    invalid: ValidationError,
) -> Result<T, EmployeeError> {
    match found {
        Ok(row) if owner(&row) == tenant_id => Ok(row),
        Ok(_) | Err(StoreError::NotFound(_)) => Err(invalid.into()),
        Err(err) => Err(EmployeeError::Storage(err)),
    }
}

/// Employee onboarding and role changes, always scoped to one tenant
pub struct EmployeeService {
    store: Arc<dyn TransactionalStore>,
    hasher: CredentialHasher,
}

impl EmployeeService {
    pub fn new(store: Arc<dyn TransactionalStore>, hasher: CredentialHasher) -> Self {
        Self { store, hasher }
    }

    /// Create an employee in `tenant_id`, then attach its role as a second write.
    ///
    /// Both writes share one unit of work.
    pub async fn create_employee(
        &self,
        tenant_id: i32,
        request: CreateEmployeeRequest,
    ) -> Result<(Employee, Role), EmployeeError> {
        validate_create_employee(&request)?;
        let email = normalize_email(&request.email);

        let role = in_tenant(
            self.store.role_by_id(request.role_id).await,
            |r| r.tenant_id,
            tenant_id,
            ValidationError::new("role_id", "Role does not exist"),
        )?;
        in_tenant(
            self.store.department_by_id(request.department_id).await,
            |d| d.tenant_id,
            tenant_id,
            ValidationError::new("department_id", "Department does not exist"),
        )?;
        in_tenant(
            self.store.designation_by_id(request.designation_id).await,
            |d| d.tenant_id,
            tenant_id,
            ValidationError::new("designation_id", "Designation does not exist"),
        )?;
        if let Some(manager_id) = request.manager_id {
            in_tenant(
                self.store.employee_by_id(manager_id).await,
                |m| m.tenant_id,
                tenant_id,
                ValidationError::new("manager_id", "Manager does not exist"),
            )?;
        }

        let password_hash = self.hasher.hash_blocking(request.password).await?;

        let uow = self.store.begin().await?;
        let created = match uow
            .create_employee(NewEmployee {
                tenant_id,
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                email: email.clone(),
                phone: request.phone,
                password_hash,
                department_id: request.department_id,
                designation_id: request.designation_id,
                manager_id: request.manager_id,
                status: EmployeeStatus::Active,
                hire_date: request.hire_date.or_else(|| Some(Utc::now().date_naive())),
            })
            .await
        {
            Ok(employee) => employee,
            Err(StoreError::Conflict(_)) => return Err(EmployeeError::EmailTaken(email)),
            Err(err) => return Err(err.into()),
        };
        let employee = uow.assign_role(created.id, role.id).await?;
        uow.commit().await?;

        info!(
            employee_id = employee.id,
            tenant_id,
            role_id = role.id,
            "Created employee"
        );
        Ok((employee, role))
    }

    /// Attach `role_id` to an employee; both must belong to `tenant_id`
    pub async fn assign_role(
        &self,
        tenant_id: i32,
        employee_id: i32,
        role_id: i32,
    ) -> Result<(Employee, Role), EmployeeError> {
        let employee = self.store.employee_by_id(employee_id).await?;
        if employee.tenant_id != tenant_id {
            return Err(EmployeeError::NotFound("employee"));
        }
        let role = self.store.role_by_id(role_id).await?;
        if role.tenant_id != tenant_id {
            return Err(EmployeeError::NotFound("role"));
        }

        let employee = self.store.assign_role(employee.id, role.id).await?;
        info!(employee_id, tenant_id, role_id, "Assigned role");
        Ok((employee, role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{
        Department, Designation, NewCompany, NewDepartment, NewDesignation, NewRole, NewTenant,
        Tenant,
    };
    use crate::database::{
        CompanyStore, DepartmentStore, DesignationStore, EmployeeStore, MemoryStore, RoleStore,
        TenantStore,
    };
    use crate::types::DepartmentStatus;

    struct Org {
        tenant: Tenant,
        role: Role,
        department: Department,
        designation: Designation,
    }

    async fn org(store: &MemoryStore, name: &str) -> Org {
        let company = store
            .create_company(NewCompany {
                name: name.to_string(),
                industry: String::new(),
                country: "Nigeria".to_string(),
                timezone: "Africa/Lagos".to_string(),
            })
            .await
            .unwrap();
        let tenant = store
            .create_tenant(NewTenant {
                company_id: company.id,
            })
            .await
            .unwrap();
        let role = store
            .create_role(NewRole {
                tenant_id: tenant.id,
                name: "Engineer".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();
        let department = store
            .create_department(NewDepartment {
                tenant_id: tenant.id,
                name: "General".to_string(),
                status: DepartmentStatus::Active,
            })
            .await
            .unwrap();
        let designation = store
            .create_designation(NewDesignation {
                tenant_id: tenant.id,
                name: "Owner".to_string(),
                level: 1,
                description: String::new(),
            })
            .await
            .unwrap();
        Org {
            tenant,
            role,
            department,
            designation,
        }
    }

    fn request(org: &Org, email: &str) -> CreateEmployeeRequest {
        CreateEmployeeRequest {
            email: email.to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            phone: None,
            password: "password123".to_string(),
            department_id: org.department.id,
            designation_id: org.designation.id,
            manager_id: None,
            role_id: org.role.id,
            hire_date: None,
        }
    }

    fn service(store: &MemoryStore) -> EmployeeService {
        EmployeeService::new(
            Arc::new(store.clone()),
            CredentialHasher::new(8, 1, 1).unwrap(),
        )
    }

    #[tokio::test]
    async fn creates_employee_with_role() {
        let store = MemoryStore::new();
        let acme = org(&store, "Acme").await;

        let (employee, role) = service(&store)
            .create_employee(acme.tenant.id, request(&acme, "Grace@Acme.com"))
            .await
            .unwrap();

        assert_eq!(employee.email, "grace@acme.com");
        assert_eq!(employee.role_id, Some(acme.role.id));
        assert_eq!(role.name, "Engineer");
        assert_eq!(employee.full_name(), "Grace Hopper");
        assert!(employee.hire_date.is_some());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        let acme = org(&store, "Acme").await;
        let service = service(&store);
        service
            .create_employee(acme.tenant.id, request(&acme, "grace@acme.com"))
            .await
            .unwrap();

        let err = service
            .create_employee(acme.tenant.id, request(&acme, "grace@acme.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, EmployeeError::EmailTaken(email) if email == "grace@acme.com"));
        assert_eq!(store.counts().await.employees, 1);
    }

    #[tokio::test]
    async fn references_must_belong_to_tenant() {
        let store = MemoryStore::new();
        let acme = org(&store, "Acme").await;
        let globex = org(&store, "Globex").await;

        let mut foreign_role = request(&acme, "grace@acme.com");
        foreign_role.role_id = globex.role.id;
        let err = service(&store)
            .create_employee(acme.tenant.id, foreign_role)
            .await
            .unwrap_err();
        assert!(matches!(err, EmployeeError::Validation(v) if v.field == "role_id"));

        let mut foreign_department = request(&acme, "grace@acme.com");
        foreign_department.department_id = globex.department.id;
        let err = service(&store)
            .create_employee(acme.tenant.id, foreign_department)
            .await
            .unwrap_err();
        assert!(matches!(err, EmployeeError::Validation(v) if v.field == "department_id"));
        assert_eq!(store.counts().await.employees, 0);
    }

    #[tokio::test]
    async fn reference_lookup_outage_is_a_storage_error() {
        let store = MemoryStore::new();
        let acme = org(&store, "Acme").await;

        for operation in ["role_by_id", "department_by_id", "designation_by_id"] {
            store.inject_failure(operation);
            let err = service(&store)
                .create_employee(acme.tenant.id, request(&acme, "grace@acme.com"))
                .await
                .unwrap_err();
            assert!(
                matches!(err, EmployeeError::Storage(StoreError::Unavailable(_))),
                "{operation}: {err:?}"
            );
            store.clear_faults();
        }
        assert_eq!(store.counts().await.employees, 0);
    }

    #[tokio::test]
    async fn failed_role_assignment_leaves_no_employee() {
        let store = MemoryStore::new();
        let acme = org(&store, "Acme").await;
        store.inject_failure("assign_role");

        let err = service(&store)
            .create_employee(acme.tenant.id, request(&acme, "grace@acme.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, EmployeeError::Storage(StoreError::Unavailable(_))));
        assert_eq!(store.counts().await.employees, 0);
    }

    #[tokio::test]
    async fn reassigns_role_within_tenant_only() {
        let store = MemoryStore::new();
        let acme = org(&store, "Acme").await;
        let globex = org(&store, "Globex").await;
        let service = service(&store);
        let (employee, _) = service
            .create_employee(acme.tenant.id, request(&acme, "grace@acme.com"))
            .await
            .unwrap();

        let lead = store
            .create_role(NewRole {
                tenant_id: acme.tenant.id,
                name: "Lead".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();
        let (updated, role) = service
            .assign_role(acme.tenant.id, employee.id, lead.id)
            .await
            .unwrap();
        assert_eq!(updated.role_id, Some(lead.id));
        assert_eq!(role.name, "Lead");

        let err = service
            .assign_role(acme.tenant.id, employee.id, globex.role.id)
            .await
            .unwrap_err();
        assert!(matches!(err, EmployeeError::NotFound("role")));

        let err = service
            .assign_role(globex.tenant.id, employee.id, globex.role.id)
            .await
            .unwrap_err();
        assert!(matches!(err, EmployeeError::NotFound("employee")));
        assert_eq!(
            store.employee_by_id(employee.id).await.unwrap().role_id,
            Some(lead.id)
        );
    }
}
