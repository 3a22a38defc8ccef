//! Storage seams for the HR entities.
//!
//! Each entity gets its own small trait; `EntityStore` bundles them so the
//! services can take one handle. A `UnitOfWork` is an `EntityStore` whose
//! writes only become visible to other readers on `commit`.

use async_trait::async_trait;

use crate::database::models::{
    Company, CompanyChanges, Department, DepartmentChanges, Designation, DesignationChanges,
    Employee, EmployeeCredentials, NewCompany, NewDepartment, NewDesignation, NewEmployee,
    NewRole, NewTenant, Role, Tenant,
};
use crate::database::StoreError;

#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn create_company(&self, company: NewCompany) -> Result<Company, StoreError>;
    async fn company_by_id(&self, id: i32) -> Result<Company, StoreError>;
    async fn company_by_name(&self, name: &str) -> Result<Company, StoreError>;
    async fn update_company(&self, id: i32, changes: CompanyChanges)
        -> Result<Company, StoreError>;
    /// Removes the company and, by cascade, its tenant and everything in it
    async fn delete_company(&self, id: i32) -> Result<(), StoreError>;
}

#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn create_tenant(&self, tenant: NewTenant) -> Result<Tenant, StoreError>;
    async fn tenant_by_id(&self, id: i32) -> Result<Tenant, StoreError>;
    async fn tenant_by_company(&self, company_id: i32) -> Result<Tenant, StoreError>;
    /// Fails with `NotFound` unless the employee belongs to the tenant
    async fn set_super_admin(&self, tenant_id: i32, employee_id: i32)
        -> Result<Tenant, StoreError>;
    async fn delete_tenant(&self, id: i32) -> Result<(), StoreError>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn create_role(&self, role: NewRole) -> Result<Role, StoreError>;
    async fn role_by_id(&self, id: i32) -> Result<Role, StoreError>;
    async fn role_by_name(&self, tenant_id: i32, name: &str) -> Result<Role, StoreError>;
    async fn delete_role(&self, id: i32) -> Result<(), StoreError>;
}

#[async_trait]
pub trait DepartmentStore: Send + Sync {
    async fn create_department(&self, department: NewDepartment)
        -> Result<Department, StoreError>;
    async fn department_by_id(&self, id: i32) -> Result<Department, StoreError>;
    async fn update_department(
        &self,
        id: i32,
        changes: DepartmentChanges,
    ) -> Result<Department, StoreError>;
    async fn delete_department(&self, id: i32) -> Result<(), StoreError>;
}

#[async_trait]
pub trait DesignationStore: Send + Sync {
    async fn create_designation(
        &self,
        designation: NewDesignation,
    ) -> Result<Designation, StoreError>;
    async fn designation_by_id(&self, id: i32) -> Result<Designation, StoreError>;
    async fn update_designation(
        &self,
        id: i32,
        changes: DesignationChanges,
    ) -> Result<Designation, StoreError>;
    async fn delete_designation(&self, id: i32) -> Result<(), StoreError>;
}

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn create_employee(&self, employee: NewEmployee) -> Result<Employee, StoreError>;
    async fn employee_by_id(&self, id: i32) -> Result<Employee, StoreError>;
    async fn employee_by_email(&self, email: &str) -> Result<Employee, StoreError>;
    /// Employee joined with its role name, for login
    async fn credentials_by_email(&self, email: &str) -> Result<EmployeeCredentials, StoreError>;
    async fn assign_role(&self, employee_id: i32, role_id: i32) -> Result<Employee, StoreError>;
    async fn delete_employee(&self, id: i32) -> Result<(), StoreError>;
}

/// Every entity gateway behind one handle
pub trait EntityStore:
    CompanyStore + TenantStore + RoleStore + DepartmentStore + DesignationStore + EmployeeStore
{
}

impl<T> EntityStore for T where
    T: CompanyStore + TenantStore + RoleStore + DepartmentStore + DesignationStore + EmployeeStore
{
}

/// A transaction over the entity store.
///
/// Dropping a unit of work without calling `commit` discards its writes.
#[async_trait]
pub trait UnitOfWork: EntityStore {
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// A store able to open transactions
#[async_trait]
pub trait TransactionalStore: EntityStore {
    /// Round trip to the backend, for health checks
    async fn ping(&self) -> Result<(), StoreError>;

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError>;
}
