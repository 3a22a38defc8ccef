//! In-process entity store.
//!
//! Mirrors the constraints of the Postgres schema (unique names and emails,
//! foreign keys, cascades) so services can be exercised without a database.
//! Transactions take the table lock for their whole lifetime and restore a
//! snapshot unless committed.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard, OwnedMutexGuard};

use crate::database::models::{
    Company, CompanyChanges, Department, DepartmentChanges, Designation, DesignationChanges,
    Employee, EmployeeCredentials, NewCompany, NewDepartment, NewDesignation, NewEmployee,
    NewRole, NewTenant, Role, Tenant,
};
use crate::database::store::{
    CompanyStore, DepartmentStore, DesignationStore, EmployeeStore, RoleStore, TenantStore,
    TransactionalStore, UnitOfWork,
};
use crate::database::StoreError;

/// Bound on waiting for the table lock, matching the Postgres per-call default
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Row counts per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub companies: usize,
    pub tenants: usize,
    pub roles: usize,
    pub departments: usize,
    pub designations: usize,
    pub employees: usize,
}

#[derive(Debug, Clone, Copy)]
enum Fault {
    Fail,
    Delay(Duration),
}

/// Failures and delays injected into named store operations
#[derive(Clone, Default)]
struct FaultPlan(Arc<std::sync::Mutex<HashMap<&'static str, Fault>>>);

impl FaultPlan {
    fn set(&self, operation: &'static str, fault: Fault) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(operation, fault);
    }

    fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    async fn check(&self, operation: &'static str) -> Result<(), StoreError> {
        let fault = self
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(operation)
            .copied();

        match fault {
            Some(Fault::Fail) => Err(StoreError::Unavailable(format!(
                "{}: injected failure",
                operation
            ))),
            Some(Fault::Delay(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    companies: BTreeMap<i32, Company>,
    tenants: BTreeMap<i32, Tenant>,
    roles: BTreeMap<i32, Role>,
    departments: BTreeMap<i32, Department>,
    designations: BTreeMap<i32, Designation>,
    employees: BTreeMap<i32, Employee>,
    last_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn counts(&self) -> RowCounts {
        RowCounts {
            companies: self.companies.len(),
            tenants: self.tenants.len(),
            roles: self.roles.len(),
            departments: self.departments.len(),
            designations: self.designations.len(),
            employees: self.employees.len(),
        }
    }

    fn require_tenant(&self, operation: &str, tenant_id: i32) -> Result<(), StoreError> {
        if self.tenants.contains_key(&tenant_id) {
            Ok(())
        } else {
            Err(StoreError::InvalidReference(format!(
                "{}: tenant {} does not exist",
                operation, tenant_id
            )))
        }
    }

    fn require_employee(&self, operation: &str, employee_id: i32) -> Result<(), StoreError> {
        if self.employees.contains_key(&employee_id) {
            Ok(())
        } else {
            Err(StoreError::InvalidReference(format!(
                "{}: employee {} does not exist",
                operation, employee_id
            )))
        }
    }

    fn create_company(&mut self, new: NewCompany) -> Result<Company, StoreError> {
        if self.companies.values().any(|c| c.name == new.name) {
            return Err(StoreError::Conflict(format!(
                "create_company: company name {} already exists",
                new.name
            )));
        }
        let now = Utc::now();
        let company = Company {
            id: self.next_id(),
            name: new.name,
            industry: new.industry,
            country: new.country,
            timezone: new.timezone,
            created_at: now,
            updated_at: now,
        };
        self.companies.insert(company.id, company.clone());
        Ok(company)
    }

    fn update_company(&mut self, id: i32, changes: CompanyChanges) -> Result<Company, StoreError> {
        if self
            .companies
            .values()
            .any(|c| c.id != id && c.name == changes.name)
        {
            return Err(StoreError::Conflict(format!(
                "update_company: company name {} already exists",
                changes.name
            )));
        }
        let company = self
            .companies
            .get_mut(&id)
            .ok_or(StoreError::NotFound("company"))?;
        company.name = changes.name;
        company.industry = changes.industry;
        company.country = changes.country;
        company.timezone = changes.timezone;
        company.updated_at = Utc::now();
        Ok(company.clone())
    }

    fn delete_company(&mut self, id: i32) -> Result<(), StoreError> {
        self.companies
            .remove(&id)
            .ok_or(StoreError::NotFound("company"))?;
        let tenants: Vec<i32> = self
            .tenants
            .values()
            .filter(|t| t.company_id == id)
            .map(|t| t.id)
            .collect();
        for tenant_id in tenants {
            self.delete_tenant(tenant_id)?;
        }
        Ok(())
    }

    fn create_tenant(&mut self, new: NewTenant) -> Result<Tenant, StoreError> {
        if !self.companies.contains_key(&new.company_id) {
            return Err(StoreError::InvalidReference(format!(
                "create_tenant: company {} does not exist",
                new.company_id
            )));
        }
        if self.tenants.values().any(|t| t.company_id == new.company_id) {
            return Err(StoreError::Conflict(format!(
                "create_tenant: company {} already has a tenant",
                new.company_id
            )));
        }
        let now = Utc::now();
        let tenant = Tenant {
            id: self.next_id(),
            company_id: new.company_id,
            super_admin_id: None,
            created_at: now,
            updated_at: now,
        };
        self.tenants.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    fn set_super_admin(&mut self, tenant_id: i32, employee_id: i32) -> Result<Tenant, StoreError> {
        let belongs = self
            .employees
            .get(&employee_id)
            .is_some_and(|e| e.tenant_id == tenant_id);
        let tenant = self
            .tenants
            .get_mut(&tenant_id)
            .filter(|_| belongs)
            .ok_or(StoreError::NotFound("tenant employee"))?;
        tenant.super_admin_id = Some(employee_id);
        tenant.updated_at = Utc::now();
        Ok(tenant.clone())
    }

    fn delete_tenant(&mut self, id: i32) -> Result<(), StoreError> {
        self.tenants.remove(&id).ok_or(StoreError::NotFound("tenant"))?;
        self.employees.retain(|_, e| e.tenant_id != id);
        self.roles.retain(|_, r| r.tenant_id != id);
        self.departments.retain(|_, d| d.tenant_id != id);
        self.designations.retain(|_, d| d.tenant_id != id);
        Ok(())
    }

    fn create_role(&mut self, new: NewRole) -> Result<Role, StoreError> {
        self.require_tenant("create_role", new.tenant_id)?;
        if self
            .roles
            .values()
            .any(|r| r.tenant_id == new.tenant_id && r.name == new.name)
        {
            return Err(StoreError::Conflict(format!(
                "create_role: role {} already exists in tenant {}",
                new.name, new.tenant_id
            )));
        }
        let now = Utc::now();
        let role = Role {
            id: self.next_id(),
            tenant_id: new.tenant_id,
            name: new.name,
            description: new.description,
            created_at: now,
            updated_at: now,
        };
        self.roles.insert(role.id, role.clone());
        Ok(role)
    }

    fn delete_role(&mut self, id: i32) -> Result<(), StoreError> {
        self.roles.remove(&id).ok_or(StoreError::NotFound("role"))?;
        for employee in self.employees.values_mut() {
            if employee.role_id == Some(id) {
                employee.role_id = None;
            }
        }
        Ok(())
    }

    fn create_department(&mut self, new: NewDepartment) -> Result<Department, StoreError> {
        self.require_tenant("create_department", new.tenant_id)?;
        let now = Utc::now();
        let department = Department {
            id: self.next_id(),
            tenant_id: new.tenant_id,
            name: new.name,
            hod_id: None,
            status: new.status.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };
        self.departments.insert(department.id, department.clone());
        Ok(department)
    }

    fn update_department(
        &mut self,
        id: i32,
        changes: DepartmentChanges,
    ) -> Result<Department, StoreError> {
        if let Some(hod_id) = changes.hod_id {
            self.require_employee("update_department", hod_id)?;
        }
        let department = self
            .departments
            .get_mut(&id)
            .ok_or(StoreError::NotFound("department"))?;
        department.name = changes.name;
        department.hod_id = changes.hod_id;
        department.status = changes.status.as_str().to_string();
        department.updated_at = Utc::now();
        Ok(department.clone())
    }

    fn delete_department(&mut self, id: i32) -> Result<(), StoreError> {
        if !self.departments.contains_key(&id) {
            return Err(StoreError::NotFound("department"));
        }
        if self.employees.values().any(|e| e.department_id == id) {
            return Err(StoreError::InvalidReference(format!(
                "delete_department: department {} still has employees",
                id
            )));
        }
        self.departments.remove(&id);
        Ok(())
    }

    fn create_designation(&mut self, new: NewDesignation) -> Result<Designation, StoreError> {
        self.require_tenant("create_designation", new.tenant_id)?;
        let now = Utc::now();
        let designation = Designation {
            id: self.next_id(),
            tenant_id: new.tenant_id,
            name: new.name,
            level: new.level,
            description: new.description,
            created_at: now,
            updated_at: now,
        };
        self.designations.insert(designation.id, designation.clone());
        Ok(designation)
    }

    fn update_designation(
        &mut self,
        id: i32,
        changes: DesignationChanges,
    ) -> Result<Designation, StoreError> {
        let designation = self
            .designations
            .get_mut(&id)
            .ok_or(StoreError::NotFound("designation"))?;
        designation.name = changes.name;
        designation.level = changes.level;
        designation.description = changes.description;
        designation.updated_at = Utc::now();
        Ok(designation.clone())
    }

    fn delete_designation(&mut self, id: i32) -> Result<(), StoreError> {
        if !self.designations.contains_key(&id) {
            return Err(StoreError::NotFound("designation"));
        }
        if self.employees.values().any(|e| e.designation_id == id) {
            return Err(StoreError::InvalidReference(format!(
                "delete_designation: designation {} still has employees",
                id
            )));
        }
        self.designations.remove(&id);
        Ok(())
    }

    fn create_employee(&mut self, new: NewEmployee) -> Result<Employee, StoreError> {
        self.require_tenant("create_employee", new.tenant_id)?;
        if !self.departments.contains_key(&new.department_id) {
            return Err(StoreError::InvalidReference(format!(
                "create_employee: department {} does not exist",
                new.department_id
            )));
        }
        if !self.designations.contains_key(&new.designation_id) {
            return Err(StoreError::InvalidReference(format!(
                "create_employee: designation {} does not exist",
                new.designation_id
            )));
        }
        if let Some(manager_id) = new.manager_id {
            self.require_employee("create_employee", manager_id)?;
        }
        if self.employees.values().any(|e| e.email == new.email) {
            return Err(StoreError::Conflict(format!(
                "create_employee: email {} already exists",
                new.email
            )));
        }
        let now = Utc::now();
        let employee = Employee {
            id: self.next_id(),
            tenant_id: new.tenant_id,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            phone: new.phone,
            password_hash: new.password_hash,
            department_id: new.department_id,
            designation_id: new.designation_id,
            manager_id: new.manager_id,
            role_id: None,
            status: new.status.as_str().to_string(),
            hire_date: new.hire_date,
            created_at: now,
            updated_at: now,
        };
        self.employees.insert(employee.id, employee.clone());
        Ok(employee)
    }

    fn credentials_by_email(&self, email: &str) -> Result<EmployeeCredentials, StoreError> {
        let employee = self
            .employees
            .values()
            .find(|e| e.email == email)
            .ok_or(StoreError::NotFound("employee"))?;
        let role_name = employee
            .role_id
            .and_then(|id| self.roles.get(&id))
            .map(|r| r.name.clone());
        Ok(EmployeeCredentials {
            employee_id: employee.id,
            tenant_id: employee.tenant_id,
            email: employee.email.clone(),
            password_hash: employee.password_hash.clone(),
            role_name,
        })
    }

    fn assign_role(&mut self, employee_id: i32, role_id: i32) -> Result<Employee, StoreError> {
        let role_tenant = self.roles.get(&role_id).map(|r| r.tenant_id);
        let employee = self
            .employees
            .get_mut(&employee_id)
            .filter(|e| Some(e.tenant_id) == role_tenant)
            .ok_or(StoreError::NotFound("employee role"))?;
        employee.role_id = Some(role_id);
        employee.updated_at = Utc::now();
        Ok(employee.clone())
    }

    fn delete_employee(&mut self, id: i32) -> Result<(), StoreError> {
        self.employees
            .remove(&id)
            .ok_or(StoreError::NotFound("employee"))?;
        for tenant in self.tenants.values_mut() {
            if tenant.super_admin_id == Some(id) {
                tenant.super_admin_id = None;
            }
        }
        for department in self.departments.values_mut() {
            if department.hod_id == Some(id) {
                department.hod_id = None;
            }
        }
        for employee in self.employees.values_mut() {
            if employee.manager_id == Some(id) {
                employee.manager_id = None;
            }
        }
        Ok(())
    }
}

/// Shared in-memory store; clones see the same tables
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    faults: FaultPlan,
    timeout: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_CALL_TIMEOUT)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls that cannot get the table lock within `timeout` fail with `StoreError::Timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            tables: Arc::default(),
            faults: FaultPlan::default(),
            timeout,
        }
    }

    /// Make every later call of `operation` fail as if the store were down
    pub fn inject_failure(&self, operation: &'static str) {
        self.faults.set(operation, Fault::Fail);
    }

    /// Make every later call of `operation` wait before running
    pub fn inject_delay(&self, operation: &'static str, delay: Duration) {
        self.faults.set(operation, Fault::Delay(delay));
    }

    pub fn clear_faults(&self) {
        self.faults.clear();
    }

    /// Committed row counts; waits for any open transaction to finish
    pub async fn counts(&self) -> RowCounts {
        self.tables.lock().await.counts()
    }

    async fn tables(
        &self,
        operation: &'static str,
    ) -> Result<MutexGuard<'_, Tables>, StoreError> {
        tokio::time::timeout(self.timeout, self.tables.lock())
            .await
            .map_err(|_| StoreError::Timeout {
                operation,
                limit: self.timeout,
            })
    }
}

/// Transaction over a `MemoryStore`, holding its table lock until dropped
pub struct MemoryUnitOfWork {
    tables: Mutex<OwnedMutexGuard<Tables>>,
    snapshot: Option<Tables>,
    faults: FaultPlan,
}

impl MemoryUnitOfWork {
    // The lock is private to this unit of work, so only its own calls contend
    async fn tables(
        &self,
        _operation: &'static str,
    ) -> Result<MappedMutexGuard<'_, Tables>, StoreError> {
        Ok(MutexGuard::map(self.tables.lock().await, |guard| &mut **guard))
    }
}

impl Drop for MemoryUnitOfWork {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            **self.tables.get_mut() = snapshot;
        }
    }
}

macro_rules! mem_call {
    ($this:ident, $op:literal, |$t:ident| $body:expr) => {{
        $this.faults.check($op).await?;
        let mut guard = $this.tables($op).await?;
        let $t: &mut Tables = &mut guard;
        $body
    }};
}

macro_rules! impl_entity_store {
    ($ty:ty) => {
        #[async_trait]
        impl CompanyStore for $ty {
            async fn create_company(&self, new: NewCompany) -> Result<Company, StoreError> {
                mem_call!(self, "create_company", |t| t.create_company(new))
            }

            async fn company_by_id(&self, id: i32) -> Result<Company, StoreError> {
                mem_call!(self, "company_by_id", |t| t
                    .companies
                    .get(&id)
                    .cloned()
                    .ok_or(StoreError::NotFound("company")))
            }

            async fn company_by_name(&self, name: &str) -> Result<Company, StoreError> {
                mem_call!(self, "company_by_name", |t| t
                    .companies
                    .values()
                    .find(|c| c.name == name)
                    .cloned()
                    .ok_or(StoreError::NotFound("company")))
            }

            async fn update_company(
                &self,
                id: i32,
                changes: CompanyChanges,
            ) -> Result<Company, StoreError> {
                mem_call!(self, "update_company", |t| t.update_company(id, changes))
            }

            async fn delete_company(&self, id: i32) -> Result<(), StoreError> {
                mem_call!(self, "delete_company", |t| t.delete_company(id))
            }
        }

        #[async_trait]
        impl TenantStore for $ty {
            async fn create_tenant(&self, new: NewTenant) -> Result<Tenant, StoreError> {
                mem_call!(self, "create_tenant", |t| t.create_tenant(new))
            }

            async fn tenant_by_id(&self, id: i32) -> Result<Tenant, StoreError> {
                mem_call!(self, "tenant_by_id", |t| t
                    .tenants
                    .get(&id)
                    .cloned()
                    .ok_or(StoreError::NotFound("tenant")))
            }

            async fn tenant_by_company(&self, company_id: i32) -> Result<Tenant, StoreError> {
                mem_call!(self, "tenant_by_company", |t| t
                    .tenants
                    .values()
                    .find(|tenant| tenant.company_id == company_id)
                    .cloned()
                    .ok_or(StoreError::NotFound("tenant")))
            }

            async fn set_super_admin(
                &self,
                tenant_id: i32,
                employee_id: i32,
            ) -> Result<Tenant, StoreError> {
                mem_call!(self, "set_super_admin", |t| t
                    .set_super_admin(tenant_id, employee_id))
            }

            async fn delete_tenant(&self, id: i32) -> Result<(), StoreError> {
                mem_call!(self, "delete_tenant", |t| t.delete_tenant(id))
            }
        }

        #[async_trait]
        impl RoleStore for $ty {
            async fn create_role(&self, new: NewRole) -> Result<Role, StoreError> {
                mem_call!(self, "create_role", |t| t.create_role(new))
            }

            async fn role_by_id(&self, id: i32) -> Result<Role, StoreError> {
                mem_call!(self, "role_by_id", |t| t
                    .roles
                    .get(&id)
                    .cloned()
                    .ok_or(StoreError::NotFound("role")))
            }

            async fn role_by_name(&self, tenant_id: i32, name: &str) -> Result<Role, StoreError> {
                mem_call!(self, "role_by_name", |t| t
                    .roles
                    .values()
                    .find(|r| r.tenant_id == tenant_id && r.name == name)
                    .cloned()
                    .ok_or(StoreError::NotFound("role")))
            }

            async fn delete_role(&self, id: i32) -> Result<(), StoreError> {
                mem_call!(self, "delete_role", |t| t.delete_role(id))
            }
        }

        #[async_trait]
        impl DepartmentStore for $ty {
            async fn create_department(&self, new: NewDepartment) -> Result<Department, StoreError> {
                mem_call!(self, "create_department", |t| t.create_department(new))
            }

            async fn department_by_id(&self, id: i32) -> Result<Department, StoreError> {
                mem_call!(self, "department_by_id", |t| t
                    .departments
                    .get(&id)
                    .cloned()
                    .ok_or(StoreError::NotFound("department")))
            }

            async fn update_department(
                &self,
                id: i32,
                changes: DepartmentChanges,
            ) -> Result<Department, StoreError> {
                mem_call!(self, "update_department", |t| t.update_department(id, changes))
            }

            async fn delete_department(&self, id: i32) -> Result<(), StoreError> {
                mem_call!(self, "delete_department", |t| t.delete_department(id))
            }
        }

        #[async_trait]
        impl DesignationStore for $ty {
            async fn create_designation(
                &self,
                new: NewDesignation,
            ) -> Result<Designation, StoreError> {
                mem_call!(self, "create_designation", |t| t.create_designation(new))
            }

            async fn designation_by_id(&self, id: i32) -> Result<Designation, StoreError> {
                mem_call!(self, "designation_by_id", |t| t
                    .designations
                    .get(&id)
                    .cloned()
                    .ok_or(StoreError::NotFound("designation")))
            }

            async fn update_designation(
                &self,
                id: i32,
                changes: DesignationChanges,
            ) -> Result<Designation, StoreError> {
                mem_call!(self, "update_designation", |t| t.update_designation(id, changes))
            }

            async fn delete_designation(&self, id: i32) -> Result<(), StoreError> {
                mem_call!(self, "delete_designation", |t| t.delete_designation(id))
            }
        }

        #[async_trait]
        impl EmployeeStore for $ty {
            async fn create_employee(&self, new: NewEmployee) -> Result<Employee, StoreError> {
                mem_call!(self, "create_employee", |t| t.create_employee(new))
            }

            async fn employee_by_id(&self, id: i32) -> Result<Employee, StoreError> {
                mem_call!(self, "employee_by_id", |t| t
                    .employees
                    .get(&id)
                    .cloned()
                    .ok_or(StoreError::NotFound("employee")))
            }

            async fn employee_by_email(&self, email: &str) -> Result<Employee, StoreError> {
                mem_call!(self, "employee_by_email", |t| t
                    .employees
                    .values()
                    .find(|e| e.email == email)
                    .cloned()
                    .ok_or(StoreError::NotFound("employee")))
            }

            async fn credentials_by_email(
                &self,
                email: &str,
            ) -> Result<EmployeeCredentials, StoreError> {
                mem_call!(self, "credentials_by_email", |t| t.credentials_by_email(email))
            }

            async fn assign_role(
                &self,
                employee_id: i32,
                role_id: i32,
            ) -> Result<Employee, StoreError> {
                mem_call!(self, "assign_role", |t| t.assign_role(employee_id, role_id))
            }

            async fn delete_employee(&self, id: i32) -> Result<(), StoreError> {
                mem_call!(self, "delete_employee", |t| t.delete_employee(id))
            }
        }
    };
}

impl_entity_store!(MemoryStore);
impl_entity_store!(MemoryUnitOfWork);

#[async_trait]
impl TransactionalStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.faults.check("ping").await
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        self.faults.check("begin").await?;
        let guard = tokio::time::timeout(self.timeout, self.tables.clone().lock_owned())
            .await
            .map_err(|_| StoreError::Timeout {
                operation: "begin",
                limit: self.timeout,
            })?;
        let snapshot = guard.clone();
        Ok(Box::new(MemoryUnitOfWork {
            tables: Mutex::new(guard),
            snapshot: Some(snapshot),
            faults: self.faults.clone(),
        }))
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut this = self;
        this.faults.check("commit").await?;
        this.snapshot = None;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        // Drop restores the snapshot
        Ok(())
    }
}
