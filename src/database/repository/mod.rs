//! Postgres implementation of the entity store.
//!
//! The SQL lives in one module per table, written against any `PgExecutor`
//! so the same statements serve both pooled calls and open transactions.

pub mod company;
pub mod department;
pub mod designation;
pub mod employee;
pub mod role;
pub mod tenant;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

use crate::database::models::{
    Company, CompanyChanges, Department, DepartmentChanges, Designation, DesignationChanges,
    Employee, EmployeeCredentials, NewCompany, NewDepartment, NewDesignation, NewEmployee,
    NewRole, NewTenant, Role, Tenant,
};
use crate::database::store::{
    CompanyStore, DepartmentStore, DesignationStore, EmployeeStore, RoleStore, TenantStore,
    TransactionalStore, UnitOfWork,
};
use crate::database::{map_sqlx_error, StoreError};

/// Pool-backed store; every call runs on its own connection
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn connection(&self) -> Result<PoolConnection<Postgres>, sqlx::Error> {
        self.pool.acquire().await
    }
}

/// Store view over one open transaction
pub struct PgUnitOfWork {
    tx: Mutex<Transaction<'static, Postgres>>,
    timeout: Duration,
}

impl PgUnitOfWork {
    async fn connection(&self) -> Result<MappedMutexGuard<'_, PgConnection>, sqlx::Error> {
        let guard = self.tx.lock().await;
        Ok(MutexGuard::map(guard, |tx| &mut **tx))
    }
}

/// Run one statement under the per-call limit, translating driver errors.
async fn bounded<T, F>(operation: &'static str, limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(|e| map_sqlx_error(operation, e)),
        Err(_) => Err(StoreError::Timeout { operation, limit }),
    }
}

fn found<T>(entity: &'static str, row: Option<T>) -> Result<T, StoreError> {
    row.ok_or(StoreError::NotFound(entity))
}

fn removed(entity: &'static str, deleted: bool) -> Result<(), StoreError> {
    if deleted {
        Ok(())
    } else {
        Err(StoreError::NotFound(entity))
    }
}

macro_rules! pg_call {
    ($this:ident, $op:literal, $conn:ident => $body:expr) => {
        bounded($op, $this.timeout, async {
            let mut $conn = $this.connection().await?;
            $body.await
        })
        .await
    };
}

macro_rules! impl_entity_store {
    ($ty:ty) => {
        #[async_trait]
        impl CompanyStore for $ty {
            async fn create_company(&self, new: NewCompany) -> Result<Company, StoreError> {
                pg_call!(self, "create_company", conn => company::insert(&mut *conn, &new))
            }

            async fn company_by_id(&self, id: i32) -> Result<Company, StoreError> {
                let row = pg_call!(self, "company_by_id", conn => company::find_by_id(&mut *conn, id))?;
                found("company", row)
            }

            async fn company_by_name(&self, name: &str) -> Result<Company, StoreError> {
                let row = pg_call!(self, "company_by_name", conn => company::find_by_name(&mut *conn, name))?;
                found("company", row)
            }

            async fn update_company(
                &self,
                id: i32,
                changes: CompanyChanges,
            ) -> Result<Company, StoreError> {
                let row = pg_call!(self, "update_company", conn => company::update(&mut *conn, id, &changes))?;
                found("company", row)
            }

            async fn delete_company(&self, id: i32) -> Result<(), StoreError> {
                let deleted = pg_call!(self, "delete_company", conn => company::delete(&mut *conn, id))?;
                removed("company", deleted)
            }
        }

        #[async_trait]
        impl TenantStore for $ty {
            async fn create_tenant(&self, new: NewTenant) -> Result<Tenant, StoreError> {
                pg_call!(self, "create_tenant", conn => tenant::insert(&mut *conn, &new))
            }

            async fn tenant_by_id(&self, id: i32) -> Result<Tenant, StoreError> {
                let row = pg_call!(self, "tenant_by_id", conn => tenant::find_by_id(&mut *conn, id))?;
                found("tenant", row)
            }

            async fn tenant_by_company(&self, company_id: i32) -> Result<Tenant, StoreError> {
                let row = pg_call!(self, "tenant_by_company", conn => tenant::find_by_company(&mut *conn, company_id))?;
                found("tenant", row)
            }

            async fn set_super_admin(
                &self,
                tenant_id: i32,
                employee_id: i32,
            ) -> Result<Tenant, StoreError> {
                let row = pg_call!(self, "set_super_admin", conn => tenant::set_super_admin(&mut *conn, tenant_id, employee_id))?;
                found("tenant employee", row)
            }

            async fn delete_tenant(&self, id: i32) -> Result<(), StoreError> {
                let deleted = pg_call!(self, "delete_tenant", conn => tenant::delete(&mut *conn, id))?;
                removed("tenant", deleted)
            }
        }

        #[async_trait]
        impl RoleStore for $ty {
            async fn create_role(&self, new: NewRole) -> Result<Role, StoreError> {
                pg_call!(self, "create_role", conn => role::insert(&mut *conn, &new))
            }

            async fn role_by_id(&self, id: i32) -> Result<Role, StoreError> {
                let row = pg_call!(self, "role_by_id", conn => role::find_by_id(&mut *conn, id))?;
                found("role", row)
            }

            async fn role_by_name(&self, tenant_id: i32, name: &str) -> Result<Role, StoreError> {
                let row = pg_call!(self, "role_by_name", conn => role::find_by_name(&mut *conn, tenant_id, name))?;
                found("role", row)
            }

            async fn delete_role(&self, id: i32) -> Result<(), StoreError> {
                let deleted = pg_call!(self, "delete_role", conn => role::delete(&mut *conn, id))?;
                removed("role", deleted)
            }
        }

        #[async_trait]
        impl DepartmentStore for $ty {
            async fn create_department(&self, new: NewDepartment) -> Result<Department, StoreError> {
                pg_call!(self, "create_department", conn => department::insert(&mut *conn, &new))
            }

            async fn department_by_id(&self, id: i32) -> Result<Department, StoreError> {
                let row = pg_call!(self, "department_by_id", conn => department::find_by_id(&mut *conn, id))?;
                found("department", row)
            }

            async fn update_department(
                &self,
                id: i32,
                changes: DepartmentChanges,
            ) -> Result<Department, StoreError> {
                let row = pg_call!(self, "update_department", conn => department::update(&mut *conn, id, &changes))?;
                found("department", row)
            }

            async fn delete_department(&self, id: i32) -> Result<(), StoreError> {
                let deleted = pg_call!(self, "delete_department", conn => department::delete(&mut *conn, id))?;
                removed("department", deleted)
            }
        }

        #[async_trait]
        impl DesignationStore for $ty {
            async fn create_designation(
                &self,
                new: NewDesignation,
            ) -> Result<Designation, StoreError> {
                pg_call!(self, "create_designation", conn => designation::insert(&mut *conn, &new))
            }

            async fn designation_by_id(&self, id: i32) -> Result<Designation, StoreError> {
                let row = pg_call!(self, "designation_by_id", conn => designation::find_by_id(&mut *conn, id))?;
                found("designation", row)
            }

            async fn update_designation(
                &self,
                id: i32,
                changes: DesignationChanges,
            ) -> Result<Designation, StoreError> {
                let row = pg_call!(self, "update_designation", conn => designation::update(&mut *conn, id, &changes))?;
                found("designation", row)
            }

            async fn delete_designation(&self, id: i32) -> Result<(), StoreError> {
                let deleted = pg_call!(self, "delete_designation", conn => designation::delete(&mut *conn, id))?;
                removed("designation", deleted)
            }
        }

        #[async_trait]
        impl EmployeeStore for $ty {
            async fn create_employee(&self, new: NewEmployee) -> Result<Employee, StoreError> {
                pg_call!(self, "create_employee", conn => employee::insert(&mut *conn, &new))
            }

            async fn employee_by_id(&self, id: i32) -> Result<Employee, StoreError> {
                let row = pg_call!(self, "employee_by_id", conn => employee::find_by_id(&mut *conn, id))?;
                found("employee", row)
            }

            async fn employee_by_email(&self, email: &str) -> Result<Employee, StoreError> {
                let row = pg_call!(self, "employee_by_email", conn => employee::find_by_email(&mut *conn, email))?;
                found("employee", row)
            }

            async fn credentials_by_email(
                &self,
                email: &str,
            ) -> Result<EmployeeCredentials, StoreError> {
                let row = pg_call!(self, "credentials_by_email", conn => employee::find_credentials(&mut *conn, email))?;
                found("employee", row)
            }

            async fn assign_role(
                &self,
                employee_id: i32,
                role_id: i32,
            ) -> Result<Employee, StoreError> {
                let row = pg_call!(self, "assign_role", conn => employee::assign_role(&mut *conn, employee_id, role_id))?;
                found("employee role", row)
            }

            async fn delete_employee(&self, id: i32) -> Result<(), StoreError> {
                let deleted = pg_call!(self, "delete_employee", conn => employee::delete(&mut *conn, id))?;
                removed("employee", deleted)
            }
        }
    };
}

impl_entity_store!(PgStore);
impl_entity_store!(PgUnitOfWork);

#[async_trait]
impl TransactionalStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        bounded("ping", self.timeout, async {
            sqlx::query("SELECT 1").execute(&self.pool).await.map(|_| ())
        })
        .await
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let tx = bounded("begin", self.timeout, self.pool.begin()).await?;
        Ok(Box::new(PgUnitOfWork {
            tx: Mutex::new(tx),
            timeout: self.timeout,
        }))
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let limit = self.timeout;
        bounded("commit", limit, self.tx.into_inner().commit()).await
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        let limit = self.timeout;
        bounded("rollback", limit, self.tx.into_inner().rollback()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_rows_become_not_found() {
        let err = found::<i32>("company", None).unwrap_err();
        assert!(matches!(err, StoreError::NotFound("company")));
        assert!(removed("role", true).is_ok());
        assert!(matches!(removed("role", false), Err(StoreError::NotFound("role"))));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_calls_time_out() {
        let err = bounded("company_by_id", Duration::from_secs(10), async {
            tokio::time::sleep(Duration::from_secs(11)).await;
            Ok::<_, sqlx::Error>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Timeout { operation: "company_by_id", .. }));
    }
}
