pub mod company;
pub mod department;
pub mod designation;
pub mod employee;
pub mod role;
pub mod tenant;

pub use company::{Company, CompanyChanges, NewCompany};
pub use department::{Department, DepartmentChanges, NewDepartment};
pub use designation::{Designation, DesignationChanges, NewDesignation};
pub use employee::{Employee, EmployeeCredentials, NewEmployee};
pub use role::{NewRole, Role, DEFAULT_ROLE_LABEL, SUPER_ADMIN_ROLE};
pub use tenant::{NewTenant, Tenant};
