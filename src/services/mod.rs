pub mod auth_service;
pub mod company_service;
pub mod employee_service;
pub mod provisioning;

pub use auth_service::{AuthError, AuthService, INVALID_CREDENTIALS};
pub use company_service::{CompanyError, CompanyService};
pub use employee_service::{EmployeeError, EmployeeService};
pub use provisioning::{ProvisioningError, ProvisioningService, ProvisioningStep};
