use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::auth::{CredentialHasher, Identity, JwtError, PasswordError, TokenIssuer};
use crate::database::models::DEFAULT_ROLE_LABEL;
use crate::database::{StoreError, TransactionalStore};
use crate::types::LoginRequest;
use crate::validation::normalize_email;

/// The only message a failed login ever reports
pub const INVALID_CREDENTIALS: &str = "invalid email or password";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Storage(StoreError),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Hashing(PasswordError),
}

/// Exchanges employee credentials for a session token. Never writes.
pub struct AuthService {
    store: Arc<dyn TransactionalStore>,
    hasher: CredentialHasher,
    tokens: Arc<TokenIssuer>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn TransactionalStore>,
        hasher: CredentialHasher,
        tokens: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<String, AuthError> {
        let email = normalize_email(&request.email);

        let credentials = match self.store.credentials_by_email(&email).await {
            Ok(credentials) => Some(credentials),
            Err(StoreError::NotFound(_)) => None,
            Err(err) => return Err(AuthError::Storage(err)),
        };

        // Unknown emails still pay for one verification
        let stored_hash = credentials.as_ref().map(|c| c.password_hash.clone());
        let matches = match self
            .hasher
            .verify_blocking(request.password.clone(), stored_hash)
            .await
        {
            Ok(matches) => matches,
            Err(PasswordError::MalformedHash(reason)) => {
                error!(%reason, "Stored password hash is unreadable");
                false
            }
            Err(err) => return Err(AuthError::Hashing(err)),
        };

        let credentials = match credentials {
            Some(credentials) if matches => credentials,
            _ => {
                warn!("Login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let token = self.tokens.issue(Identity {
            id: credentials.employee_id,
            tenant_id: credentials.tenant_id,
            email: credentials.email,
            role: credentials
                .role_name
                .unwrap_or_else(|| DEFAULT_ROLE_LABEL.to_string()),
        })?;

        info!(
            employee_id = credentials.employee_id,
            tenant_id = credentials.tenant_id,
            "Login succeeded"
        );
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::auth::{KeyRing, SigningKey};
    use crate::database::models::{
        NewCompany, NewDepartment, NewDesignation, NewEmployee, NewRole, NewTenant,
    };
    use crate::database::{
        CompanyStore, DepartmentStore, DesignationStore, EmployeeStore, MemoryStore, RoleStore,
        TenantStore,
    };
    use crate::types::{DepartmentStatus, EmployeeStatus};

    struct Fixture {
        store: MemoryStore,
        service: AuthService,
        tokens: Arc<TokenIssuer>,
        hasher: CredentialHasher,
        tenant_id: i32,
        department_id: i32,
        designation_id: i32,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let hasher = CredentialHasher::new(8, 1, 1).unwrap();
        let tokens = Arc::new(TokenIssuer::new(
            KeyRing::new(SigningKey::new("test", "test-secret").unwrap()),
            Duration::hours(24),
        ));

        let company = store
            .create_company(NewCompany {
                name: "Acme".to_string(),
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

        let service = AuthService::new(Arc::new(store.clone()), hasher.clone(), tokens.clone());
        Fixture {
            store,
            service,
            tokens,
            hasher,
            tenant_id: tenant.id,
            department_id: department.id,
            designation_id: designation.id,
        }
    }

    impl Fixture {
        async fn hire(&self, email: &str, password_hash: String) -> i32 {
            self.store
                .create_employee(NewEmployee {
                    tenant_id: self.tenant_id,
                    first_name: "Ada".to_string(),
                    last_name: String::new(),
                    email: email.to_string(),
                    phone: None,
                    password_hash,
                    department_id: self.department_id,
                    designation_id: self.designation_id,
                    manager_id: None,
                    status: EmployeeStatus::Active,
                    hire_date: None,
                })
                .await
                .unwrap()
                .id
        }
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn issues_token_with_assigned_role() {
        let fx = fixture().await;
        let id = fx
            .hire("a@acme.com", fx.hasher.hash("password123").unwrap())
            .await;
        let role = fx
            .store
            .create_role(NewRole {
                tenant_id: fx.tenant_id,
                name: "Super Admin".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();
        fx.store.assign_role(id, role.id).await.unwrap();

        let token = fx
            .service
            .login(&login("A@Acme.com", "password123"))
            .await
            .unwrap();
        let claims = fx.tokens.verify(&token).unwrap();
        assert_eq!(claims.id, id);
        assert_eq!(claims.tenant_id, fx.tenant_id);
        assert_eq!(claims.email, "a@acme.com");
        assert_eq!(claims.role, "Super Admin");
    }

    #[tokio::test]
    async fn role_defaults_to_employee() {
        let fx = fixture().await;
        fx.hire("b@acme.com", fx.hasher.hash("password123").unwrap())
            .await;

        let token = fx
            .service
            .login(&login("b@acme.com", "password123"))
            .await
            .unwrap();
        assert_eq!(fx.tokens.verify(&token).unwrap().role, DEFAULT_ROLE_LABEL);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let fx = fixture().await;
        fx.hire("a@acme.com", fx.hasher.hash("password123").unwrap())
            .await;

        let wrong = fx
            .service
            .login(&login("a@acme.com", "nope-nope"))
            .await
            .unwrap_err();
        let unknown = fx
            .service
            .login(&login("ghost@acme.com", "password123"))
            .await
            .unwrap_err();

        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong.to_string(), INVALID_CREDENTIALS);
        assert_eq!(unknown.to_string(), INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn malformed_stored_hash_is_a_rejection() {
        let fx = fixture().await;
        fx.hire("a@acme.com", "garbage".to_string()).await;

        let err = fx
            .service
            .login(&login("a@acme.com", "password123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn storage_failure_is_not_a_credential_error() {
        let fx = fixture().await;
        fx.store.inject_failure("credentials_by_email");

        let err = fx
            .service
            .login(&login("a@acme.com", "password123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Storage(StoreError::Unavailable(_))));
    }
}
