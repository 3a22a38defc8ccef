use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use thiserror::Error;
use tokio::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{CredentialHasher, JwtError, PasswordError, TokenIssuer};
use crate::config::AppConfig;
use crate::database::TransactionalStore;
use crate::error::ApiError;
use crate::handlers;
use crate::middleware::jwt_auth_middleware;
use crate::services::{AuthService, CompanyService, EmployeeService, ProvisioningService};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("password hasher: {0}")]
    Password(#[from] PasswordError),

    #[error("token issuer: {0}")]
    Jwt(#[from] JwtError),
}

/// Shared handles injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TransactionalStore>,
    pub provisioning: Arc<ProvisioningService>,
    pub companies: Arc<CompanyService>,
    pub auth: Arc<AuthService>,
    pub employees: Arc<EmployeeService>,
    pub tokens: Arc<TokenIssuer>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(
        store: Arc<dyn TransactionalStore>,
        hasher: CredentialHasher,
        tokens: Arc<TokenIssuer>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            provisioning: Arc::new(ProvisioningService::new(store.clone(), hasher.clone())),
            companies: Arc::new(CompanyService::new(store.clone())),
            auth: Arc::new(AuthService::new(store.clone(), hasher.clone(), tokens.clone())),
            employees: Arc::new(EmployeeService::new(store.clone(), hasher)),
            store,
            tokens,
            request_timeout,
        }
    }

    pub fn from_config(
        store: Arc<dyn TransactionalStore>,
        config: &AppConfig,
    ) -> Result<Self, StartupError> {
        let hasher = CredentialHasher::from_config(&config.security)?;
        let tokens = Arc::new(TokenIssuer::from_config(&config.security)?);
        Ok(Self::new(store, hasher, tokens, config.server.request_timeout()))
    }

    /// Deadline for a request that starts now
    pub fn deadline(&self) -> Instant {
        Instant::now() + self.request_timeout
    }

    /// Run `fut` under the request timeout, mapping its error for HTTP
    pub async fn bounded<T, E>(&self, fut: impl Future<Output = Result<T, E>>) -> Result<T, ApiError>
    where
        E: Into<ApiError>,
    {
        match tokio::time::timeout(self.request_timeout, fut).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(ApiError::gateway_timeout("Request processing timed out")),
        }
    }
}

/// Build the application router
pub fn router(state: AppState, enable_cors: bool) -> Router {
    let app = Router::new()
        // Public
        .route("/health", get(handlers::health::health))
        .merge(company_routes())
        .merge(auth_public_routes())
        // Protected API
        .merge(protected_routes(state.clone()))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

fn company_routes() -> Router<AppState> {
    use handlers::companies;

    Router::new()
        .route(
            "/companies",
            post(companies::create_company).get(companies::find_company),
        )
        .route(
            "/companies/:id",
            get(companies::get_company)
                .put(companies::update_company)
                .delete(companies::delete_company),
        )
}

fn auth_public_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(handlers::auth::login))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use handlers::employees;

    Router::new()
        .route("/api/auth/whoami", get(handlers::auth::whoami))
        .route("/api/employees", post(employees::create_employee))
        .route("/api/employees/:id/role", put(employees::assign_role))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}
