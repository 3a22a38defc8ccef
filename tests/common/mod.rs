#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use peopleos_api::app::{router, AppState};
use peopleos_api::auth::{CredentialHasher, KeyRing, SigningKey, TokenIssuer};
use peopleos_api::database::MemoryStore;

pub const ADMIN_EMAIL: &str = "a@acme.com";
pub const ADMIN_PASSWORD: &str = "password123";

/// Router wired to an in-memory store with cheap hashing parameters
pub struct TestApp {
    pub store: MemoryStore,
    pub router: Router,
    pub tokens: Arc<TokenIssuer>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(5))
    }

    pub fn with_timeout(request_timeout: Duration) -> Self {
        let store = MemoryStore::new();
        let hasher = CredentialHasher::new(8, 1, 1).expect("hasher params");
        let tokens = Arc::new(TokenIssuer::new(
            KeyRing::new(SigningKey::new("test", "integration-secret").expect("signing key")),
            chrono::Duration::hours(24),
        ));
        let state = AppState::new(
            Arc::new(store.clone()),
            hasher,
            tokens.clone(),
            request_timeout,
        );
        Self {
            store,
            router: router(state, false),
            tokens,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, json))
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, uri, None, token).await
    }

    pub async fn post(
        &self,
        uri: &str,
        body: Value,
        token: Option<&str>,
    ) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, uri, Some(body), token).await
    }

    pub async fn put(
        &self,
        uri: &str,
        body: Value,
        token: Option<&str>,
    ) -> Result<(StatusCode, Value)> {
        self.send(Method::PUT, uri, Some(body), token).await
    }

    /// Provision a company and return its id
    pub async fn provision(&self, name: &str, admin_email: &str) -> Result<i32> {
        let (status, body) = self
            .post("/companies", company_payload(name, admin_email), None)
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "provisioning failed: {}", body);
        body["data"]["id"]
            .as_i64()
            .map(|id| id as i32)
            .ok_or_else(|| anyhow::anyhow!("missing company id in {}", body))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let (status, body) = self
            .post(
                "/auth/login",
                json!({ "email": email, "password": password }),
                None,
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {}", body);
        body["token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("missing token in {}", body))
    }
}

pub fn company_payload(name: &str, admin_email: &str) -> Value {
    json!({
        "name": name,
        "industry": "Manufacturing",
        "country": "Nigeria",
        "timezone": "Africa/Lagos",
        "admin_email": admin_email,
        "admin_name": "Ada",
        "admin_password": ADMIN_PASSWORD
    })
}

/// Ids of the rows provisioning creates alongside the admin
pub struct Org {
    pub tenant_id: i32,
    pub admin_id: i32,
    pub super_admin_role_id: i32,
    pub department_id: i32,
    pub designation_id: i32,
}

impl TestApp {
    pub async fn org_of(&self, admin_email: &str) -> Result<Org> {
        use peopleos_api::database::EmployeeStore;

        let admin = self.store.employee_by_email(admin_email).await?;
        Ok(Org {
            tenant_id: admin.tenant_id,
            admin_id: admin.id,
            super_admin_role_id: admin
                .role_id
                .ok_or_else(|| anyhow::anyhow!("admin has no role"))?,
            department_id: admin.department_id,
            designation_id: admin.designation_id,
        })
    }

    pub async fn add_role(&self, tenant_id: i32, name: &str) -> Result<i32> {
        use peopleos_api::database::models::NewRole;
        use peopleos_api::database::RoleStore;

        let role = self
            .store
            .create_role(NewRole {
                tenant_id,
                name: name.to_string(),
                description: String::new(),
            })
            .await?;
        Ok(role.id)
    }
}

pub fn employee_payload(org: &Org, email: &str, role_id: i32) -> Value {
    json!({
        "email": email,
        "first_name": "Grace",
        "last_name": "Hopper",
        "password": "password123",
        "department_id": org.department_id,
        "designation_id": org.designation_id,
        "role_id": role_id
    })
}
