mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{employee_payload, TestApp, ADMIN_EMAIL, ADMIN_PASSWORD};

#[tokio::test]
async fn super_admin_onboards_employee() -> Result<()> {
    let app = TestApp::new();
    app.provision("Acme", ADMIN_EMAIL).await?;
    let org = app.org_of(ADMIN_EMAIL).await?;
    let engineer = app.add_role(org.tenant_id, "Engineer").await?;
    let token = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await?;

    let (status, body) = app
        .post(
            "/api/employees",
            employee_payload(&org, "Grace@Acme.com", engineer),
            Some(&token),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["email"], "grace@acme.com");
    assert_eq!(body["data"]["role"], "Engineer");
    assert_eq!(body["data"]["tenant_id"], org.tenant_id);
    assert_eq!(body["data"]["name"], "Grace Hopper");

    let token = app.login("grace@acme.com", "password123").await?;
    assert_eq!(app.tokens.verify(&token)?.role, "Engineer");
    Ok(())
}

#[tokio::test]
async fn non_admins_are_forbidden() -> Result<()> {
    let app = TestApp::new();
    app.provision("Acme", ADMIN_EMAIL).await?;
    let org = app.org_of(ADMIN_EMAIL).await?;
    let engineer = app.add_role(org.tenant_id, "Engineer").await?;
    let admin_token = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    app.post(
        "/api/employees",
        employee_payload(&org, "grace@acme.com", engineer),
        Some(&admin_token),
    )
    .await?;

    let token = app.login("grace@acme.com", "password123").await?;
    let (status, body) = app
        .post(
            "/api/employees",
            employee_payload(&org, "linus@acme.com", engineer),
            Some(&token),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = app
        .post(
            "/api/employees",
            employee_payload(&org, "linus@acme.com", engineer),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.store.counts().await.employees, 2);
    Ok(())
}

#[tokio::test]
async fn duplicate_email_conflicts() -> Result<()> {
    let app = TestApp::new();
    app.provision("Acme", ADMIN_EMAIL).await?;
    let org = app.org_of(ADMIN_EMAIL).await?;
    let token = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await?;

    let (status, _) = app
        .post(
            "/api/employees",
            employee_payload(&org, ADMIN_EMAIL, org.super_admin_role_id),
            Some(&token),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(app.store.counts().await.employees, 1);
    Ok(())
}

#[tokio::test]
async fn role_changes_stay_inside_the_tenant() -> Result<()> {
    let app = TestApp::new();
    app.provision("Acme", ADMIN_EMAIL).await?;
    app.provision("Globex", "g@globex.com").await?;
    let acme = app.org_of(ADMIN_EMAIL).await?;
    let globex = app.org_of("g@globex.com").await?;
    let engineer = app.add_role(acme.tenant_id, "Engineer").await?;
    let token = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await?;

    let (_, body) = app
        .post(
            "/api/employees",
            employee_payload(&acme, "grace@acme.com", engineer),
            Some(&token),
        )
        .await?;
    let grace = body["data"]["id"].as_i64().unwrap_or_default();

    let (status, body) = app
        .put(
            &format!("/api/employees/{}/role", grace),
            json!({ "role_id": acme.super_admin_role_id }),
            Some(&token),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "Super Admin");

    let (status, _) = app
        .put(
            &format!("/api/employees/{}/role", grace),
            json!({ "role_id": globex.super_admin_role_id }),
            Some(&token),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .put(
            &format!("/api/employees/{}/role", globex.admin_id),
            json!({ "role_id": acme.super_admin_role_id }),
            Some(&token),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn foreign_references_fail_validation() -> Result<()> {
    let app = TestApp::new();
    app.provision("Acme", ADMIN_EMAIL).await?;
    app.provision("Globex", "g@globex.com").await?;
    let acme = app.org_of(ADMIN_EMAIL).await?;
    let globex = app.org_of("g@globex.com").await?;
    let token = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await?;

    let mut payload = employee_payload(&acme, "grace@acme.com", acme.super_admin_role_id);
    payload["department_id"] = json!(globex.department_id);
    let (status, body) = app.post("/api/employees", payload, Some(&token)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["department_id"].is_string());
    Ok(())
}

#[tokio::test]
async fn reference_lookup_outage_is_unavailable() -> Result<()> {
    let app = TestApp::new();
    app.provision("Acme", ADMIN_EMAIL).await?;
    let org = app.org_of(ADMIN_EMAIL).await?;
    let token = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    app.store.inject_failure("role_by_id");

    let (status, body) = app
        .post(
            "/api/employees",
            employee_payload(&org, "grace@acme.com", org.super_admin_role_id),
            Some(&token),
        )
        .await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    assert_eq!(app.store.counts().await.employees, 1);
    Ok(())
}
