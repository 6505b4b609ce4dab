mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn missing_credential_is_rejected_before_upstream() -> Result<()> {
    let server = common::spawn_server().await?;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server.erp)
        .await;

    for route in ["/api/gateways", "/api/tenants/T1", "/api/auth/whoami"] {
        let res = server.client.get(server.url(route)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", route);
        let body: Value = res.json().await?;
        assert_eq!(body["message"], "Authentication required");
    }
    Ok(())
}

#[tokio::test]
async fn login_returns_session_id_from_cookie() -> Result<()> {
    let server = common::spawn_server().await?;
    Mock::given(method("POST"))
        .and(path("/api/method/login"))
        .and(body_json(json!({"usr": "ops@example.com", "pwd": "hunter2"})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "sid=5be1c0ffee; Path=/; HttpOnly")
                .set_body_json(json!({"message": "Logged In", "full_name": "Ops Team"})),
        )
        .expect(1)
        .mount(&server.erp)
        .await;

    let res = server
        .client
        .post(server.url("/api/auth/login"))
        .json(&json!({"username": "ops@example.com", "password": "hunter2"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["data"]["token"], "5be1c0ffee");
    assert_eq!(body["data"]["full_name"], "Ops Team");
    Ok(())
}

#[tokio::test]
async fn login_failure_carries_upstream_message() -> Result<()> {
    let server = common::spawn_server().await?;
    Mock::given(method("POST"))
        .and(path("/api/method/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Invalid login credentials",
            "exc_type": "AuthenticationError"
        })))
        .mount(&server.erp)
        .await;

    let res = server
        .client
        .post(server.url("/api/auth/login"))
        .json(&json!({"username": "ops@example.com", "password": "wrong"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body: Value = res.json().await?;
    assert_eq!(body, json!({"message": "Invalid login credentials"}));
    Ok(())
}

#[tokio::test]
async fn sso_exchange_returns_erp_credential() -> Result<()> {
    let server = common::spawn_server().await?;
    Mock::given(method("POST"))
        .and(path("/api/method/lorawan.api.auth.exchange_sso_token"))
        .and(header("authorization", "Bearer kc.jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"token": "Token ak:as", "api_key": "ak", "api_secret": "as"}
        })))
        .expect(1)
        .mount(&server.erp)
        .await;

    let res = server
        .client
        .post(server.url("/api/auth/sso"))
        .json(&json!({"token": "kc.jwt"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["data"]["token"], "Token ak:as");
    assert_eq!(body["data"]["source"], "token");
    Ok(())
}

#[tokio::test]
async fn sso_exchange_failure_returns_fallback_token() -> Result<()> {
    let server = common::spawn_server().await?;
    Mock::given(method("POST"))
        .and(path("/api/method/lorawan.api.auth.exchange_sso_token"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "exception": "frappe.exceptions.PermissionError: User not provisioned"
        })))
        .mount(&server.erp)
        .await;

    let res = server
        .client
        .post(server.url("/api/auth/sso"))
        .header("authorization", "Bearer kc.jwt")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body: Value = res.json().await?;
    assert_eq!(body["message"], "User not provisioned");
    assert_eq!(body["fallback_token"], "kc.jwt");
    Ok(())
}

#[tokio::test]
async fn refresh_without_sso_configuration_is_unavailable() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server
        .client
        .post(server.url("/api/auth/refresh"))
        .json(&json!({"refresh_token": "rt"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}

#[tokio::test]
async fn whoami_forwards_api_key_verbatim() -> Result<()> {
    let server = common::spawn_server().await?;
    Mock::given(method("GET"))
        .and(path("/api/method/frappe.auth.get_logged_user"))
        .and(header("authorization", "Token ak:as"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ops@example.com"})))
        .expect(1)
        .mount(&server.erp)
        .await;

    let body: Value = server
        .client
        .get(server.url("/api/auth/whoami"))
        .header("authorization", "Token ak:as")
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"], json!({"user": "ops@example.com"}));
    Ok(())
}

#[tokio::test]
async fn refresh_passes_keycloak_tokens_through() -> Result<()> {
    let server = common::spawn_with(|config| {
        config.sso.token_url = Some(format!(
            "{}/realms/lns/protocol/openid-connect/token",
            config.upstream.erp_base_url
        ));
    })
    .await?;
    let tokens = json!({"access_token": "at-2", "refresh_token": "rt-2", "expires_in": 300});
    Mock::given(method("POST"))
        .and(path("/realms/lns/protocol/openid-connect/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokens.clone()))
        .expect(1)
        .mount(&server.erp)
        .await;

    let res = server
        .client
        .post(server.url("/api/auth/refresh"))
        .json(&json!({"refresh_token": "rt-1"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?, tokens);
    Ok(())
}
