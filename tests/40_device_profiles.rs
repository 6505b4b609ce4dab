mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use common::SESSION;

const CREATE: &str = "/api/method/lorawan.api.device_profile.create";

async fn create_with(body: Value, expected_upstream: Value) -> Result<Value> {
    let server = common::spawn_server().await?;
    Mock::given(method("POST"))
        .and(path(CREATE))
        .and(body_json(expected_upstream))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"name": "DP-1", "chirpstack_id": "0b4f"}
        })))
        .expect(1)
        .mount(&server.erp)
        .await;

    let res = server
        .client
        .post(server.url("/api/device-profiles"))
        .header("authorization", SESSION)
        .json(&body)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    Ok(res.json().await?)
}

#[tokio::test]
async fn region_gets_trailing_newline() -> Result<()> {
    create_with(
        json!({"profile_name": "Class A", "region": "EU868"}),
        json!({"profile_name": "Class A", "region": "EU868\n"}),
    )
    .await?;
    Ok(())
}

#[tokio::test]
async fn region_with_newline_passes_through() -> Result<()> {
    create_with(
        json!({"profile_name": "Class A", "region": "US915\n"}),
        json!({"profile_name": "Class A", "region": "US915\n"}),
    )
    .await?;
    Ok(())
}

#[tokio::test]
async fn missing_region_uses_default() -> Result<()> {
    let body = create_with(
        json!({"profile_name": "Class C"}),
        json!({"profile_name": "Class C", "region": "AS923\n"}),
    )
    .await?;
    // chirpstack_id already present, so no re-fetch happens
    assert_eq!(body["data"]["chirpstack_id"], "0b4f");
    Ok(())
}

#[tokio::test]
async fn update_normalizes_region_only_when_present() -> Result<()> {
    let server = common::spawn_server().await?;
    Mock::given(method("PUT"))
        .and(path("/api/resource/LoRaWAN%20Device%20Profile/DP-1"))
        .and(body_json(json!({"data": {"region": "IN865\n"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"name": "DP-1", "region": "IN865\n"}})))
        .expect(1)
        .mount(&server.erp)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/resource/LoRaWAN%20Device%20Profile/DP-2"))
        .and(body_json(json!({"data": {"profile_name": "Renamed"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"name": "DP-2"}})))
        .expect(1)
        .mount(&server.erp)
        .await;

    let res = server
        .client
        .put(server.url("/api/device-profiles/DP-1"))
        .header("authorization", SESSION)
        .json(&json!({"region": "IN865"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .client
        .put(server.url("/api/device-profiles/DP-2"))
        .header("authorization", SESSION)
        .json(&json!({"profile_name": "Renamed"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["name"], "DP-2");
    Ok(())
}
