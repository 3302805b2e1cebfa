//! HTTP API tests against a live server on an ephemeral port

use serde_json::{json, Value};
use sleepy_server::{
    dglab_controller::DglabSettings,
    push_notifier::PushNotifier,
    state::{AppConfig, AppState},
    state_store::StateStore,
    status_catalog::StatusCatalog,
    web_api,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "test-secret";

struct TestServer {
    base: String,
    state: AppState,
    client: reqwest::Client,
    _dir: TempDir,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get_json(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn query(&self) -> Value {
        self.get_json("/query").await.1
    }
}

async fn spawn_with(configure: impl FnOnce(&mut AppConfig)) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig {
        secret: SECRET.to_string(),
        data_path: dir.path().join("data.json"),
        ..AppConfig::default()
    };
    configure(&mut config);

    let store = Arc::new(
        StateStore::load(config.data_path.clone(), config.store_options())
            .await
            .unwrap(),
    );
    let state = AppState::new(config, store, StatusCatalog::builtin(), PushNotifier::new(""));
    let app = web_api::create_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestServer {
        base: format!("http://{}", addr),
        state,
        client: reqwest::Client::builder().no_proxy().build().unwrap(),
        _dir: dir,
    }
}

async fn spawn() -> TestServer {
    spawn_with(|_| {}).await
}

#[tokio::test]
async fn test_query_is_public() {
    let server = spawn().await;
    let (status, body) = server.get_json("/query").await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], 0);
    assert_eq!(body["info"]["name"], "Awake");
    assert_eq!(body["timezone"], "Asia/Shanghai");
    assert_eq!(body["device_status_slice"], 30);
    assert_eq!(body["device"], json!({}));
}

#[tokio::test]
async fn test_status_list() {
    let server = spawn().await;
    let (status, body) = server.get_json("/status_list").await;

    assert_eq!(status, 200);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[1]["id"], 1);
    assert!(body[1]["desc"].is_string());
}

#[tokio::test]
async fn test_missing_secret_is_rejected() {
    let server = spawn().await;
    let (status, body) = server.get_json("/set?status=1").await;

    assert_eq!(status, 401);
    assert_eq!(
        body,
        json!({"success": false, "code": "not authorized", "message": "wrong secret"})
    );
    assert_eq!(server.query().await["status"], 0);
}

#[tokio::test]
async fn test_secret_channels() {
    let server = spawn().await;

    let (status, body) = server
        .get_json(&format!("/set?status=1&secret={}", SECRET))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"success": true, "code": "OK", "set_to": 1}));

    let resp = server
        .client
        .get(server.url("/set?status=0"))
        .header("Sleepy-Secret", SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = server
        .client
        .get(server.url("/set?status=1"))
        .bearer_auth(SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = server
        .client
        .get(server.url("/set?status=0"))
        .header("Authorization", "Bearer nope")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert_eq!(server.query().await["status"], 1);
}

#[tokio::test]
async fn test_set_rejects_non_integer() {
    let server = spawn().await;
    let (status, body) = server
        .get_json(&format!("/set?status=abc&secret={}", SECRET))
        .await;

    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "bad request");
}

#[tokio::test]
async fn test_unknown_status_falls_back() {
    let server = spawn().await;
    server
        .get_json(&format!("/set?status=9&secret={}", SECRET))
        .await;

    let body = server.query().await;
    assert_eq!(body["status"], 9);
    assert_eq!(body["info"]["id"], -1);
    assert_eq!(body["info"]["name"], "[unknown]");
    assert_eq!(body["info"]["color"], "error");
}

#[tokio::test]
async fn test_device_lifecycle() {
    let server = spawn_with(|c| c.auto_switch_status = false).await;

    // secret in the body, wrong secret in the query: body wins
    let resp = server
        .client
        .post(server.url("/device/set?secret=wrong"))
        .json(&json!({
            "secret": SECRET,
            "id": "laptop",
            "show_name": "Laptop",
            "using": true,
            "app_name": "Editor"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (status, _) = server
        .get_json(&format!(
            "/device/set?id=phone&show_name=Phone&using=false&app_name=Music&secret={}",
            SECRET
        ))
        .await;
    assert_eq!(status, 200);

    let device = &server.query().await["device"];
    assert_eq!(device["laptop"]["app_name"], "Editor");
    assert_eq!(device["phone"]["using"], false);

    let (status, body) = server
        .get_json(&format!("/device/remove?id=tablet&secret={}", SECRET))
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], "not found");

    let (status, _) = server
        .get_json(&format!("/device/remove?id=phone&secret={}", SECRET))
        .await;
    assert_eq!(status, 200);
    assert!(server.query().await["device"].get("phone").is_none());

    let (status, _) = server
        .get_json(&format!("/device/clear?secret={}", SECRET))
        .await;
    assert_eq!(status, 200);
    assert_eq!(server.query().await["device"], json!({}));
}

#[tokio::test]
async fn test_device_set_bad_params() {
    let server = spawn().await;
    let (status, body) = server
        .get_json(&format!(
            "/device/set?id=x&show_name=X&using=perhaps&app_name=A&secret={}",
            SECRET
        ))
        .await;

    assert_eq!(status, 400);
    assert_eq!(body["code"], "bad request");
}

#[tokio::test]
async fn test_device_activity_switches_status() {
    let server = spawn().await;
    server
        .get_json(&format!(
            "/device/set?id=pc&show_name=PC&using=false&app_name=Idle&secret={}",
            SECRET
        ))
        .await;
    assert_eq!(server.query().await["status"], 1);

    server
        .get_json(&format!(
            "/device/set?id=pc&show_name=PC&using=true&app_name=Game&secret={}",
            SECRET
        ))
        .await;
    assert_eq!(server.query().await["status"], 0);
}

#[tokio::test]
async fn test_private_mode_hides_devices() {
    let server = spawn().await;
    server
        .get_json(&format!(
            "/device/set?id=d1&show_name=D1&using=true&app_name=App&secret={}",
            SECRET
        ))
        .await;

    let (status, _) = server
        .get_json(&format!("/device/private_mode?private=true&secret={}", SECRET))
        .await;
    assert_eq!(status, 200);
    assert_eq!(server.query().await["device"], json!({}));
    assert_eq!(
        server.state.store.read(|d| d.device_status.len()).await,
        1
    );

    server
        .get_json(&format!("/device/private_mode?private=false&secret={}", SECRET))
        .await;
    assert_eq!(server.query().await["device"]["d1"]["app_name"], "App");

    let (status, body) = server
        .get_json(&format!("/device/private_mode?private=maybe&secret={}", SECRET))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "invalid request");
}

#[tokio::test]
async fn test_save_data_writes_file() {
    let server = spawn().await;
    server
        .get_json(&format!("/set?status=1&secret={}", SECRET))
        .await;

    let (status, body) = server
        .get_json(&format!("/save_data?secret={}", SECRET))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], 1);

    let raw = std::fs::read_to_string(server.state.store.path()).unwrap();
    let saved: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(saved["status"], 1);
}

#[tokio::test]
async fn test_metrics_count_requests() {
    let server = spawn().await;
    server.query().await;
    server.query().await;

    let (status, body) = server.get_json("/metrics").await;
    assert_eq!(status, 200);
    assert_eq!(body["total"]["/query"], 2);
    assert_eq!(body["today"]["/query"], 2);
}

#[tokio::test]
async fn test_unknown_paths_not_counted() {
    let server = spawn().await;
    for i in 0..3 {
        let resp = server
            .client
            .get(server.url(&format!("/random-{}", i)))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    }
    server.query().await;

    let (_, body) = server.get_json("/metrics").await;
    let total = body["total"].as_object().unwrap();
    assert_eq!(total["/query"], 1);
    assert!(total.keys().all(|k| !k.starts_with("/random")));
}

#[tokio::test]
async fn test_metrics_route_disabled() {
    let server = spawn_with(|c| c.metrics_enabled = false).await;
    let resp = server.client.get(server.url("/metrics")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_none_returns_no_content() {
    let server = spawn().await;
    let resp = server.client.get(server.url("/none")).send().await.unwrap();
    assert_eq!(resp.status(), 204);
}

#[tokio::test]
async fn test_events_first_frame_is_update() {
    let server = spawn().await;
    let mut resp = server.client.get(server.url("/events")).send().await.unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "text/event-stream");
    assert_eq!(resp.headers()["x-accel-buffering"], "no");

    let chunk = resp.chunk().await.unwrap().unwrap();
    let text = String::from_utf8_lossy(&chunk);
    assert!(text.starts_with("event: update\ndata: "), "got {:?}", text);
    assert!(text.contains("\"last_updated\""));
}

#[tokio::test]
async fn test_button_fire_mode() {
    let actuator = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/game/all/action/fire"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&actuator)
        .await;

    let server = spawn().await;
    server
        .state
        .store
        .set_dglab_settings(DglabSettings {
            url: actuator.uri(),
            strength: 20,
            duration: 3,
            fire: true,
        })
        .await;

    let resp = server.client.post(server.url("/button1")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.text().await.unwrap(),
        "Message sent\nActuation complete, strength 20, duration 3s"
    );
}

#[tokio::test]
async fn test_button_failure_still_200() {
    let actuator = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&actuator)
        .await;

    let server = spawn().await;
    server
        .state
        .store
        .set_dglab_settings(DglabSettings {
            url: actuator.uri(),
            strength: 20,
            duration: 3,
            fire: true,
        })
        .await;

    let resp = server.client.post(server.url("/button1")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp
        .text()
        .await
        .unwrap()
        .starts_with("Message sent\nActuation failed, error: "));
}

#[tokio::test]
async fn test_button_can_require_secret() {
    let server = spawn_with(|c| c.button_requires_secret = true).await;
    let resp = server.client.post(server.url("/button1")).send().await.unwrap();
    assert_eq!(resp.status(), 401);
}
