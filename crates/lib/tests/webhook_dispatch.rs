//! Integration test: gateway router wired to real HTTP clients that talk to a fake upstream
//! (LINE, weather, completion) served from this test. Each request the fake receives is recorded.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use lib::bot::Dispatcher;
use lib::config::Config;
use lib::gateway::{self, GatewayState};
use lib::line::LineClient;
use lib::llm::CompletionClient;
use lib::weather::WeatherClient;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct Recorded {
    path: String,
    auth: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct Upstream {
    calls: Arc<Mutex<Vec<Recorded>>>,
}

impl Upstream {
    fn record(&self, path: String, headers: &HeaderMap, body: Value) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        self.calls.lock().unwrap().push(Recorded { path, auth, body });
    }

    fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }
}

async fn reply(
    State(up): State<Upstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let failing = body["replyToken"] == "expired";
    up.record("/v2/bot/message/reply".into(), &headers, body);
    if failing {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Invalid reply token" })),
        );
    }
    (StatusCode::OK, Json(json!({})))
}

async fn push(State(up): State<Upstream>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    up.record("/v2/bot/message/push".into(), &headers, body);
    Json(json!({}))
}

async fn profile(
    State(up): State<Upstream>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Json<Value> {
    up.record(format!("/v2/bot/profile/{}", user_id), &headers, Value::Null);
    Json(json!({
        "userId": user_id,
        "displayName": "Ann",
        "pictureUrl": "https://profile.example/ann.png",
        "statusMessage": "hungry"
    }))
}

async fn current_weather(
    State(up): State<Upstream>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let key = headers
        .get("x-rapidapi-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let failing = q.get("q").map(String::as_str) == Some("0,0");
    up.record(
        "/weather/current.json".into(),
        &headers,
        json!({ "q": q.get("q"), "key": key }),
    );
    if failing {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": { "message": "Internal application error." } })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "location": { "name": "Bang Sue", "region": "Bangkok", "country": "Thailand" },
            "current": { "last_updated": "2023-10-01 14:00", "temp_c": 33.5 }
        })),
    )
}

async fn chat_completions(
    State(up): State<Upstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    up.record("/v1/chat/completions".into(), &headers, body);
    Json(json!({
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": " Forty-two. " } }]
    }))
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start fake upstream + gateway with a push target and coordinates configured.
async fn start() -> (String, Upstream) {
    let mut config = Config::default();
    config.push.to = Some("U-push".into());
    config.push.latitude = 1.25;
    config.push.longitude = 2.5;
    start_with(config).await
}

/// Start fake upstream + gateway; returns (gateway base url, upstream recorder).
async fn start_with(config: Config) -> (String, Upstream) {
    let upstream = Upstream::default();
    let fake = Router::new()
        .route("/v2/bot/message/reply", post(reply))
        .route("/v2/bot/message/push", post(push))
        .route("/v2/bot/profile/:user_id", get(profile))
        .route("/weather/current.json", get(current_weather))
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(upstream.clone());
    let up_addr = serve(fake).await;
    let base = format!("http://{}", up_addr);

    let dispatcher = Dispatcher::new(
        Arc::new(LineClient::new(
            Some(format!("{}/v2/bot", base)),
            Some("line-token".into()),
        )),
        Arc::new(WeatherClient::new(
            Some(format!("{}/weather", base)),
            None,
            Some("weather-key".into()),
        )),
        Arc::new(CompletionClient::new(
            Some(format!("{}/v1", base)),
            Some("completion-key".into()),
            "test-model",
            32,
        )),
    );
    let state = GatewayState {
        config: Arc::new(config),
        dispatcher: Arc::new(dispatcher),
    };
    let gw_addr = serve(gateway::router(state)).await;
    (format!("http://{}", gw_addr), upstream)
}

fn webhook(event: Value) -> Value {
    json!({ "destination": "Ubot", "events": [event] })
}

fn text_event(token: &str, text: &str) -> Value {
    json!({
        "type": "message",
        "replyToken": token,
        "source": { "type": "user", "userId": "U1" },
        "timestamp": 1700000000000u64,
        "message": { "type": "text", "id": "m1", "text": text }
    })
}

async fn post_webhook(gw: &str, body: &Value) -> (StatusCode, Value) {
    let res = reqwest::Client::new()
        .post(format!("{}/webhook", gw))
        .json(body)
        .send()
        .await
        .expect("POST /webhook");
    let status = res.status();
    (status, res.json().await.expect("webhook JSON"))
}

#[tokio::test]
async fn menu_keyword_sends_quick_reply_with_bearer_token() {
    let (gw, up) = start().await;
    let (status, out) = post_webhook(&gw, &webhook(text_event("r1", "menu"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(out, json!({ "ok": true, "handled": "menu" }));

    let calls = up.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "/v2/bot/message/reply");
    assert_eq!(calls[0].auth.as_deref(), Some("Bearer line-token"));
    assert_eq!(calls[0].body["replyToken"], "r1");
    let items = calls[0].body["messages"][0]["quickReply"]["items"]
        .as_array()
        .expect("quick reply items");
    let labels: Vec<&str> = items
        .iter()
        .map(|i| i["action"]["label"].as_str().unwrap_or(""))
        .collect();
    assert_eq!(labels, vec!["Sushi", "Tempura", "Send location"]);
}

#[tokio::test]
async fn location_event_reports_weather_for_its_coordinates() {
    let (gw, up) = start().await;
    let event = json!({
        "type": "message",
        "replyToken": "r2",
        "source": { "type": "user", "userId": "U1" },
        "message": {
            "type": "location", "id": "m2", "address": "Bangkok",
            "latitude": 13.75, "longitude": 100.5
        }
    });
    let (status, out) = post_webhook(&gw, &webhook(event)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(out["handled"], "weather");

    let calls = up.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].path, "/weather/current.json");
    assert_eq!(calls[0].body["q"], "13.75,100.5");
    assert_eq!(calls[0].body["key"], "weather-key");
    assert_eq!(calls[1].path, "/v2/bot/message/reply");
    let text = calls[1].body["messages"][0]["text"].as_str().expect("text");
    assert!(text.contains("- region: Bangkok"), "{}", text);
    assert!(text.contains("- temp_c: 33.5 (° C)"), "{}", text);
}

#[tokio::test]
async fn profile_keyword_replies_with_flex_card() {
    let (gw, up) = start().await;
    let (_, out) = post_webhook(&gw, &webhook(text_event("r3", "profile"))).await;
    assert_eq!(out["handled"], "profile");

    let calls = up.calls();
    assert_eq!(calls[0].path, "/v2/bot/profile/U1");
    assert_eq!(calls[0].auth.as_deref(), Some("Bearer line-token"));
    let msg = &calls[1].body["messages"][0];
    assert_eq!(msg["type"], "flex");
    assert_eq!(msg["altText"], "Profile of Ann");
    assert_eq!(msg["contents"]["hero"]["url"], "https://profile.example/ann.png");
}

#[tokio::test]
async fn ask_prefix_uses_completion_service() {
    let (gw, up) = start().await;
    let (_, out) = post_webhook(&gw, &webhook(text_event("r4", "ask meaning of life"))).await;
    assert_eq!(out["handled"], "ask");

    let calls = up.calls();
    assert_eq!(calls[0].path, "/v1/chat/completions");
    assert_eq!(calls[0].auth.as_deref(), Some("Bearer completion-key"));
    assert_eq!(calls[0].body["model"], "test-model");
    assert_eq!(calls[0].body["messages"][0]["content"], "meaning of life");
    assert_eq!(calls[1].body["messages"][0]["text"], "Forty-two.");
}

#[tokio::test]
async fn postback_data_routes_to_menu() {
    let (gw, up) = start().await;
    let event = json!({
        "type": "postback",
        "replyToken": "r5",
        "source": { "type": "user", "userId": "U1" },
        "postback": { "data": "action=menu" }
    });
    let (_, out) = post_webhook(&gw, &webhook(event)).await;
    assert_eq!(out["handled"], "menu");
    assert_eq!(up.calls().len(), 1);
}

#[tokio::test]
async fn unrecognized_event_makes_no_outbound_call() {
    let (gw, up) = start().await;
    let (status, out) = post_webhook(&gw, &webhook(text_event("r6", "good morning"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(out, json!({ "ok": true, "handled": null }));

    let (status, _) = post_webhook(&gw, &json!({ "destination": "Ubot", "events": [] })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(up.calls().is_empty());
}

#[tokio::test]
async fn upstream_failure_is_still_200() {
    let (gw, up) = start().await;
    let (status, out) = post_webhook(&gw, &webhook(text_event("expired", "echo hi"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(out["ok"], false);
    let err = out["error"].as_str().expect("error text");
    assert!(err.contains("400"), "{}", err);
    assert!(err.contains("Invalid reply token"), "{}", err);
    assert_eq!(up.calls().len(), 1);
}

#[tokio::test]
async fn undecodable_body_is_still_200() {
    let (gw, up) = start().await;
    let res = reqwest::Client::new()
        .post(format!("{}/webhook", gw))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("POST /webhook");
    assert_eq!(res.status(), StatusCode::OK);
    let out: Value = res.json().await.expect("JSON");
    assert_eq!(out["ok"], false);
    assert!(up.calls().is_empty());
}

#[tokio::test]
async fn oversized_body_is_still_200() {
    let (gw, up) = start().await;
    let body = json!({ "events": [], "pad": "x".repeat(3 * 1024 * 1024) });
    let (status, out) = post_webhook(&gw, &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(out["ok"], false);
    let err = out["error"].as_str().expect("error text");
    assert!(err.starts_with("unreadable webhook body"), "{}", err);
    assert!(up.calls().is_empty());
}

#[tokio::test]
async fn health_and_hello_respond() {
    let (gw, up) = start().await;
    let client = reqwest::Client::new();
    let res = client.get(format!("{}/", gw)).send().await.expect("GET /");
    assert_eq!(res.status(), StatusCode::OK);
    let health: Value = res.json().await.expect("health JSON");
    assert_eq!(health, json!({ "runtime": "running", "port": 8080 }));

    let hello = client
        .get(format!("{}/hello", gw))
        .send()
        .await
        .expect("GET /hello");
    assert_eq!(hello.status(), StatusCode::OK);
    assert_eq!(hello.text().await.expect("hello body"), "Hello World!");
    assert!(up.calls().is_empty());
}

#[tokio::test]
async fn push_weather_uses_configured_target_and_coordinates() {
    let (gw, up) = start().await;
    let res = reqwest::Client::new()
        .post(format!("{}/push/weather", gw))
        .send()
        .await
        .expect("POST /push/weather");
    assert_eq!(res.status(), StatusCode::OK);
    let out: Value = res.json().await.expect("JSON");
    assert_eq!(out["ok"], true);

    let calls = up.calls();
    assert_eq!(calls[0].body["q"], "1.25,2.5");
    assert_eq!(calls[1].path, "/v2/bot/message/push");
    assert_eq!(calls[1].body["to"], "U-push");
    assert_eq!(calls[1].body["messages"][0]["text"], out["text"]);
}

#[tokio::test]
async fn push_weather_body_overrides_config() {
    let (gw, up) = start().await;
    let res = reqwest::Client::new()
        .post(format!("{}/push/weather", gw))
        .json(&json!({ "to": "U-other", "latitude": -33.5, "longitude": 151.25 }))
        .send()
        .await
        .expect("POST /push/weather");
    assert_eq!(res.status(), StatusCode::OK);

    let calls = up.calls();
    assert_eq!(calls[0].body["q"], "-33.5,151.25");
    assert_eq!(calls[1].body["to"], "U-other");
}

#[tokio::test]
async fn push_weather_without_target_is_400() {
    let (gw, up) = start_with(Config::default()).await;
    let res = reqwest::Client::new()
        .post(format!("{}/push/weather", gw))
        .send()
        .await
        .expect("POST /push/weather");
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let out: Value = res.json().await.expect("JSON");
    assert_eq!(out["ok"], false);
    assert_eq!(out["error"], "push target not configured (push.to)");
    assert!(up.calls().is_empty());
}

#[tokio::test]
async fn push_weather_rejects_malformed_body() {
    let (gw, up) = start().await;
    let res = reqwest::Client::new()
        .post(format!("{}/push/weather", gw))
        .header("content-type", "application/json")
        .body("{\"latitude\":")
        .send()
        .await
        .expect("POST /push/weather");
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let out: Value = res.json().await.expect("JSON");
    assert_eq!(out["ok"], false);
    assert!(up.calls().is_empty());
}

#[tokio::test]
async fn push_weather_upstream_failure_is_502() {
    let (gw, up) = start().await;
    let res = reqwest::Client::new()
        .post(format!("{}/push/weather", gw))
        .json(&json!({ "latitude": 0.0, "longitude": 0.0 }))
        .send()
        .await
        .expect("POST /push/weather");
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let out: Value = res.json().await.expect("JSON");
    assert_eq!(out["ok"], false);
    let err = out["error"].as_str().expect("error text");
    assert!(err.contains("500"), "{}", err);

    let calls = up.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "/weather/current.json");
}
