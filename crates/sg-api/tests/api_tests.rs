//! Router tests
//!
//! Drive the full router with `tower::ServiceExt::oneshot` and a
//! scripted transport fake, asserting on envelopes, routing, and the
//! exact outbound calls each inbound request produces.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use sg_api::{create_router, AppState};
use sg_common::{ServiceEntry, ServiceRegistry};
use sg_proxy::{
    Forwarder, ForwarderConfig, HealthAggregator, HealthAggregatorConfig, HttpTransport,
    OutboundRequest, OutboundResponse, TransportError,
};

type Script = Box<dyn Fn(&OutboundRequest) -> Result<OutboundResponse, TransportError> + Send + Sync>;

/// Records every outbound call and answers from a scripted closure
struct ScriptedTransport {
    calls: Mutex<Vec<OutboundRequest>>,
    script: Script,
}

impl ScriptedTransport {
    fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(&OutboundRequest) -> Result<OutboundResponse, TransportError> + Send + Sync + 'static,
    {
        Arc::new(Self { calls: Mutex::new(Vec::new()), script: Box::new(script) })
    }

    fn calls(&self) -> Vec<OutboundRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: OutboundRequest) -> Result<OutboundResponse, TransportError> {
        let result = (self.script)(&request);
        self.calls.lock().unwrap().push(request);
        result
    }
}

fn json_ok(body: Value) -> Result<OutboundResponse, TransportError> {
    Ok(OutboundResponse {
        status: 200,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: body.to_string(),
    })
}

fn test_router(transport: Arc<ScriptedTransport>) -> axum::Router {
    let registry = Arc::new(ServiceRegistry::new(vec![ServiceEntry::new(
        "user",
        "http://user-svc:8001",
    )
    .with_endpoints(vec![
        "POST /api/auth/register".to_string(),
        "POST /api/auth/login".to_string(),
        "GET /api/users/me".to_string(),
    ])]));

    let forwarder = Arc::new(Forwarder::new(
        registry.clone(),
        transport.clone(),
        ForwarderConfig::default(),
    ));
    let health = Arc::new(HealthAggregator::new(
        registry.clone(),
        transport,
        HealthAggregatorConfig::default(),
    ));

    create_router(AppState::new(registry, forwarder, health))
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn gateway_health_answers_without_touching_upstreams() {
    let transport = ScriptedTransport::new(|_| json_ok(json!({})));
    let router = test_router(transport.clone());

    let response = router
        .oneshot(Request::builder().uri("/api/health/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "api-gateway");
    assert!(body["version"].is_string());
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn service_list_is_static_metadata_only() {
    let transport = ScriptedTransport::new(|_| json_ok(json!({})));
    let router = test_router(transport.clone());

    let response = router
        .oneshot(Request::builder().uri("/api/services/list/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["services"][0]["name"], "user");
    assert_eq!(body["services"][0]["url"], "http://user-svc:8001");
    assert_eq!(body["services"][0]["endpoints"][1], "POST /api/auth/login");
    assert!(body["gateway_info"]["endpoints"].is_array());
    assert!(transport.calls().is_empty(), "listing must make no upstream calls");
}

#[tokio::test]
async fn unknown_service_renders_404_with_alternatives() {
    let transport = ScriptedTransport::new(|_| json_ok(json!({})));
    let router = test_router(transport.clone());

    let response = router
        .oneshot(Request::builder().uri("/api/payments/refunds").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Service payments not found");
    assert_eq!(body["available_services"], json!(["user"]));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn post_body_is_forwarded_as_json_not_query() {
    let transport = ScriptedTransport::new(|_| json_ok(json!({"token": "t"})));
    let router = test_router(transport.clone());

    let login = json!({"username": "ada", "password": "secret"});
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/user/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(login.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["token"], "t");

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].url, "http://user-svc:8001/auth/login");
    assert_eq!(calls[0].json_body, Some(login));
    assert!(calls[0].query.is_empty());
}

#[tokio::test]
async fn get_query_string_is_forwarded() {
    let transport = ScriptedTransport::new(|_| json_ok(json!({"users": []})));
    let router = test_router(transport.clone());

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/user/users/list?page=2&role=driver")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let calls = transport.calls();
    assert_eq!(calls[0].url, "http://user-svc:8001/users/list");
    assert_eq!(
        calls[0].query,
        vec![
            ("page".to_string(), "2".to_string()),
            ("role".to_string(), "driver".to_string()),
        ]
    );
    assert!(calls[0].json_body.is_none());
}

#[tokio::test]
async fn delete_body_reaches_the_upstream() {
    let transport = ScriptedTransport::new(|_| json_ok(json!({})));
    let router = test_router(transport.clone());

    let response = router
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/user/vehicles/42")
                .header("content-type", "application/json")
                .body(Body::from(json!({"reason": "sold"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(transport.calls()[0].json_body, Some(json!({"reason": "sold"})));
}

#[tokio::test]
async fn service_root_request_hits_the_service_root() {
    let transport = ScriptedTransport::new(|_| json_ok(json!({})));
    let router = test_router(transport.clone());

    router
        .clone()
        .oneshot(Request::builder().uri("/api/user").body(Body::empty()).unwrap())
        .await
        .unwrap();
    router
        .oneshot(Request::builder().uri("/api/user/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].url, "http://user-svc:8001/");
    assert_eq!(calls[1].url, "http://user-svc:8001/");
}

#[tokio::test]
async fn timeout_renders_504_envelope() {
    let transport = ScriptedTransport::new(|_| Err(TransportError::TimedOut));
    let router = test_router(transport);

    let response = router
        .oneshot(Request::builder().uri("/api/user/users/me").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Service timeout");
    assert_eq!(body["message"], "The requested service is taking too long to respond");
    assert!(body.get("available_services").is_none());
}

#[tokio::test]
async fn unreachable_renders_503_envelope() {
    let transport = ScriptedTransport::new(|_| Err(TransportError::Connect));
    let router = test_router(transport);

    let response = router
        .oneshot(Request::builder().uri("/api/user/users/me").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Service unavailable");
    assert_eq!(body["message"], "Cannot connect to the requested service");
}

#[tokio::test]
async fn malformed_json_body_is_rejected_with_400() {
    let transport = ScriptedTransport::new(|_| json_ok(json!({})));
    let router = test_router(transport.clone());

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/user/auth/login")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid JSON");
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn status_endpoint_reports_per_service_health() {
    let transport = ScriptedTransport::new(|request| {
        assert!(request.url.ends_with("/api/health/"));
        json_ok(json!({"status": "healthy"}))
    });
    let router = test_router(transport.clone());

    let response = router
        .oneshot(Request::builder().uri("/api/services/status/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["gateway_status"], "healthy");
    assert_eq!(body["services"][0]["service_name"], "user");
    assert_eq!(body["services"][0]["status"], "healthy");
    assert_eq!(body["services"][0]["data"], json!({"status": "healthy"}));
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn authorization_header_is_relayed_but_host_is_not() {
    let transport = ScriptedTransport::new(|_| json_ok(json!({})));
    let router = test_router(transport.clone());

    router
        .oneshot(
            Request::builder()
                .uri("/api/user/users/me")
                .header("authorization", "Bearer tok")
                .header("host", "gateway.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = transport.calls()[0].headers.clone();
    assert!(headers.iter().any(|(n, v)| n == "authorization" && v == "Bearer tok"));
    assert!(!headers.iter().any(|(n, _)| n.eq_ignore_ascii_case("host")));
}
