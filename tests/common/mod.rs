//! Shared helpers for router-level tests
#![allow(dead_code)]

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use kinship_records::{
    clock::ManualClock,
    config::{
        AuthConfig, EmergencyConfig, LoggingConfig, RateLimitConfig, ServerConfig, ServiceConfig,
        StorageConfig,
    },
    context::AppContext,
    db,
    server::build_router,
};
use serde_json::Value;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-secret-key-0123456789abcdef";
pub const PUBLIC_URL: &str = "https://kin.example.net";

pub struct TestApp {
    pub router: Router,
    pub clock: ManualClock,
    pub ctx: AppContext,
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 20, 8, 0, 0).unwrap()
}

pub fn test_config(rate_limits: bool) -> ServerConfig {
    ServerConfig {
        service: ServiceConfig {
            hostname: "127.0.0.1".to_string(),
            port: 0,
            public_url: PUBLIC_URL.to_string(),
        },
        storage: StorageConfig {
            data_directory: PathBuf::from("./data"),
            database: PathBuf::from(":memory:"),
        },
        authentication: AuthConfig {
            jwt_secret: JWT_SECRET.to_string(),
        },
        emergency: EmergencyConfig {
            cleanup_interval_secs: 3600,
        },
        rate_limit: RateLimitConfig {
            enabled: rate_limits,
            public_rps: 1,
            authenticated_rps: 50,
            burst_size: 10,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            json: false,
        },
    }
}

pub async fn spawn_app_with(config: ServerConfig) -> TestApp {
    let pool = db::create_memory_pool().await.unwrap();
    let clock = ManualClock::new(t0());
    let ctx = AppContext::from_parts(config, pool, Arc::new(clock.clone()));

    TestApp {
        router: build_router(ctx.clone()),
        clock,
        ctx,
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config(false)).await
}

/// Sign a bearer token for `owner_id` with the test secret
pub fn bearer(owner_id: &str) -> String {
    let exp = Utc::now().timestamp() + 3600;
    let token = encode(
        &Header::default(),
        &serde_json::json!({ "id": owner_id, "exp": exp }),
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(owner) = auth {
            builder = builder.header(header::AUTHORIZATION, bearer(owner));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    /// Drive a prepared request through the router
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    /// Issue an unauthenticated request and return the body as text
    pub async fn raw(&self, method: Method, uri: &str) -> String {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Register a family member for `owner` and return its id
    pub async fn add_member(&self, owner: &str, name: &str, relation: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/family",
                Some(owner),
                Some(serde_json::json!({ "name": name, "relation": relation })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "unexpected body: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    /// Add a health record to a member owned by `owner`
    pub async fn add_record(&self, owner: &str, member_id: &str, diagnosis: &str) -> Value {
        let (status, body) = self
            .request(
                Method::POST,
                &format!("/family/{}/records", member_id),
                Some(owner),
                Some(serde_json::json!({
                    "diagnosis": diagnosis,
                    "doctor_name": "Dr. Adeyemi",
                    "doctor_notes": "Carries an inhaler",
                    "medications": "Budesonide",
                    "blood_pressure": { "systolic": 121, "diastolic": 79 },
                    "heart_rate": 70,
                    "visit_date": "2024-12-02T15:30:00Z",
                    "follow_up_date": "2025-02-02T15:30:00Z",
                    "images": ["https://cdn.example.net/peak-flow.jpg"]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "unexpected body: {}", body);
        body
    }
}

/// GET request for an emergency link, as sent from `peer` with optional extra headers
pub fn redemption_request(link: &str, peer: SocketAddr, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(link_path(link));
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let mut request = builder.body(Body::empty()).unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    request
}

/// Split an emergency link into its path (for the router) and secret
pub fn link_path(link: &str) -> String {
    link.strip_prefix(PUBLIC_URL).unwrap().to_string()
}
