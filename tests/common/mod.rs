//! Shared fixtures for the router-level tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use premiads_server::baas::MemoryBaas;
use premiads_server::config::Config;
use premiads_server::payments::{PaymentProvider, ProviderError, ProviderPayment};
use premiads_server::state::AppState;

pub const SERVICE_ROLE_KEY: &str = "service-role-key";
pub const WEBHOOK_SECRET: &str = "webhook-secret";

/// Payment provider answering from a fixed table
#[derive(Default)]
pub struct StubProvider {
    payments: Mutex<HashMap<String, ProviderPayment>>,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn add_payment(&self, id: &str, status: &str, external_reference: Option<&str>) {
        self.payments.lock().unwrap().insert(
            id.to_string(),
            ProviderPayment {
                id: id.to_string(),
                status: status.to_string(),
                status_detail: None,
                external_reference: external_reference.map(str::to_string),
            },
        );
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProvider for StubProvider {
    async fn fetch_payment(&self, payment_id: &str) -> Result<ProviderPayment, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payments
            .lock()
            .unwrap()
            .get(payment_id)
            .cloned()
            .ok_or_else(|| ProviderError::Status {
                status: 404,
                body: r#"{"message":"Payment not found"}"#.to_string(),
            })
    }
}

pub fn config(extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("SUPABASE_URL".into(), "https://project.supabase.co".into());
    vars.insert("SUPABASE_SERVICE_ROLE_KEY".into(), SERVICE_ROLE_KEY.into());
    for (key, value) in extra {
        vars.insert(key.to_string(), value.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

pub struct TestApp {
    pub baas: Arc<MemoryBaas>,
    pub provider: Arc<StubProvider>,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(config(&[]))
    }

    pub fn with_config(config: Config) -> Self {
        let baas = Arc::new(
            MemoryBaas::new().with_unique("mission_submissions", &["user_id", "mission_id"]),
        );
        let provider = Arc::new(StubProvider::default());
        let payment_provider: Arc<dyn PaymentProvider> = provider.clone();
        let state = AppState::new(config, baas.clone(), Some(payment_provider));

        Self {
            baas,
            provider,
            router: premiads_server::build_router(state),
        }
    }

    /// Register `token` for `user_id` with a profile of `user_type`
    pub fn user(&self, token: &str, user_id: &str, user_type: &str) {
        self.baas.register_user(token, user_id);
        self.baas.seed(
            "profiles",
            json!({ "id": user_id, "user_type": user_type, "active": true }),
        );
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: &str) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("DELETE")
            .uri(uri)
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }
}
