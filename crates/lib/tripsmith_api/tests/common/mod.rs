//! Shared harness: in-memory store, canned generator, request helpers.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use tripsmith_api::config::ApiConfig;
use tripsmith_api::{AppState, router};
use tripsmith_core::auth::{AuthConfig, AuthSessionService};
use tripsmith_core::itinerary::config::ProviderKind;
use tripsmith_core::itinerary::{
    GenerationConfig, GenerationError, ItineraryGenerationService, TextGenerator,
};
use tripsmith_core::store::MemoryStore;
use tripsmith_core::trips::TripService;

pub const THREE_DAYS: &str = r#"Sure! Here is the plan:
[
  {"date": "2020-01-01", "title": "Arrival", "description": "Settle in", "activities": [
    {"time": "03:00 PM", "title": "Check in", "type": "accommodation", "price": 120}
  ]},
  {"title": "Museums", "description": "Art day", "activities": []},
  {"title": "Food", "description": "Markets", "activities": []}
]"#;

/// Replies with fixed text.
pub struct CannedGenerator(pub &'static str);

#[async_trait]
impl TextGenerator for CannedGenerator {
    fn name(&self) -> &str {
        "canned"
    }

    async fn generate_text(&self, _prompt: &str) -> Result<String, GenerationError> {
        Ok(self.0.to_string())
    }
}

pub fn app_with(reply: &'static str) -> Router {
    let store = Arc::new(MemoryStore::new());
    let auth_config = AuthConfig::new(
        "test-access-secret",
        "test-refresh-secret",
        chrono::Duration::minutes(15),
        chrono::Duration::days(10),
    )
    .unwrap();
    let generation = Arc::new(ItineraryGenerationService::new(
        Arc::new(CannedGenerator(reply)),
        store.clone(),
        Duration::from_secs(5),
    ));
    let state = AppState {
        auth: Arc::new(AuthSessionService::new(
            &auth_config,
            store.clone(),
            store.clone(),
        )),
        trips: Arc::new(TripService::new(store, generation)),
        config: ApiConfig {
            bind_addr: "127.0.0.1:0".into(),
            auth: auth_config,
            generation: GenerationConfig::for_provider(ProviderKind::Ollama),
            secure_cookies: true,
        },
    };
    router(state)
}

pub fn app() -> Router {
    app_with(THREE_DAYS)
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: Value,
}

impl Reply {
    /// Value of a `Set-Cookie` header by cookie name.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|v| {
                let pair = v.split(';').next()?;
                let (k, val) = pair.split_once('=')?;
                (k == name).then(|| val.to_string())
            })
    }

    pub fn set_cookie_header(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&format!("{name}=")))
            .map(str::to_string)
    }

    pub fn error_code(&self) -> &str {
        self.json["error"].as_str().unwrap_or_default()
    }
}

pub enum Auth<'a> {
    None,
    Bearer(&'a str),
    /// Raw `Authorization` header value.
    Header(&'a str),
    Cookie(&'a str),
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Auth<'_>,
    body: Option<Value>,
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    builder = match auth {
        Auth::None => builder,
        Auth::Bearer(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
        Auth::Header(value) => builder.header(AUTHORIZATION, value),
        Auth::Cookie(cookie) => builder.header(COOKIE, cookie),
    };
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let resp = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    Reply {
        status,
        headers,
        json,
    }
}

/// Register and log in; returns the login reply.
pub async fn signed_in(app: &Router, email: &str) -> Reply {
    let reply = send(
        app,
        "POST",
        "/api/auth/register",
        Auth::None,
        Some(serde_json::json!({"name": "Ada", "email": email, "password": "secret123"})),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);

    let reply = send(
        app,
        "POST",
        "/api/auth/login",
        Auth::None,
        Some(serde_json::json!({"email": email, "password": "secret123"})),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    reply
}

pub fn access_token(login: &Reply) -> String {
    login.json["accessToken"].as_str().unwrap().to_string()
}

pub fn refresh_token(login: &Reply) -> String {
    login.json["refreshToken"].as_str().unwrap().to_string()
}
