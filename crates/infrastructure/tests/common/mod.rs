//! Shared fixtures for the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::convert::Infallible;

use axum::body::{Body, to_bytes};
use axum::extract::Request;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a test subscriber once; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

fn request_header(request: &Request, name: &str) -> String {
    request
        .headers()
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default()
}

/// A small application covering the scenarios the tests exercise.
pub async fn app(request: Request) -> Result<Response, Infallible> {
    let path = request.uri().path().to_string();
    let response = match path.as_str() {
        "/sitemap" => (StatusCode::CREATED, "example").into_response(),
        "/json" => axum::Json(serde_json::json!({"name": "courier", "tags": ["a", "b"]}))
            .into_response(),
        "/bare" => Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(Body::empty())
            .unwrap(),
        "/token" => ([("x-token", "t-42")], "issued").into_response(),
        "/echo-auth" => request_header(&request, "authorization").into_response(),
        "/echo-cookie" => request_header(&request, "cookie").into_response(),
        "/echo-body" => {
            let content_type = request_header(&request, "content-type");
            let body = to_bytes(request.into_body(), usize::MAX).await.unwrap();
            ([(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        "/login" => (
            [(header::SET_COOKIE, "koa:sess=eyJtZ; path=/; httponly")],
            "hello world",
        )
            .into_response(),
        "/logout" => ([(header::SET_COOKIE, "koa:sess=; path=/; httponly")], "").into_response(),
        "/cookies" => Response::builder()
            .header(header::SET_COOKIE, "a=1; Path=/; HttpOnly")
            .header(header::SET_COOKIE, "b=2; Max-Age=60; SameSite=Lax")
            .body(Body::empty())
            .unwrap(),
        "/dated" => (
            [(header::SET_COOKIE, "promo=1; Path=/; Expires=Fri, 01 Jan 2100 00:00:00 GMT")],
            "",
        )
            .into_response(),
        "/redirect" => Response::builder()
            .status(StatusCode::FOUND)
            .header(header::LOCATION, "/sitemap")
            .body(Body::empty())
            .unwrap(),
        _ => StatusCode::NOT_FOUND.into_response(),
    };
    Ok(response)
}
