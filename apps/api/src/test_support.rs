//! Shared fixtures for handler and pipeline tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::Router;

use crate::config::Config;
use crate::llm_client::{GenerationParams, LlmError, TextGenerator};
use crate::routes::build_router;
use crate::state::AppState;

/// Returns a fixed completion and records every call.
pub struct RecordingGenerator {
    reply: String,
    calls: Mutex<Vec<(String, GenerationParams)>>,
}

impl RecordingGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn params(&self) -> Vec<GenerationParams> {
        self.calls.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), params.clone()));
        Ok(self.reply.clone())
    }
}

/// Always fails like an upstream auth error.
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str, _params: &GenerationParams) -> Result<String, LlmError> {
        Err(LlmError::Api {
            status: 401,
            message: "invalid x-api-key".to_string(),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub generator: Arc<RecordingGenerator>,
    _upload_root: tempfile::TempDir,
}

/// Router over a scratch upload root and a recording generator.
pub fn test_app(reply: &str) -> TestApp {
    let generator = Arc::new(RecordingGenerator::new(reply));
    build_test_app(generator.clone(), generator)
}

/// Router whose generator always fails; `generator` stays unused.
pub fn failing_test_app() -> TestApp {
    build_test_app(Arc::new(FailingGenerator), Arc::new(RecordingGenerator::new("unused")))
}

fn build_test_app(backend: Arc<dyn TextGenerator>, generator: Arc<RecordingGenerator>) -> TestApp {
    let upload_root = tempfile::tempdir().unwrap();
    let state = AppState::new(Config::for_tests(upload_root.path().to_path_buf()), backend);
    TestApp {
        router: build_router(state.clone()),
        state,
        generator,
        _upload_root: upload_root,
    }
}

pub const BOUNDARY: &str = "---------------------------writingassistant";

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

/// Encodes `multipart/form-data` by hand.
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File(name, filename, content) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(content);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_request(uri: &str, cookie: Option<&str>, parts: &[Part<'_>]) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(multipart_body(parts))).unwrap()
}

/// `name=value` pair from a response's `Set-Cookie` header.
pub fn session_cookie(response: &axum::response::Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(str::to_string)
}
