//! Static origin for testing: answers every request with the same response

use crate::origin::{Origin, OriginError, OriginRequest, OriginResponse};
use actix_web::http::StatusCode;
use async_trait::async_trait;
use log::info;
use std::sync::{Arc, Mutex};

pub struct StaticOrigin {
    base_url: String,
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    requests: Arc<Mutex<Vec<OriginRequest>>>,
}

impl StaticOrigin {
    pub fn new(status: StatusCode) -> Self {
        Self {
            base_url: "http://origin.test".to_string(),
            status,
            headers: Vec::new(),
            body: Vec::new(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Origin that never has anything, like an empty static site
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND).with_body("origin: not found")
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<OriginRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Origin for StaticOrigin {
    async fn fetch(&self, request: &OriginRequest) -> Result<OriginResponse, OriginError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        info!("Static origin: {} {} -> {}", request.method, request.path_and_query, self.status);

        let url = format!("{}{}", self.base_url, request.path_and_query);
        let mut response = OriginResponse::new(self.status, url).with_body(self.body.clone());
        for (name, value) in &self.headers {
            response = response.with_header(name, value);
        }
        Ok(response)
    }
}
