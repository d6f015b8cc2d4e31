//! reqwest-backed origin client

use crate::origin::{Origin, OriginBody, OriginError, OriginRequest, OriginResponse};
use actix_web::http::header::{HeaderMap, HeaderName, HeaderValue};
use actix_web::http::StatusCode;
use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, warn};
use reqwest::redirect::Policy;

/// Origin reached over HTTP at a fixed base URL
pub struct HttpOrigin {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOrigin {
    /// Redirects are not followed, so an origin 3xx reaches the client as is
    pub fn new(base_url: &str) -> Result<Self, OriginError> {
        reqwest::Url::parse(base_url)
            .map_err(|e| OriginError::InvalidRequest(format!("origin base URL {}: {}", base_url, e)))?;
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .map_err(|e| OriginError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn target_url(&self, request: &OriginRequest) -> String {
        format!("{}{}", self.base_url, request.path_and_query)
    }
}

#[async_trait]
impl Origin for HttpOrigin {
    async fn fetch(&self, request: &OriginRequest) -> Result<OriginResponse, OriginError> {
        let url = self.target_url(request);
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| OriginError::InvalidRequest(e.to_string()))?;

        let mut builder = self.client.request(method, &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| OriginError::Transport(e.to_string()))?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .map_err(|e| OriginError::Transport(e.to_string()))?;
        let final_url = response.url().to_string();

        let mut headers = HeaderMap::new();
        for (name, value) in response.headers() {
            match (
                HeaderName::from_bytes(name.as_str().as_bytes()),
                HeaderValue::from_bytes(value.as_bytes()),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => warn!("Dropping unrepresentable origin header {}", name),
            }
        }

        // Left unread until the response is passed through
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| OriginError::Transport(e.to_string())))
            .boxed();

        debug!("Origin {} {} -> {}", request.method, url, status);
        Ok(OriginResponse {
            status,
            url: final_url,
            headers,
            body: OriginBody::Streaming(body),
        })
    }
}
