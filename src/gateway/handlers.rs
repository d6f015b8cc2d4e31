// Request router: every inbound request lands here
use actix_web::http::Method;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use log::{debug, warn};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::app_state::AppState;
use crate::service::{delete_service, put_service, read_service};

/// Methods advertised on a 405 response
pub const ALLOWED_METHODS: &str = "PUT, GET, DELETE";

/// Dispatch by HTTP method. Registered as the application's default service
/// so the whole path space is handled the same way.
pub async fn gateway_handler(
    req: HttpRequest,
    payload: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let fields = vec![
        ("method".to_string(), req.method().to_string()),
        ("path".to_string(), req.path().to_string()),
    ];
    WithMdc::new(fields, dispatch(req, payload, app_state)).await
}

async fn dispatch(
    req: HttpRequest,
    payload: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    debug!("Dispatching {} {}", req.method(), req.path());

    let method = req.method().clone();
    match method {
        Method::PUT => put_service(payload, req, app_state).await,
        Method::DELETE => delete_service(req, app_state).await,
        Method::GET | Method::HEAD => read_service(req, app_state).await,
        _ => {
            warn!("Method not allowed: {}", method);
            Ok(method_not_allowed())
        }
    }
}

/// Runs a request future with its log MDC in place.
///
/// The MDC is thread-local and requests interleave on a worker at every
/// await, so the fields are installed before each poll and cleared after it.
pub struct WithMdc<F> {
    fields: Vec<(String, String)>,
    inner: Pin<Box<F>>,
}

impl<F: Future> WithMdc<F> {
    pub fn new(fields: Vec<(String, String)>, inner: F) -> Self {
        Self {
            fields,
            inner: Box::pin(inner),
        }
    }
}

impl<F: Future> Future for WithMdc<F> {
    type Output = F::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        for (key, value) in &this.fields {
            log_mdc::insert(key.as_str(), value.as_str());
        }
        let result = this.inner.as_mut().poll(cx);
        log_mdc::clear();
        result
    }
}

fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .insert_header(("Allow", ALLOWED_METHODS))
        .body("Method Not Allowed")
}
