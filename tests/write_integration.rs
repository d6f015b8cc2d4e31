use actix_web::{body::to_bytes, http::Method, http::StatusCode, test, web, App};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

use bucket_gateway::app_state::AppState;
use bucket_gateway::config::AppConfig;
use bucket_gateway::gateway::handlers::gateway_handler;
use bucket_gateway::origin::mock_origin::StaticOrigin;
use bucket_gateway::storage::mock_store::MemoryBucket;
use bucket_gateway::storage::Bucket;

fn users_json() -> String {
    let hash = bcrypt::hash("s3cr:et", 4).unwrap();
    serde_json::json!([{ "username": "deployer", "saltedHash": hash }]).to_string()
}

fn basic(user_pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(user_pass))
}

fn state_with(bucket: Arc<MemoryBucket>, config: AppConfig) -> web::Data<AppState> {
    web::Data::new(AppState::with_components(
        config,
        bucket,
        Arc::new(StaticOrigin::not_found()),
        users_json(),
    ))
}

async fn body_text(resp: actix_web::dev::ServiceResponse) -> String {
    let bytes = to_bytes(resp.into_body()).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[actix_web::test]
async fn test_put_with_valid_credentials() {
    let bucket = Arc::new(MemoryBucket::new());
    let app = test::init_service(
        App::new()
            .app_data(state_with(bucket.clone(), AppConfig::default()))
            .default_service(web::to(gateway_handler)),
    )
    .await;

    let req = test::TestRequest::put()
        .uri("/com/example/lib/1.0/lib-1.0.jar")
        .insert_header(("Authorization", basic("deployer:s3cr:et")))
        .set_payload("jar contents")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "Upload successful.");
    assert_eq!(
        bucket.get("com/example/lib/1.0/lib-1.0.jar").as_deref(),
        Some(&b"jar contents"[..])
    );
}

#[actix_web::test]
async fn test_put_rejections() {
    let bucket = Arc::new(MemoryBucket::new());
    let app = test::init_service(
        App::new()
            .app_data(state_with(bucket.clone(), AppConfig::default()))
            .default_service(web::to(gateway_handler)),
    )
    .await;

    let wrong_password = test::TestRequest::put()
        .uri("/a.txt")
        .insert_header(("Authorization", basic("deployer:wrong")))
        .set_payload("data")
        .to_request();
    let resp = test::call_service(&app, wrong_password).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(resp).await, "Not authorized.");

    let unknown_user = test::TestRequest::put()
        .uri("/a.txt")
        .insert_header(("Authorization", basic("intruder:s3cr:et")))
        .set_payload("data")
        .to_request();
    let resp = test::call_service(&app, unknown_user).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(resp).await, "Not authorized.");

    let no_header = test::TestRequest::put().uri("/a.txt").set_payload("data").to_request();
    assert_eq!(test::call_service(&app, no_header).await.status(), StatusCode::UNAUTHORIZED);

    let empty_body = test::TestRequest::put()
        .uri("/a.txt")
        .insert_header(("Authorization", basic("deployer:s3cr:et")))
        .to_request();
    let resp = test::call_service(&app, empty_body).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(resp).await, "No body provided.");

    let folder_key = test::TestRequest::put()
        .uri("/")
        .insert_header(("Authorization", basic("deployer:s3cr:et")))
        .set_payload("data")
        .to_request();
    assert_eq!(test::call_service(&app, folder_key).await.status(), StatusCode::BAD_REQUEST);

    assert_eq!(bucket.object_count(), 0);
}

#[actix_web::test]
async fn test_put_plus_becomes_space() {
    let bucket = Arc::new(MemoryBucket::new());
    let app = test::init_service(
        App::new()
            .app_data(state_with(bucket.clone(), AppConfig::default()))
            .default_service(web::to(gateway_handler)),
    )
    .await;

    let req = test::TestRequest::put()
        .uri("/release+notes/v1%2B2.txt")
        .insert_header(("Authorization", basic("deployer:s3cr:et")))
        .set_payload("notes")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    assert!(bucket.contains("release notes/v1+2.txt"));
}

#[actix_web::test]
async fn test_put_encoded_leading_separator_stays_relative() {
    let bucket = Arc::new(MemoryBucket::new());
    let app = test::init_service(
        App::new()
            .app_data(state_with(bucket.clone(), AppConfig::default()))
            .default_service(web::to(gateway_handler)),
    )
    .await;

    let req = test::TestRequest::put()
        .uri("/%2Fetc/passwd")
        .insert_header(("Authorization", basic("deployer:s3cr:et")))
        .set_payload("root:x:0:0")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    assert!(bucket.contains("etc/passwd"));
    assert!(!bucket.contains("/etc/passwd"));
}

#[actix_web::test]
async fn test_put_over_payload_limit() {
    let bucket = Arc::new(MemoryBucket::new());
    let mut config = AppConfig::default();
    config.server.max_payload_size = 4;
    let app = test::init_service(
        App::new()
            .app_data(state_with(bucket.clone(), config))
            .default_service(web::to(gateway_handler)),
    )
    .await;

    let req = test::TestRequest::put()
        .uri("/big.bin")
        .insert_header(("Authorization", basic("deployer:s3cr:et")))
        .set_payload("too large")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(!bucket.contains("big.bin"));
}

#[actix_web::test]
async fn test_delete_flow() {
    let bucket = Arc::new(MemoryBucket::new());
    bucket.put("old/artifact.jar", "bytes".into()).await.unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state_with(bucket.clone(), AppConfig::default()))
            .default_service(web::to(gateway_handler)),
    )
    .await;

    let unauthorized = test::TestRequest::delete().uri("/old/artifact.jar").to_request();
    let resp = test::call_service(&app, unauthorized).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(bucket.contains("old/artifact.jar"));

    let req = test::TestRequest::delete()
        .uri("/old/artifact.jar")
        .insert_header(("Authorization", basic("deployer:s3cr:et")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "Delete successful.");
    assert!(!bucket.contains("old/artifact.jar"));

    // Deleting again is not an error
    let again = test::TestRequest::delete()
        .uri("/old/artifact.jar")
        .insert_header(("Authorization", basic("deployer:s3cr:et")))
        .to_request();
    assert_eq!(test::call_service(&app, again).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_upload_then_listing_shows_object() {
    let bucket = Arc::new(MemoryBucket::new());
    let app = test::init_service(
        App::new()
            .app_data(state_with(bucket, AppConfig::default()))
            .default_service(web::to(gateway_handler)),
    )
    .await;

    let put = test::TestRequest::put()
        .uri("/repo/pkg.tar")
        .insert_header(("Authorization", basic("deployer:s3cr:et")))
        .set_payload(vec![7u8; 3000])
        .to_request();
    assert_eq!(test::call_service(&app, put).await.status(), StatusCode::OK);

    let get = test::TestRequest::get().uri("/repo/").to_request();
    let resp = test::call_service(&app, get).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains(r#"<span class="name">pkg.tar</span>"#));
    assert!(html.contains("2.9 KiB"));
}

#[actix_web::test]
async fn test_other_methods_are_not_allowed() {
    let app = test::init_service(
        App::new()
            .app_data(state_with(Arc::new(MemoryBucket::new()), AppConfig::default()))
            .default_service(web::to(gateway_handler)),
    )
    .await;

    let req = test::TestRequest::default().method(Method::POST).uri("/a.txt").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.headers().get("Allow").unwrap(), "PUT, GET, DELETE");
}
