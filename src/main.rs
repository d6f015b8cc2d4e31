use actix_web::{web, App, HttpServer};
use log::{error, info, warn};

use bucket_gateway::app_state::AppState;
use bucket_gateway::config::AppConfig;
use bucket_gateway::gateway::handlers::gateway_handler;

fn init_logging(config_file: &str) {
    if let Err(e) = log4rs::init_file(config_file, Default::default()) {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        warn!("Could not load log configuration from {} ({}), logging to stderr", config_file, e);
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = AppConfig::load().map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    init_logging(&config.logging.config_file);

    let app_state = AppState::from_config(config.clone()).map_err(|e| {
        error!("Failed to initialize application state: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;
    let app_data = web::Data::new(app_state);

    info!("Starting server on {}:{}", config.server.host, config.server.port);
    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(app_data.clone())
            // Every path and method goes through the gateway router
            .default_service(web::to(gateway_handler))
    })
    .workers(config.server.workers.max(1))
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
