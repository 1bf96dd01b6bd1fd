use actix_web::{web, App, HttpServer};
use actix_cors::Cors;
use dotenv::dotenv;
use hangman_server::{routes, AppError, AppState, Settings};
use std::net::TcpListener;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn build_cors(config: &Settings) -> Cors {
    if !config.cors.enabled {
        // CORS disabled - use most restrictive settings
        return Cors::default();
    }

    let origins = config.cors.origins();
    let cors = if origins.is_empty() {
        Cors::default().allow_any_origin()
    } else {
        origins
            .into_iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };

    cors.allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec!["Authorization", "Content-Type"])
        .expose_headers(vec!["Retry-After"])
        .supports_credentials()
        .max_age(config.cors.max_age as usize)
}

#[actix_web::main]
async fn main() -> hangman_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // Load configuration
    let config = Settings::new()?;
    info!("Configuration loaded successfully ({})", config.environment);

    info!("Starting server at {}:{}", config.server.host, config.server.port);

    // Initialize application state
    let state = AppState::new(config.clone()).await?;
    let state = web::Data::new(state);

    // Periodically forget idle rate limit entries
    let limiter = state.rate_limiter.clone();
    let sweep_interval = Duration::from_secs(config.rate_limit.sweep_interval_secs.max(1));
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(sweep_interval).await;
            let removed = limiter.cleanup().await;
            if removed > 0 {
                info!("Removed {} idle rate limit entries", removed);
            }
        }
    });

    // Create and bind TCP listener
    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    let workers = config.server.workers as usize;

    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&config))
            .wrap(actix_web::middleware::Logger::default())
            .app_data(state.clone())
            .configure(routes)
    })
    .listen(listener)?
    .workers(workers)
    .run()
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok(())
}
