use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use validator::Validate;
use vkinder::config::{LoggingSettings, Settings};
use vkinder::core::{Collaborators, DialogueRouter, SessionStore};
use vkinder::routes::{self, handle_json_payload_error, AppState};
use vkinder::services::{PostgresClient, VkClient, VkSearch};

fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Logging is configured from the settings, so a bad config can only panic
    let settings = Settings::load().unwrap_or_else(|e| {
        panic!("Configuration error: {}", e);
    });

    init_logging(&settings.logging);

    info!("Starting VKinder bot...");

    if let Err(e) = settings.vk.validate() {
        error!("Invalid VK settings: {}", e);
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }

    info!("Configuration loaded successfully");

    // Initialize PostgreSQL client
    let postgres = Arc::new(
        PostgresClient::from_settings(
            &settings.database.url,
            settings.database.max_connections,
            settings.database.min_connections,
            settings.database.acquire_timeout_secs,
            settings.database.idle_timeout_secs,
        )
        .await
        .unwrap_or_else(|e| {
            error!("Failed to connect to PostgreSQL: {}", e);
            panic!("PostgreSQL connection error: {}", e);
        }),
    );

    info!("PostgreSQL client initialized");

    // Initialize VK client
    let timeout = Duration::from_secs(settings.vk.request_timeout_secs.unwrap_or(10));
    let vk = match VkClient::new(
        settings.vk.api_url.clone(),
        settings.vk.api_version.clone(),
        settings.vk.group_token.clone(),
        settings.vk.user_token.clone(),
        timeout,
    ) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to build VK client: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    let search = Arc::new(VkSearch::new(
        vk.clone(),
        postgres.clone(),
        settings.search.count,
        settings.search.age_spread,
    ));

    info!(
        "VK client initialized (API {}, search count {}, age spread {})",
        settings.vk.api_version, settings.search.count, settings.search.age_spread
    );

    let collaborators = Collaborators {
        transport: vk.clone(),
        directory: vk.clone(),
        profiles: postgres.clone(),
        favorites: postgres.clone(),
        search,
        photos: vk,
    };

    let sessions = SessionStore::new(
        settings.sessions.max_sessions,
        Duration::from_secs(settings.sessions.idle_timeout_secs),
    );

    info!(
        "Session store ready (max {} sessions, idle timeout {}s)",
        settings.sessions.max_sessions, settings.sessions.idle_timeout_secs
    );

    // Build application state
    let app_state = AppState {
        router: DialogueRouter::new(collaborators, sessions),
        profiles: postgres,
        confirmation_token: settings.vk.confirmation_token.clone(),
        secret: settings.vk.secret.clone(),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .wrap(middleware::Logger::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
