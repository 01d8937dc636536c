//! Slide Library Backend
//!
//! REST backend for a presentation add-in that keeps a library of saved slides
//! in two JSON documents on a cloud drive.

mod api;
mod auth;
mod cache;
mod config;
mod errors;
mod library;
mod models;
mod search;
mod store;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::Identity;
use config::{Config, LogFormat};
use library::SlideLibrary;
use store::{Drive, StoreLayout};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub library: Arc<SlideLibrary<Drive>>,
    pub identity: Arc<Identity>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the identity, drive and library together from configuration.
    pub fn from_config(config: Config) -> Result<Self, errors::AppError> {
        let identity = Arc::new(Identity::new(
            config.access_token.clone(),
            config.token_ttl_secs,
        ));
        let drive = Drive::from_config(&config, Arc::clone(&identity))?;
        tracing::info!("Using {}", drive.describe());

        let library = SlideLibrary::new(
            drive,
            StoreLayout::new(&config.app_folder),
            config.sort_tags,
        );

        Ok(Self {
            library: Arc::new(library),
            identity,
            config: Arc::new(config),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }

    tracing::info!("Starting Slide Library Backend");
    tracing::info!("App folder: {}", config.app_folder);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (SLIDES_API_PSK). Authentication is disabled!");
    }

    let bind_addr = config.bind_addr;
    let state = AppState::from_config(config)?;

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // API routes
    let api_routes = Router::new()
        // Session
        .route(
            "/session",
            get(api::get_session).post(api::login).delete(api::logout),
        )
        // Slides
        .route("/slides", get(api::list_slides).post(api::create_slide))
        .route(
            "/slides/{id}",
            get(api::get_slide)
                .put(api::update_slide)
                .delete(api::delete_slide),
        )
        .route("/slides/{id}/select", post(api::select_slide))
        .route("/slides/{id}/insertion", get(api::insert_slide))
        .route(
            "/selection",
            get(api::get_selection)
                .put(api::update_selection)
                .delete(api::clear_selection),
        )
        // Tags
        .route("/tags", get(api::list_tags))
        .route("/tags/suggestions", get(api::tag_suggestions))
        .route("/tags/reconcile", post(api::reconcile_tags))
        // Cache
        .route("/cache/clear", post(api::clear_cache))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
