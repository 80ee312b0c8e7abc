//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, HeuristicClassifier, LlmClassifier, SimulatedFeed, StaticTokenIdentity},
    config::Config,
    error::ApiError,
    web::{self, rest::ApiDoc, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use misinfo_core::{AnalysisStore, Classifier, IdentityService, InMemoryStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Select the Store & Identity Provider ---
    // Configured tokens take precedence over the `auth_sessions` table.
    let static_identity: Arc<dyn IdentityService> =
        Arc::new(StaticTokenIdentity::new(config.auth_tokens.clone()));
    let store: Arc<dyn AnalysisStore>;
    let identity: Arc<dyn IdentityService>;
    match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = Arc::new(DbAdapter::new(db_pool));
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            identity = if config.auth_tokens.is_empty() {
                db_adapter.clone() as Arc<dyn IdentityService>
            } else {
                static_identity
            };
            store = db_adapter;
        }
        None => {
            warn!("DATABASE_URL is not set; analyses are kept in memory only");
            if config.auth_tokens.is_empty() {
                warn!("AUTH_TOKENS is empty; every /api request will be rejected");
            }
            store = Arc::new(InMemoryStore::new());
            identity = static_identity;
        }
    }

    // --- 3. Initialize the Classifier ---
    let classifier: Arc<dyn Classifier> = match &config.openai_api_key {
        Some(api_key) => {
            let openai_config = OpenAIConfig::new().with_api_key(api_key);
            info!(model = %config.classifier_model, "Using the LLM classifier");
            Arc::new(LlmClassifier::new(
                Client::with_config(openai_config),
                config.classifier_model.clone(),
            ))
        }
        None => {
            info!("OPENAI_API_KEY is not set; using the heuristic classifier");
            Arc::new(HeuristicClassifier::new())
        }
    };

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::assemble(
        config.clone(),
        classifier,
        store,
        identity,
        Arc::new(SimulatedFeed::new()),
    ));

    // --- 5. Create the Web Router ---
    let frontend_origin = config.frontend_url.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("FRONTEND_URL is not a valid origin: {}", e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(frontend_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(web::router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
