//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        DbAdapter, HttpIdentityAdapter, OpenAiQuizAdapter, OpenAiSummaryAdapter,
        OpenAiTutorAdapter,
    },
    config::Config,
    error::ApiError,
    web::{
        auth::{logout_handler, me_handler, process_session_handler, update_interests_handler},
        chat::{chat_handler, chat_history_handler, get_chat_handler},
        middleware::require_auth,
        quiz::{generate_quiz_handler, quiz_results_handler, save_quiz_handler},
        rest::{progress_handler, summarize_handler, topics_handler, ApiDoc},
        state::AppState,
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tutor_core::ports::{QuizGenerationService, SummarizationService, TutorChatService};
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

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let identity = Arc::new(HttpIdentityAdapter::new(
        config.identity_provider_url.clone(),
    ));

    // The LLM adapters are optional: without a credential the chat, quiz and
    // summarize endpoints answer 503 instead of the process refusing to start.
    let (tutor, quiz_generator, summarizer): (
        Option<Arc<dyn TutorChatService>>,
        Option<Arc<dyn QuizGenerationService>>,
        Option<Arc<dyn SummarizationService>>,
    ) = match &config.openai_api_key {
        Some(api_key) => {
            let openai_config = OpenAIConfig::new().with_api_key(api_key);
            let openai_client = Client::with_config(openai_config);
            (
                Some(Arc::new(OpenAiTutorAdapter::new(
                    openai_client.clone(),
                    config.chat_model.clone(),
                )) as _),
                Some(Arc::new(OpenAiQuizAdapter::new(
                    openai_client.clone(),
                    config.quiz_model.clone(),
                )) as _),
                Some(Arc::new(OpenAiSummaryAdapter::new(
                    openai_client,
                    config.summary_model.clone(),
                )) as _),
            )
        }
        None => {
            warn!("OPENAI_API_KEY not set; chat, quiz and summarize endpoints will return 503");
            (None, None, None)
        }
    };

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db: db_adapter,
        config: config.clone(),
        identity,
        tutor,
        quiz_generator,
        summarizer,
    });

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/session", post(process_session_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/topics", get(topics_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/me", get(me_handler))
        .route("/auth/interests", put(update_interests_handler))
        .route("/chat", post(chat_handler))
        .route("/chat/history", get(chat_history_handler))
        .route("/chat/{chat_id}", get(get_chat_handler))
        .route("/quiz/generate", post(generate_quiz_handler))
        .route("/quiz/save", post(save_quiz_handler))
        .route("/quiz/results", get(quiz_results_handler))
        .route("/summarize", post(summarize_handler))
        .route("/progress", get(progress_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes under the common prefix
    let api_router = Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
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
