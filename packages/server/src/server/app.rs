//! Application setup and server configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::domains::auth::JwtService;
use crate::domains::matching::NotificationDispatcher;
use crate::domains::messaging::{ConversationCoordinator, PgConversationStore, RoomRouter};
use crate::kernel::traits::EmailNotifier;
use crate::kernel::{FsBlobStore, HttpEmailNotifier, NoopEmailNotifier, UserHub};
use crate::server::routes::{
    chat_handler, conversation_messages_handler, create_listing_handler, health_handler,
    report_message_handler, stream_handler,
};

/// How often idle room/user channels are pruned
const HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(60);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_service: Arc<JwtService>,
    pub rooms: RoomRouter,
    pub user_hub: UserHub,
    pub coordinator: Arc<ConversationCoordinator>,
    pub dispatcher: NotificationDispatcher,
}

/// Build the Axum application router.
///
/// Wires the delivery core: the room router and user hub are the only shared
/// mutable registries, owned here and handed to every component as cloneable
/// handles. A background task prunes channels nobody holds open anymore.
pub fn build_app(pool: PgPool, config: &Config) -> Router {
    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()));
    let rooms = RoomRouter::new();
    let user_hub = UserHub::new();

    // External collaborators behind their contracts
    let store = Arc::new(PgConversationStore::new(pool.clone()));
    let blobs = Arc::new(FsBlobStore::new(config.upload_dir.clone()));
    let email: Arc<dyn EmailNotifier> = match &config.email_api_url {
        Some(url) => Arc::new(HttpEmailNotifier::new(
            url.clone(),
            config.email_api_key.clone(),
        )),
        None => Arc::new(NoopEmailNotifier),
    };

    let coordinator = Arc::new(ConversationCoordinator::new(
        store,
        rooms.clone(),
        user_hub.clone(),
        email,
        blobs,
    ));
    let dispatcher = NotificationDispatcher::new(pool.clone(), user_hub.clone());

    // Housekeeping: bound registry memory by live connections
    {
        let rooms = rooms.clone();
        let hub = user_hub.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(HOUSEKEEPING_INTERVAL);
            loop {
                ticker.tick().await;
                rooms.cleanup().await;
                hub.cleanup().await;
            }
        });
    }

    let app_state = AppState {
        db_pool: pool,
        jwt_service,
        rooms,
        user_hub,
        coordinator,
        dispatcher,
    };

    // CORS configuration - the web client runs on a separate origin
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Router::new()
        // Real-time transports
        .route("/api/chat", get(chat_handler))
        .route("/api/streams/me", get(stream_handler))
        // Producer side of saved-search alerts
        .route("/api/listings", post(create_listing_handler))
        // Conversation history and moderation
        .route("/api/conversations/:id/messages", get(conversation_messages_handler))
        .route("/api/messages/:id/report", post(report_message_handler))
        // Health check
        .route("/health", get(health_handler))
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
