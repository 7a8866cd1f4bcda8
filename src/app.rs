use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::{AppConfig, SecurityConfig, StoreBackend};
use crate::database::{
    DatabaseError, DatabaseManager, Maintenance, MemoryStore, PgStore, Repository, UserStore,
};
use crate::handlers::{protected::resource, public::token, system};
use crate::middleware::authenticate;
use crate::observer::ObserverPipeline;
use crate::resources::{Categories, Comments, Posts, Resource};

/// Shared, immutable-after-startup handler state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub categories: Arc<dyn Repository<Categories>>,
    pub posts: Arc<dyn Repository<Posts>>,
    pub comments: Arc<dyn Repository<Comments>>,
    pub users: Arc<dyn UserStore>,
    pub maintenance: Arc<dyn Maintenance>,
    pub observers: Arc<ObserverPipeline>,
}

impl AppState {
    /// Wire every store handle to the same backing store
    pub fn new<S>(config: AppConfig, store: Arc<S>, observers: ObserverPipeline) -> Self
    where
        S: Repository<Categories>
            + Repository<Posts>
            + Repository<Comments>
            + UserStore
            + Maintenance
            + 'static,
    {
        Self {
            config: Arc::new(config),
            categories: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
            users: store.clone(),
            maintenance: store,
            observers: Arc::new(observers),
        }
    }

    /// Open the configured store, applying migrations when enabled
    pub async fn from_config(config: AppConfig) -> Result<Self, DatabaseError> {
        let observers = ObserverPipeline::from_config(&config.audit);

        match config.database.backend {
            StoreBackend::Memory => {
                warn!("Using the in-memory store; data will not survive a restart");
                Ok(Self::new(config, Arc::new(MemoryStore::new()), observers))
            }
            StoreBackend::Postgres => {
                let pool = DatabaseManager::connect(&config.database).await?;
                if config.database.run_migrations {
                    DatabaseManager::migrate(&pool).await?;
                }
                Ok(Self::new(config, Arc::new(PgStore::new(pool)), observers))
            }
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let api = Router::new()
        .merge(resource_routes::<Categories>("/api/categories"))
        .merge(resource_routes::<Posts>("/api/posts"))
        .merge(resource_routes::<Comments>("/api/comments"))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    let mut router = Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .merge(token_routes())
        // Resource API, anonymous reads allowed
        .merge(api)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(&config.security));

    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    info!(
        "Router built: cors={}, request_logging={}, audit_observers={}",
        config.security.enable_cors,
        config.api.enable_request_logging,
        state.observers.len()
    );

    router.with_state(state)
}

fn token_routes() -> Router<AppState> {
    Router::new()
        .route("/api/token", post(token::obtain))
        .route("/api/token/", post(token::obtain))
        .route("/api/token/refresh", post(token::refresh))
        .route("/api/token/refresh/", post(token::refresh))
}

/// Collection and record routes, with and without the trailing slash
fn resource_routes<R: Resource>(base: &str) -> Router<AppState> {
    let collection = get(resource::list::<R>).post(resource::create::<R>);
    let record = get(resource::retrieve::<R>)
        .put(resource::put::<R>)
        .patch(resource::patch::<R>)
        .delete(resource::delete::<R>);

    Router::new()
        .route(base, collection.clone())
        .route(&format!("{}/", base), collection)
        .route(&format!("{}/:id", base), record.clone())
        .route(&format!("{}/:id/", base), record)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    if security.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
