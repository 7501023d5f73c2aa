use axum::{routing::get, routing::post, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::iss::IssFeed;
use crate::orbit::Catalog;

use super::api::iss as iss_handlers;
use super::api::satellites as satellite_handlers;
use super::api_doc::ApiDoc;
use super::state::AppState;
use super::ui::handlers as ui_handlers;

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();

    let mut catalog = Catalog::new(
        config.catalog.source(),
        config.catalog.cache_for,
        config.catalog.timeout,
    )
    .map_err(std::io::Error::other)?;
    // Warm the cache; requests retry the load if this fails.
    if let Err(e) = catalog.ensure_fresh().await {
        log::warn!("Failed to load satellite catalog: {}", e);
    }

    let iss = IssFeed::new(config.iss.url.clone(), config.iss.timeout)
        .map_err(std::io::Error::other)?;

    log::info!("Catalog holds {} satellites", catalog.len());
    let state = AppState::new(config, catalog, iss);

    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let static_dir = state.config.web.static_dir.clone();

    Router::new()
        // UI routes
        .route("/", get(ui_handlers::dashboard))
        // Position API
        .route("/get_iss_position", get(iss_handlers::iss_position))
        .route(
            "/get_closest_satellites",
            post(satellite_handlers::closest_satellites),
        )
        .route(
            "/search_satellites",
            post(satellite_handlers::search_satellites),
        )
        .route(
            "/get_satellite_position/{id}",
            get(satellite_handlers::satellite_position),
        )
        // Static files
        .nest_service("/static", ServeDir::new(static_dir))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
