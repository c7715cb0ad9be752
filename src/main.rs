use anyhow::Result;
use axum::Router;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use rocketfood_service::{
    app_state::AppState,
    auth::JwtKeys,
    bootstrap::{self, bootstrap},
    config, db, routes, swagger,
};

/// Migrations embedded into the binary so a fresh database is usable on first start.
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_env();
    bootstrap::init_tracing();

    let config = config::load()?;

    tracing::info!("Running migrations...");
    let migrations_count = db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
    tracing::info!("Run {} new migrations successfully", migrations_count);

    let db_pool = db::create_pool(&config.database).await?;
    let state = AppState::new(db_pool, JwtKeys::new(&config.jwt));

    let routes = routes::routes_with_openapi(&state);

    let mut openapi = routes.get_openapi().clone();
    openapi.info = utoipa::openapi::InfoBuilder::new()
        .title("RocketFood API")
        .version("1.0.0")
        .build();
    let swagger_ui = swagger::create_swagger_ui(openapi);

    let app = Router::new()
        .merge(routes)
        .merge(swagger_ui)
        .with_state(state);

    tracing::info!("Bootstrapping...");
    bootstrap("RocketFoodService", app, &config.server).await?;
    Ok(())
}
