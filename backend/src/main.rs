use std::sync::Arc;
use backend::{
    build_rocket,
    config::IngesterConfig,
    ingester::Ingester,
    queries::PgStore,
    routes::AppState,
    store::ProjectionStore,
};
use shuttle_runtime::CustomError;
use sqlx::PgPool;
use tracing::{info, warn};

#[shuttle_runtime::main]
async fn rocket(
    #[shuttle_shared_db::Postgres] pool: PgPool,
    #[shuttle_runtime::Secrets] secret_store: shuttle_runtime::SecretStore,
) -> shuttle_rocket::ShuttleRocket {
    info!("🚀 Starting polls server");

    let pg = PgStore::new(pool);
    pg.migrate().await.map_err(CustomError::new)?;

    info!("📋 Migrations complete");

    let store: Arc<dyn ProjectionStore> = Arc::new(pg);
    let config = IngesterConfig::load(|key| secret_store.get(key));

    if config.enabled {
        tokio::spawn(Ingester::new(store.clone(), config).run());
    } else {
        warn!("INGESTER_ENABLED is false - the projection will only see optimistic writes");
    }

    let rocket = build_rocket(AppState::new(store));

    Ok(rocket.into())
}
