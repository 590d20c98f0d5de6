use std::sync::Arc;

use campus_portal::app::{self, AppState};
use campus_portal::auth::TokenCodec;
use campus_portal::config::Config;
use campus_portal::store::memory::InMemoryStore;
use campus_portal::store::postgres::PostgresStore;
use campus_portal::store::PortalStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = Config::load()?;

    let store: Arc<dyn PortalStore> = match &config.database_url {
        Some(url) => Arc::new(PostgresStore::connect(url).await?),
        None => {
            log::warn!("DATABASE_URL not set, data will not survive a restart");
            Arc::new(InMemoryStore::new())
        }
    };
    log::info!("Using {} store", store.backend_name());

    let state = Arc::new(AppState::new(
        store,
        TokenCodec::new(&config.jwt_secret),
        config.secure_cookies,
    ));
    let app = app::router(state);

    log::info!("Starting campus portal on http://{}", config.addr);
    axum::Server::bind(&config.addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
