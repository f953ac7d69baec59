use sqlx::mysql::MySqlPool;
use std::sync::Arc;
use log::{debug, info, warn};
use simplelog::*;

use playplus::config::Config;
use playplus::store::{DynStore, MemoryStore, MySqlStore};
use playplus::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {

    let config = Config::from_env()?;

    // set up tracing facility
    let _ = SimpleLogger::init(config.log_level, simplelog::Config::default());
    info!("Starting..");

    // Without a database the server keeps everything in memory
    let store: DynStore = match &config.database_url {
        Some(database_url) => {
            debug!("database_url: {:?}", database_url);
            let pool = MySqlPool::connect(database_url).await?;
            Arc::new(MySqlStore::new(pool))
        }
        None => {
            warn!("$DATABASE_URL is not set, using the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    // Store the JWT secret and token duration in the shared AppState
    let state = AppState {
        jwt_secret: config.jwt_secret.clone(),
        token_duration: config.token_duration,
    };

    let app = playplus::app(state, store);

    // Start the server
    // TODO: tls -> there is now a axum-server crate that does this
    debug!("Listening on {}", config.listen_addr);
    axum::Server::bind(&config.listen_addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
