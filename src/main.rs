use std::net::SocketAddr;

use foodgram::{
    filters::{routes, Context},
    Config,
};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Config::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("Migrations applied");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let context = Context::new(pool, config)?;

    let (addr, server) =
        warp::serve(routes(context)).try_bind_with_graceful_shutdown(addr, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {e}");
            }
        })?;

    log::info!("Listening on {addr}");
    server.await;
    log::info!("Shut down");

    Ok(())
}
