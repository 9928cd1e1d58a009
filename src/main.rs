use anyhow::Context;
use clap::Parser;

use attendance_server::config::Config;
use attendance_server::directory::Directory;
use attendance_server::routes;
use attendance_server::state::AppState;
use attendance_server::store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    let env = env_logger::Env::default().default_filter_or(config.log_level.as_str());
    env_logger::Builder::from_env(env).init();

    let store = Store::open(&config.data_dir).await?;
    let directory = match &config.database_url {
        Some(url) => Directory::connect(url).await,
        None => Directory::open(&config.directory_db()).await,
    }
    .context("opening student directory")?;
    let state = AppState::load(store, directory, config.session_ttl()).await?;

    let app = routes::router(state);
    log::info!("Starting attendance server on http://{}", config.bind);
    axum::Server::bind(&config.bind)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
