use crate::app::App;
use crate::config::{AppConfig, Backend};
use crate::db::connection::{init_db, Database};
use crate::errors::ServerError;
use crate::responses::error_to_response;
use crate::router::handle;
use crate::store::{LocalBlobStore, RecordStore, RestStore, SqliteStore};
use astra::Server;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod db;
mod domain;
mod errors;
mod import;
mod responses;
mod router;
mod spreadsheets;
mod store;

#[cfg(test)]
mod tests;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ofertas=info")),
        )
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let app = match build_app(&config) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            std::process::exit(1);
        }
    };

    tracing::info!(
        addr = %config.bind,
        offers = app.state.offers.len(),
        "starting server"
    );

    let app = Mutex::new(app);
    let server = Server::bind(&config.bind).max_workers(config.workers);

    let result = server.serve(move |req, _info| match handle(req, &app) {
        Ok(resp) => resp,
        Err(err) => error_to_response(err),
    });

    if let Err(e) = result {
        tracing::error!(error = %e, "server ended with error");
    }

    tracing::info!("server shut down");
}

/// Opens the stores named by the configuration and loads the initial state.
/// Document metadata always lives in the local database.
fn build_app(config: &AppConfig) -> Result<App, ServerError> {
    let db = Database::new(config.db_path.clone());
    init_db(&db, &config.schema_path)?;

    let records: Box<dyn RecordStore> = match &config.backend {
        Backend::Sqlite => Box::new(SqliteStore::new(db.clone())),
        Backend::Rest { url, api_key } => {
            tracing::info!(url = %url, "using hosted record store");
            Box::new(RestStore::new(url, api_key.clone())?)
        }
    };
    let blobs = LocalBlobStore::new(db, &config.blob_dir)?;

    let mut app = App::new(records, Box::new(blobs));
    app.refresh();
    Ok(app)
}
