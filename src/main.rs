use actix_web::{web, App, HttpServer};
use clap::Parser;
use log::info;
use std::io;
use std::sync::Arc;

use tictactoe_server::auth::JwtValidator;
use tictactoe_server::config::Settings;
use tictactoe_server::models::AppState;
use tictactoe_server::routes::configure_routes;
use tictactoe_server::storage::MemoryStore;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::parse();
    settings
        .validate()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let address = settings.bind_address();
    info!("Starting tic-tac-toe server at http://{}", address);

    // Create shared application state
    let app_state = web::Data::new(AppState::new(
        &settings,
        Arc::new(MemoryStore::new()),
        Arc::new(JwtValidator::new(&settings.jwt_secret)),
    ));

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(configure_routes)
    })
    .bind(address)?
    .run()
    .await
}
