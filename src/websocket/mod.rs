pub mod game_handlers;
pub mod handler;
pub mod protocol;

use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{info, warn};
use serde::Deserialize;

use crate::auth::bearer_token;
use crate::models::AppState;

pub use handler::GameSocket;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub token: String,
}

/// Upgrades `GET /ws?token=...` once the token checks out. The token may also
/// come as a bearer `Authorization` header.
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    query: web::Query<TokenQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let token = if query.token.is_empty() {
        bearer_token(&req).unwrap_or_default()
    } else {
        query.token.as_str()
    };

    let identity = match app_state.validator.validate(token) {
        Ok(identity) => identity,
        Err(e) => {
            warn!("Refusing WebSocket upgrade: {}", e);
            return Err(e.into());
        }
    };

    info!("New WebSocket connection for {}", identity.username);
    ws::start(GameSocket::new(identity, app_state.clone()), &req, stream)
}
