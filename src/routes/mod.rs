use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::info;
use serde::{Deserialize, Serialize};

use crate::auth::authenticate;
use crate::errors::GameError;
use crate::models::{AppState, GameId, GameStatus};

/// HTTP handler for the index page
pub async fn index() -> impl Responder {
    HttpResponse::Ok().body("Tic-tac-toe server")
}

#[derive(Debug, Deserialize)]
pub struct LeaveQueueRequest {
    pub username: String,
}

/// `{id, status}` row of a player's game listing.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct GameSummary {
    pub id: GameId,
    pub status: GameStatus,
}

pub async fn verify_token(
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, GameError> {
    authenticate(&req, app_state.validator.as_ref())?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "valid" })))
}

pub async fn leave_queue(
    req: HttpRequest,
    body: web::Json<LeaveQueueRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, GameError> {
    let identity = authenticate(&req, app_state.validator.as_ref())?;
    if body.username != identity.username {
        return Err(GameError::Auth(format!(
            "token belongs to {}, not {}",
            identity.username, body.username
        )));
    }
    app_state.lobby.leave_queue(&body.username);
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "removed from queue" })))
}

/// Current snapshot of a game, for clients redrawing after a reload.
pub async fn game_snapshot(
    req: HttpRequest,
    path: web::Path<GameId>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, GameError> {
    authenticate(&req, app_state.validator.as_ref())?;
    let snapshot = app_state.lobby.snapshot(path.into_inner())?;
    Ok(HttpResponse::Ok().json(snapshot))
}

pub async fn player_games(
    req: HttpRequest,
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, GameError> {
    authenticate(&req, app_state.validator.as_ref())?;
    let username = path.into_inner();
    let games: Vec<GameSummary> = app_state
        .lobby
        .games_for_player(&username)?
        .into_iter()
        .map(|game| GameSummary {
            id: game.id,
            status: game.status,
        })
        .collect();
    info!("Listing {} games of {}", games.len(), username);
    Ok(HttpResponse::Ok().json(games))
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").route(web::get().to(crate::websocket::ws_index)))
        .service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/verify-token").route(web::get().to(verify_token)))
        .service(web::resource("/leave-queue").route(web::post().to(leave_queue)))
        .service(web::resource("/game/{id}").route(web::get().to(game_snapshot)))
        .service(web::resource("/player/{username}/games").route(web::get().to(player_games)));
}
