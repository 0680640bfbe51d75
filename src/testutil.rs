//! Test doubles shared by unit tests.

use actix::prelude::*;
use actix_web::web;
use clap::Parser;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{Identity, TokenValidator};
use crate::config::Settings;
use crate::errors::GameError;
use crate::models::{AppState, ServerFrame, ServerMessage};
use crate::session::Connection;
use crate::storage::MemoryStore;

/// Stands in for a WebSocket actor and records every envelope it receives.
#[derive(Default)]
pub struct Recorder {
    received: Vec<ServerMessage>,
}

impl Recorder {
    /// Starts a recorder and returns it with a fresh connection pointing at it.
    pub fn connection() -> (Addr<Recorder>, Connection) {
        let addr = Recorder::default().start();
        let connection = Connection {
            id: Uuid::new_v4(),
            outbox: addr.clone().recipient(),
        };
        (addr, connection)
    }
}

impl Actor for Recorder {
    type Context = Context<Self>;
}

impl Handler<ServerFrame> for Recorder {
    type Result = ();

    fn handle(&mut self, msg: ServerFrame, _: &mut Self::Context) {
        self.received.push(msg.0);
    }
}

/// Returns and clears everything received so far.
///
/// Mailboxes are FIFO, so frames sent before this request are included.
#[derive(Message)]
#[rtype(result = "Vec<ServerMessage>")]
pub struct Drain;

impl Handler<Drain> for Recorder {
    type Result = MessageResult<Drain>;

    fn handle(&mut self, _: Drain, _: &mut Self::Context) -> Self::Result {
        MessageResult(std::mem::take(&mut self.received))
    }
}

pub async fn drain(recorder: &Addr<Recorder>) -> Vec<ServerMessage> {
    recorder.send(Drain).await.expect("recorder mailbox closed")
}

/// Accepts any token equal to a username prefixed with "token-".
pub struct PrefixValidator;

impl TokenValidator for PrefixValidator {
    fn validate(&self, token: &str) -> Result<Identity, GameError> {
        token
            .strip_prefix("token-")
            .map(|username| Identity {
                username: username.to_string(),
            })
            .ok_or_else(|| GameError::Auth("bad token".into()))
    }
}

/// App state over an empty memory store with default timings.
pub fn app_state() -> web::Data<AppState> {
    let settings = Settings::try_parse_from(["tictactoe_server", "--jwt-secret", "k"]).unwrap();
    web::Data::new(AppState::new(
        &settings,
        Arc::new(MemoryStore::new()),
        Arc::new(PrefixValidator),
    ))
}
