use actix::*;
use actix_web::web;
use actix_web_actors::ws;
use log::{debug, info, warn};
use std::time::Instant;
use uuid::Uuid;

use crate::auth::Identity;
use crate::models::{AppState, ServerFrame, ServerMessage};
use crate::session::Connection;
use crate::websocket::protocol::{decode, Command};

/// One WebSocket connection of an authenticated user.
pub struct GameSocket {
    pub id: Uuid,
    pub identity: Identity,
    pub app_state: web::Data<AppState>,
    pub last_heartbeat: Instant,
}

impl GameSocket {
    pub fn new(identity: Identity, app_state: web::Data<AppState>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity,
            app_state,
            last_heartbeat: Instant::now(),
        }
    }

    /// Pings the client periodically and closes the connection once it has
    /// been silent for longer than the client timeout.
    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let heartbeat = self.app_state.heartbeat;
        ctx.run_interval(heartbeat.interval, move |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > heartbeat.client_timeout {
                warn!(
                    "Connection {} of {} timed out, disconnecting",
                    act.id, act.identity.username
                );
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    /// Runs one text frame and returns the reply owed to this connection.
    /// Unknown types and malformed frames get none and keep the socket open.
    pub fn process_text(&self, text: &str) -> Option<ServerMessage> {
        debug!("Connection {} received: {}", self.id, text);
        match decode(text) {
            Ok(Command::JoinQueue { username }) => self.handle_join_queue(&username),
            Ok(Command::LeaveQueue { username }) => self.handle_leave_queue(&username),
            Ok(Command::Move(mv)) => self.handle_move(mv),
            Ok(Command::Ping) => self.handle_ping(),
            Ok(Command::Ignored { kind }) => {
                debug!("Connection {}: nothing to do for {:?}", self.id, kind);
                None
            }
            Err(e) => {
                warn!("Connection {}: dropping frame: {}", self.id, e);
                None
            }
        }
    }

    fn handle_text(&mut self, text: &str, ctx: &mut ws::WebsocketContext<Self>) {
        if let Some(reply) = self.process_text(text) {
            match serde_json::to_string(&reply) {
                Ok(text) => ctx.text(text),
                Err(e) => warn!("Error serializing envelope for {}: {}", self.id, e),
            }
        }
    }
}

impl Actor for GameSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.start_heartbeat(ctx);
        let connection = Connection {
            id: self.id,
            outbox: ctx.address().recipient(),
        };
        self.app_state
            .lobby
            .register(&self.identity.username, connection);
        info!(
            "WebSocket connection started: {} ({})",
            self.id, self.identity.username
        );
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.app_state.lobby.disconnect(self.id);
        info!(
            "WebSocket connection closed: {} ({} still live)",
            self.id,
            self.app_state.lobby.registry().live_connections()
        );
        Running::Stop
    }
}

impl Handler<ServerFrame> for GameSocket {
    type Result = ();

    fn handle(&mut self, msg: ServerFrame, ctx: &mut Self::Context) {
        match serde_json::to_string(&msg.0) {
            Ok(text) => {
                debug!("Forwarding {} envelope to {}", msg.0.message_type, self.id);
                ctx.text(text);
            }
            Err(e) => warn!("Error serializing envelope for {}: {}", self.id, e),
        }
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for GameSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Connection {} protocol error: {}", self.id, e);
                ctx.stop();
                return;
            }
        };

        self.last_heartbeat = Instant::now();
        match msg {
            ws::Message::Text(text) => self.handle_text(&text, ctx),
            ws::Message::Binary(_) => {
                warn!("Connection {}: binary messages are not supported", self.id);
            }
            ws::Message::Ping(bytes) => ctx.pong(&bytes),
            ws::Message::Pong(_) => {}
            ws::Message::Close(reason) => {
                info!("Connection {} closed by client: {:?}", self.id, reason);
                ctx.close(reason);
                ctx.stop();
            }
            ws::Message::Continuation(_) => {
                warn!("Connection {}: continuation frames are not supported", self.id);
                ctx.stop();
            }
            ws::Message::Nop => {}
        }
    }
}
