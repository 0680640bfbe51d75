//! Realtime tic-tac-toe over WebSockets: matchmaking, per-connection game
//! routing and the turn state machine behind them.

pub mod auth;
pub mod config;
pub mod errors;
pub mod game;
pub mod models;
pub mod routes;
pub mod session;
pub mod storage;
pub mod websocket;

#[cfg(test)]
mod testutil;
