use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenValidator;
use crate::config::Settings;
use crate::session::Lobby;
use crate::storage::GameStore;

/// Keep-alive timing for WebSocket connections.
#[derive(Debug, Clone, Copy)]
pub struct Heartbeat {
    pub interval: Duration,
    pub client_timeout: Duration,
}

/// Application state shared between connections
pub struct AppState {
    pub lobby: Lobby,
    pub validator: Arc<dyn TokenValidator>,
    pub heartbeat: Heartbeat,
}

impl AppState {
    pub fn new(
        settings: &Settings,
        store: Arc<dyn GameStore>,
        validator: Arc<dyn TokenValidator>,
    ) -> Self {
        Self {
            lobby: Lobby::new(store),
            validator,
            heartbeat: Heartbeat {
                interval: Duration::from_secs(settings.heartbeat_interval_secs),
                client_timeout: Duration::from_secs(settings.client_timeout_secs),
            },
        }
    }
}
