pub mod broadcast;
pub mod lobby;
pub mod matchmaking;
pub mod registry;

pub use broadcast::{Broadcaster, DeliveryReport};
pub use lobby::{JoinOutcome, Lobby};
pub use matchmaking::{MatchQueue, Pairing};
pub use registry::{Connection, ConnectionRegistry, Departure};
