pub mod engine;
pub mod rules;

pub use engine::{GameEngine, MoveOutcome};
pub use rules::{check_victory, Victory, WinLine};
