pub mod barrier;
pub mod events;
pub mod host;
pub mod prompts;
pub mod roster;
pub mod rotation;
pub mod state;
pub mod state_machine;
pub mod text;

// Re-export main components
pub use barrier::*;
pub use events::*;
pub use host::*;
pub use prompts::*;
pub use roster::*;
pub use rotation::*;
pub use state::*;
pub use state_machine::*;
pub use text::*;

/// Current wall-clock time in the replica's timestamp unit.
pub fn now_millis() -> room_types::Millis {
    chrono::Utc::now().timestamp_millis()
}
