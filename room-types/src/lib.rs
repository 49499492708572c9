pub mod change;
pub mod entry;
pub mod errors;
pub mod keys;
pub mod messages;
pub mod player;
pub mod room;
pub mod sheet;

// Re-export all types
pub use change::*;
pub use entry::*;
pub use errors::*;
pub use keys::*;
pub use messages::*;
pub use player::*;
pub use room::*;
pub use sheet::*;

/// Milliseconds since the Unix epoch, the timestamp unit stored in the replica.
pub type Millis = i64;

/// Opaque per-device identity, generated once and persisted locally.
pub type PlayerId = uuid::Uuid;
