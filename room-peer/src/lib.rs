//! A peer in a folded-sheet game: one session per local identity, one coordinator per
//! open room, everything shared through the replicated store.

pub mod config;
pub mod coordinator;
pub mod directory;
pub mod events;
pub mod ledger;
pub mod route;
pub mod session;

pub use config::PeerConfig;
pub use coordinator::{RoomCommand, RoomCoordinator, RoomHandle};
pub use directory::RoomDirectory;
pub use events::{EventForwarder, EventLog};
pub use ledger::AnswerLedger;
pub use route::Route;
pub use session::{PeerSession, SessionOptions};
