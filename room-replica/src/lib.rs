//! Typed access to the peer-replicated graph store rooms live in.
//!
//! The store itself (replication, gossip, durability) is external. This crate defines the
//! contract it must satisfy, an in-memory implementation of that contract, and the typed
//! room façade the engine talks to.

pub mod error;
pub mod memory;
pub mod path;
pub mod rooms;
pub mod store;
pub mod subscription;

pub use error::ReplicaError;
pub use memory::MemoryReplica;
pub use path::NodePath;
pub use rooms::{Collection, DirectoryFeed, RoomFeed, RoomReplica};
pub use store::{Node, ReplicaStore};
pub use subscription::Subscription;
