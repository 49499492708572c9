use async_trait::async_trait;
use room_types::Entry;
use serde_json::{Map, Value};

use crate::{NodePath, ReplicaError, Subscription};

/// Leaf fields of one graph node.
pub type Node = Map<String, Value>;

/// What the engine needs from the replicated graph store.
///
/// Convergence is eventual and last-write-wins per leaf field. There are no transactions
/// and no compare-and-set, so callers must only issue writes that are safe to repeat.
#[async_trait]
pub trait ReplicaStore: Send + Sync + 'static {
    /// One-shot read of a node.
    async fn once(&self, path: &NodePath) -> Result<Option<Node>, ReplicaError>;

    /// One-shot read of every live child of a node, keyed by child key.
    async fn children_once(&self, path: &NodePath) -> Result<Vec<(String, Node)>, ReplicaError>;

    /// Merge `fields` into the node at `path`, or tombstone it when `None`.
    /// The result is the local acknowledgement; peers converge later.
    async fn put(&self, path: &NodePath, fields: Option<Node>) -> Result<(), ReplicaError>;

    /// Watch one node. The current value is delivered first, then every change.
    fn on(&self, path: &NodePath) -> Subscription<Entry<Node>>;

    /// Watch every child of a node as `(key, entry)` pairs, current children first.
    fn map_on(&self, path: &NodePath) -> Subscription<(String, Entry<Node>)>;
}
