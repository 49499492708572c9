use async_trait::async_trait;
use dashmap::DashMap;
use room_types::Entry;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::{Node, NodePath, ReplicaError, ReplicaStore, Subscription};

struct Watcher<T> {
    id: Uuid,
    sender: mpsc::UnboundedSender<T>,
}

#[derive(Default)]
struct Inner {
    nodes: DashMap<NodePath, Node>,
    node_watchers: WatcherMap<Entry<Node>>,
    child_watchers: WatcherMap<(String, Entry<Node>)>,
    rejections: DashMap<NodePath, String>,
}

/// In-process replica shared by every peer that holds a clone.
///
/// Writes apply in arrival order, which is the last-write-wins outcome a real replica
/// converges to. Used by the local table and by tests; it has no transport of its own.
#[derive(Clone, Default)]
pub struct MemoryReplica {
    inner: Arc<Inner>,
}

impl MemoryReplica {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write under `prefix` fail its acknowledgement.
    pub fn reject_writes(&self, prefix: NodePath, reason: impl Into<String>) {
        self.inner.rejections.insert(prefix, reason.into());
    }

    pub fn accept_writes(&self, prefix: &NodePath) {
        self.inner.rejections.remove(prefix);
    }

    /// Live subscriptions registered on the store, for leak checks.
    pub fn subscription_count(&self) -> usize {
        let nodes: usize = self.inner.node_watchers.iter().map(|w| w.len()).sum();
        let children: usize = self.inner.child_watchers.iter().map(|w| w.len()).sum();
        nodes + children
    }

    fn rejection_for(&self, path: &NodePath) -> Option<String> {
        self.inner
            .rejections
            .iter()
            .find(|rule| path.is_within(rule.key()))
            .map(|rule| rule.value().clone())
    }

    fn live_children(&self, path: &NodePath) -> Vec<(String, Node)> {
        let mut children: Vec<(String, Node)> = self
            .inner
            .nodes
            .iter()
            .filter(|node| node.key().parent().as_ref() == Some(path))
            .map(|node| (node.key().key().to_string(), node.value().clone()))
            .collect();
        children.sort_by(|a, b| a.0.cmp(&b.0));
        children
    }

    fn notify(&self, path: &NodePath, entry: Entry<Node>) {
        if let Some(mut watchers) = self.inner.node_watchers.get_mut(path) {
            watchers.retain(|w| w.sender.send(entry.clone()).is_ok());
        }
        if let Some(parent) = path.parent() {
            if let Some(mut watchers) = self.inner.child_watchers.get_mut(&parent) {
                let key = path.key().to_string();
                watchers.retain(|w| w.sender.send((key.clone(), entry.clone())).is_ok());
            }
        }
    }
}

type WatcherMap<T> = DashMap<NodePath, Vec<Watcher<T>>>;

fn unregister<T>(
    inner: &Weak<Inner>,
    path: NodePath,
    id: Uuid,
    select: fn(&Inner) -> &WatcherMap<T>,
) {
    if let Some(inner) = inner.upgrade() {
        let watchers = select(&inner);
        if let Some(mut list) = watchers.get_mut(&path) {
            list.retain(|w| w.id != id);
        }
        watchers.remove_if(&path, |_, list| list.is_empty());
    }
}

#[async_trait]
impl ReplicaStore for MemoryReplica {
    async fn once(&self, path: &NodePath) -> Result<Option<Node>, ReplicaError> {
        Ok(self.inner.nodes.get(path).map(|node| node.value().clone()))
    }

    async fn children_once(&self, path: &NodePath) -> Result<Vec<(String, Node)>, ReplicaError> {
        Ok(self.live_children(path))
    }

    async fn put(&self, path: &NodePath, fields: Option<Node>) -> Result<(), ReplicaError> {
        if let Some(reason) = self.rejection_for(path) {
            return Err(ReplicaError::Rejected {
                path: path.to_string(),
                reason,
            });
        }

        let entry = match fields {
            Some(fields) => {
                let mut node = self.inner.nodes.entry(path.clone()).or_default();
                for (field, value) in fields {
                    node.insert(field, value);
                }
                Entry::Present(node.value().clone())
            }
            None => {
                self.inner.nodes.remove(path);
                Entry::Removed
            }
        };

        debug!("put {} ({})", path, if entry.is_removed() { "tombstone" } else { "merge" });
        self.notify(path, entry);
        Ok(())
    }

    fn on(&self, path: &NodePath) -> Subscription<Entry<Node>> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.inner
            .node_watchers
            .entry(path.clone())
            .or_default()
            .push(Watcher {
                id,
                sender: sender.clone(),
            });

        if let Some(node) = self.inner.nodes.get(path).map(|n| n.value().clone()) {
            let _ = sender.send(Entry::Present(node));
        }

        let inner = Arc::downgrade(&self.inner);
        let path = path.clone();
        Subscription::new(receiver, move || {
            unregister(&inner, path, id, |inner| &inner.node_watchers)
        })
    }

    fn map_on(&self, path: &NodePath) -> Subscription<(String, Entry<Node>)> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.inner
            .child_watchers
            .entry(path.clone())
            .or_default()
            .push(Watcher {
                id,
                sender: sender.clone(),
            });

        for (key, node) in self.live_children(path) {
            let _ = sender.send((key, Entry::Present(node)));
        }

        let inner = Arc::downgrade(&self.inner);
        let path = path.clone();
        Subscription::new(receiver, move || {
            unregister(&inner, path, id, |inner| &inner.child_watchers)
        })
    }
}
