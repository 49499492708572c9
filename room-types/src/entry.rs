use serde::{Deserialize, Serialize};

/// A value observed through a subscription. The replica signals deletion with a tombstone,
/// which surfaces here as `Removed` instead of a null check at every call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entry<V> {
    Present(V),
    Removed,
}

impl<V> Entry<V> {
    pub fn present(self) -> Option<V> {
        match self {
            Entry::Present(value) => Some(value),
            Entry::Removed => None,
        }
    }

    pub fn is_removed(&self) -> bool {
        matches!(self, Entry::Removed)
    }

    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> Entry<U> {
        match self {
            Entry::Present(value) => Entry::Present(f(value)),
            Entry::Removed => Entry::Removed,
        }
    }
}

impl<V> From<Option<V>> for Entry<V> {
    fn from(value: Option<V>) -> Self {
        match value {
            Some(value) => Entry::Present(value),
            None => Entry::Removed,
        }
    }
}
