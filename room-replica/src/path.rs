use std::fmt;

/// Slash-separated address of a node in the replicated graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodePath(String);

impl NodePath {
    pub fn root(name: &str) -> Self {
        Self(escape(name))
    }

    /// Descend into a child. Slashes inside `key` are escaped so a key is always one segment.
    pub fn child(&self, key: impl fmt::Display) -> Self {
        Self(format!("{}/{}", self.0, escape(&key.to_string())))
    }

    pub fn parent(&self) -> Option<NodePath> {
        self.0
            .rsplit_once('/')
            .map(|(parent, _)| NodePath(parent.to_string()))
    }

    /// Last segment, as delivered alongside child values.
    pub fn key(&self) -> &str {
        self.0.rsplit_once('/').map_or(self.0.as_str(), |(_, key)| key)
    }

    pub fn is_within(&self, ancestor: &NodePath) -> bool {
        self == ancestor
            || self
                .0
                .strip_prefix(ancestor.0.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn escape(segment: &str) -> String {
    segment.replace('%', "%25").replace('/', "%2F")
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
