//! # DAG collaborator.
//!
//! The runtime never computes a topological order itself: a [`Dag`] hands it
//! the vertices **sinks first**, so every vertex comes after the vertices that
//! consume its output. Starting containers in that order guarantees that a
//! producer only starts once its consumers are ready.

use std::fmt;
use std::sync::Arc;

/// Identifier of one DAG vertex (and of the container running it).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(Arc<str>);

impl VertexId {
    /// Creates an id from a vertex name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Returns the vertex name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VertexId({})", self.0)
    }
}

impl From<&str> for VertexId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for VertexId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// A job graph as seen by startup orchestration.
pub trait Dag: Send + Sync + 'static {
    /// Returns every vertex in reverse topological order.
    ///
    /// Ties between independent vertices are broken by the implementor; the
    /// order must be stable across calls.
    fn reverse_topological(&self) -> Vec<VertexId>;
}

/// A precomputed order: the vector already is the reverse topological order.
impl Dag for Vec<VertexId> {
    fn reverse_topological(&self) -> Vec<VertexId> {
        self.clone()
    }
}
