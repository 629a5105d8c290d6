//! Resource Ledger
//!
//! Records every remote resource a deployment creates. Nothing is rolled back
//! on failure, so the ledger is what tells the user what was left behind.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

/// Kinds of remote resources a template can create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    SpacesKey,
    Bucket,
    KnowledgeBase,
    IndexingJob,
    Namespace,
    Functions,
    Agent,
    AgentFunction,
    AgentApiKey,
    DatabaseUser,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::SpacesKey => write!(f, "spaces key"),
            ResourceKind::Bucket => write!(f, "bucket"),
            ResourceKind::KnowledgeBase => write!(f, "knowledge base"),
            ResourceKind::IndexingJob => write!(f, "indexing job"),
            ResourceKind::Namespace => write!(f, "functions namespace"),
            ResourceKind::Functions => write!(f, "functions"),
            ResourceKind::Agent => write!(f, "agent"),
            ResourceKind::AgentFunction => write!(f, "agent function"),
            ResourceKind::AgentApiKey => write!(f, "agent api key"),
            ResourceKind::DatabaseUser => write!(f, "database user"),
        }
    }
}

/// A single ledger entry
#[derive(Debug, Clone)]
pub struct ResourceRecord {
    pub kind: ResourceKind,
    pub id: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set when the resource was later removed by the same run
    pub released: bool,
}

/// Thread-safe, append-only record of created resources
#[derive(Clone, Default)]
pub struct ResourceLedger {
    inner: Arc<RwLock<Vec<ResourceRecord>>>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly created resource
    pub fn record(&self, kind: ResourceKind, id: impl Into<String>) {
        self.push(kind, id.into(), None);
    }

    /// Record a newly created resource with a short description
    pub fn record_with_note(
        &self,
        kind: ResourceKind,
        id: impl Into<String>,
        note: impl Into<String>,
    ) {
        self.push(kind, id.into(), Some(note.into()));
    }

    fn push(&self, kind: ResourceKind, id: String, note: Option<String>) {
        tracing::debug!(kind = %kind, id = %id, "Resource recorded");
        self.inner.write().push(ResourceRecord {
            kind,
            id,
            note,
            created_at: Utc::now(),
            released: false,
        });
    }

    /// Mark a resource as removed again. Returns false if it was never recorded.
    pub fn release(&self, kind: ResourceKind, id: &str) -> bool {
        let mut inner = self.inner.write();
        match inner
            .iter_mut()
            .find(|r| r.kind == kind && r.id == id && !r.released)
        {
            Some(record) => {
                record.released = true;
                true
            }
            None => false,
        }
    }

    /// All records in creation order
    pub fn records(&self) -> Vec<ResourceRecord> {
        self.inner.read().clone()
    }

    /// Records still present on the platform
    pub fn outstanding(&self) -> Vec<ResourceRecord> {
        self.inner
            .read()
            .iter()
            .filter(|r| !r.released)
            .cloned()
            .collect()
    }

    /// Identifiers of outstanding resources of one kind
    pub fn ids_of(&self, kind: ResourceKind) -> Vec<String> {
        self.inner
            .read()
            .iter()
            .filter(|r| r.kind == kind && !r.released)
            .map(|r| r.id.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
