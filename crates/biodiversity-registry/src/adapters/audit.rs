//! # Audit Sinks
//!
//! Append-only delivery of [`AuditEvent`]s to external observers.

use crate::errors::AuditError;
use crate::events::{AuditEntry, AuditEvent};
use crate::ports::outbound::AuditSink;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Default broadcast channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

// =============================================================================
// IN-MEMORY LOG
// =============================================================================

/// Append-only, sequence-numbered audit log held in memory.
#[derive(Default)]
pub struct InMemoryAuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries in commit order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().clone()
    }

    /// Events only, in commit order.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.entries
            .read()
            .iter()
            .map(|entry| entry.event.clone())
            .collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing has been logged.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl AuditSink for InMemoryAuditLog {
    fn emit(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let mut entries = self.entries.write();
        let sequence = entries.len() as u64;
        entries.push(AuditEntry::new(sequence, event.clone()));
        Ok(())
    }
}

// =============================================================================
// BROADCAST
// =============================================================================

/// Publishes audit entries on a `tokio::sync::broadcast` channel.
///
/// Emission fails with [`AuditError::Closed`] while nobody is subscribed;
/// the sequence number still advances.
pub struct BroadcastAuditSink {
    sender: broadcast::Sender<AuditEntry>,
    sequence: AtomicU64,
}

impl Default for BroadcastAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastAuditSink {
    /// Sink with the default channel capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Sink with the given channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            sequence: AtomicU64::new(0),
        }
    }

    /// New receiver for entries emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AuditEntry> {
        self.sender.subscribe()
    }

    /// Number of active receivers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl AuditSink for BroadcastAuditSink {
    fn emit(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let entry = AuditEntry::new(sequence, event.clone());
        match self.sender.send(entry) {
            Ok(receivers) => {
                debug!(topic = event.topic(), receivers, "Audit entry broadcast");
                Ok(())
            }
            Err(_) => Err(AuditError::Closed),
        }
    }
}

// =============================================================================
// TRACING
// =============================================================================

/// Writes each event as a JSON payload on the `audit` tracing target.
#[derive(Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let payload =
            serde_json::to_string(event).map_err(|e| AuditError::Serialization(e.to_string()))?;
        info!(target: "audit", topic = event.topic(), %payload, "Audit event");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
