//! Audit trail for advisor decisions
//!
//! Every answered or blocked advisor request is recorded with a PII-redacted
//! question and a SHA-256 hash for integrity checks. The log is bounded: once
//! `max_records` is reached the oldest record is evicted.

use crate::models::{AdvisorIntent, AdvisorResponse, AuditAction, AuditRecord, ResponseSource};
use crate::privacy::redact_pii;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Default number of records kept in memory
pub const DEFAULT_MAX_RECORDS: usize = 10_000;

#[derive(Default)]
struct AuditStore {
    records: HashMap<Uuid, AuditRecord>,
    /// Insertion order, oldest first
    order: VecDeque<Uuid>,
}

/// Audit trail storage
pub struct AuditLog {
    store: Arc<RwLock<AuditStore>>,
    max_records: usize,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_RECORDS)
    }

    /// Log that keeps at most `max_records` entries (at least one)
    pub fn with_capacity(max_records: usize) -> Self {
        Self {
            store: Arc::new(RwLock::new(AuditStore::default())),
            max_records: max_records.max(1),
        }
    }

    /// Record the outcome of one advisor request
    pub async fn record_advisor(&self, question: &str, response: &AdvisorResponse) -> Result<Uuid> {
        let action = if response.blocked {
            AuditAction::AiRequestBlocked
        } else {
            AuditAction::AiRequestAnswered
        };

        let audit_id = Uuid::new_v4();
        let created_at = Utc::now();
        let question = redact_pii(question);
        let integrity_hash = compute_record_hash(&HashedFields {
            audit_id,
            action,
            intent: response.intent,
            question: &question,
            source: response.source,
            created_at,
        })?;

        let record = AuditRecord {
            audit_id,
            action,
            intent: response.intent,
            question,
            source: response.source,
            created_at,
            integrity_hash,
        };

        info!(%audit_id, ?action, intent = %response.intent, "Advisor request audited");

        let mut store = self.store.write().await;
        while store.order.len() >= self.max_records {
            if let Some(evicted) = store.order.pop_front() {
                store.records.remove(&evicted);
                debug!(audit_id = %evicted, "Evicted oldest audit record");
            }
        }
        store.order.push_back(audit_id);
        store.records.insert(audit_id, record);
        Ok(audit_id)
    }

    /// Retrieve a record by audit ID
    pub async fn get(&self, audit_id: Uuid) -> Result<Option<AuditRecord>> {
        let store = self.store.read().await;
        Ok(store.records.get(&audit_id).cloned())
    }

    /// Number of records currently held
    pub async fn len(&self) -> usize {
        self.store.read().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// All audit IDs for one action, oldest first
    pub async fn list_by_action(&self, action: AuditAction) -> Result<Vec<Uuid>> {
        let store = self.store.read().await;

        Ok(store
            .order
            .iter()
            .filter(|id| {
                store
                    .records
                    .get(*id)
                    .is_some_and(|record| record.action == action)
            })
            .copied()
            .collect())
    }

    /// Verify a record's integrity via hash
    pub async fn verify_integrity(&self, audit_id: Uuid) -> Result<bool> {
        let store = self.store.read().await;

        let Some(record) = store.records.get(&audit_id) else {
            return Ok(false);
        };

        let current = compute_record_hash(&HashedFields {
            audit_id: record.audit_id,
            action: record.action,
            intent: record.intent,
            question: &record.question,
            source: record.source,
            created_at: record.created_at,
        })?;

        Ok(current == record.integrity_hash)
    }

    #[cfg(test)]
    async fn tamper(&self, audit_id: Uuid, question: &str) {
        let mut store = self.store.write().await;
        if let Some(record) = store.records.get_mut(&audit_id) {
            record.question = question.to_string();
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct HashedFields<'a> {
    audit_id: Uuid,
    action: AuditAction,
    intent: AdvisorIntent,
    question: &'a str,
    source: ResponseSource,
    created_at: DateTime<Utc>,
}

/// SHA-256 over the record's fields, streamed straight into the hasher
fn compute_record_hash(fields: &HashedFields<'_>) -> Result<String> {
    let mut hasher = Sha256::new();
    serde_json::to_writer(&mut HashWriter(&mut hasher), fields)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Adapter to allow writing into Sha256 via std::io::Write
struct HashWriter<'a, H: Digest>(&'a mut H);

impl<'a, H: Digest> Write for HashWriter<'a, H> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
