//! Bounded, append-only record of tool invocations.
//!
//! Records get strictly increasing ids and are never mutated. Trimming is
//! approximate: the log is allowed to grow [`TRIM_BATCH`] entries past its
//! bound before the oldest entries are dropped in one pass, so the bound is
//! only exceeded by less than one batch at any moment.
//!
//! Readers hold a [`Cursor`] and can block until something newer is appended.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Number of entries the log may overshoot its bound before a trim pass.
pub const TRIM_BATCH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Success,
    Failed,
    NotImplemented,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Success => "success",
            CallStatus::Failed => "failed",
            CallStatus::NotImplemented => "not_implemented",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    pub id: u64,
    pub tool_name: String,
    pub user_id: String,
    pub status: CallStatus,
    pub created_at: DateTime<Utc>,
}

/// Position of a reader in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// Only records appended after the read starts.
    Latest,
    /// Records with an id greater than the given one.
    After(u64),
}

/// Result of a cursor read. `cursor` is always concrete and resumes after
/// the last returned record.
#[derive(Debug, Clone)]
pub struct AuditBatch {
    pub records: Vec<AuditRecord>,
    pub cursor: Cursor,
}

struct Inner {
    records: VecDeque<AuditRecord>,
    last_id: u64,
}

pub struct AuditLog {
    max_len: usize,
    inner: RwLock<Inner>,
    latest: watch::Sender<u64>,
}

impl AuditLog {
    pub fn new(max_len: usize) -> Self {
        let (latest, _) = watch::channel(0);
        Self {
            max_len,
            inner: RwLock::new(Inner {
                records: VecDeque::with_capacity(max_len.min(1024)),
                last_id: 0,
            }),
            latest,
        }
    }

    /// Append a record and return its id.
    pub fn append(&self, tool_name: &str, user_id: &str, status: CallStatus) -> u64 {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.last_id += 1;
        let id = inner.last_id;
        inner.records.push_back(AuditRecord {
            id,
            tool_name: tool_name.to_string(),
            user_id: user_id.to_string(),
            status,
            created_at: Utc::now(),
        });

        if inner.records.len() >= self.max_len.saturating_add(TRIM_BATCH) {
            let excess = inner.records.len() - self.max_len;
            inner.records.drain(..excess);
            tracing::debug!(trimmed = excess, retained = self.max_len, "Audit log trimmed");
        }

        // Published under the lock so the watched id never moves backwards.
        self.latest.send_replace(id);
        id
    }

    /// Up to `count` records after `cursor`, waiting at most `block` for one to appear.
    pub async fn read(&self, cursor: Cursor, count: usize, block: Duration) -> AuditBatch {
        let mut changes = self.latest.subscribe();
        let after = match cursor {
            Cursor::Latest => *changes.borrow_and_update(),
            Cursor::After(id) => id,
        };
        let deadline = Instant::now() + block;

        loop {
            let records = self.collect_after(after, count);
            if !records.is_empty() {
                let last = records.last().map_or(after, |r| r.id);
                return AuditBatch {
                    records,
                    cursor: Cursor::After(last),
                };
            }

            match tokio::time::timeout_at(deadline, changes.changed()).await {
                Ok(Ok(())) => continue,
                Ok(Err(_)) | Err(_) => {
                    return AuditBatch {
                        records: Vec::new(),
                        cursor: Cursor::After(after),
                    }
                }
            }
        }
    }

    fn collect_after(&self, after: u64, count: usize) -> Vec<AuditRecord> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let start = inner.records.partition_point(|r| r.id <= after);
        inner
            .records
            .iter()
            .skip(start)
            .take(count)
            .cloned()
            .collect()
    }

    pub fn latest_id(&self) -> u64 {
        *self.latest.borrow()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}
