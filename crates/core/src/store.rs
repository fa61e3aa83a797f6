use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::ledger::{LedgerError, OwnerId, TransactionId, TransactionKind};
use crate::period::DateRange;
use crate::transaction::{Transaction, TransactionEdit};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// `(owner, fingerprint)` already exists.
    #[error("Transaction with this fingerprint already exists")]
    Conflict,
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict => LedgerError::PersistenceConflict,
            StoreError::Backend(msg) => LedgerError::Store(msg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based.
    pub number: u32,
    pub size: u32,
}

impl Page {
    pub fn new(number: u32, size: u32) -> Self {
        Page { number: number.max(1), size: size.max(1) }
    }

    pub fn offset(self) -> u64 {
        u64::from(self.number - 1) * u64::from(self.size)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionQuery {
    pub range: DateRange,
    pub category: Option<String>,
    pub kind: Option<TransactionKind>,
    pub page: Option<Page>,
}

impl TransactionQuery {
    pub fn in_range(range: DateRange) -> Self {
        TransactionQuery { range, ..Default::default() }
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        self.range.contains_instant(tx.occurred_at)
            && self.kind.map_or(true, |k| k == tx.kind)
            && self.category.as_deref().map_or(true, |c| c == tx.category)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPage {
    /// Matches before pagination.
    pub total: u64,
    pub transactions: Vec<Transaction>,
}

/// Durable ledger collaborator. Implementations must reject a second insert of
/// the same `(owner, fingerprint)` with [`StoreError::Conflict`].
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Owner's entries with `occurred_at >= since`, in insertion order.
    async fn window(
        &self,
        owner: &OwnerId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StoreError>;

    /// Owner's entries matching `query`, newest `occurred_at` first.
    async fn list(
        &self,
        owner: &OwnerId,
        query: &TransactionQuery,
    ) -> Result<TransactionPage, StoreError>;

    async fn insert(&self, tx: &Transaction) -> Result<(), StoreError>;

    /// `None` when the id is absent or belongs to another owner.
    async fn update(
        &self,
        owner: &OwnerId,
        id: TransactionId,
        edit: &TransactionEdit,
        now: DateTime<Utc>,
    ) -> Result<Option<Transaction>, StoreError>;

    /// `false` when the id is absent or belongs to another owner.
    async fn delete(&self, owner: &OwnerId, id: TransactionId) -> Result<bool, StoreError>;
}

#[async_trait]
impl<T: LedgerStore + ?Sized> LedgerStore for Arc<T> {
    async fn window(
        &self,
        owner: &OwnerId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StoreError> {
        (**self).window(owner, since).await
    }

    async fn list(
        &self,
        owner: &OwnerId,
        query: &TransactionQuery,
    ) -> Result<TransactionPage, StoreError> {
        (**self).list(owner, query).await
    }

    async fn insert(&self, tx: &Transaction) -> Result<(), StoreError> {
        (**self).insert(tx).await
    }

    async fn update(
        &self,
        owner: &OwnerId,
        id: TransactionId,
        edit: &TransactionEdit,
        now: DateTime<Utc>,
    ) -> Result<Option<Transaction>, StoreError> {
        (**self).update(owner, id, edit, now).await
    }

    async fn delete(&self, owner: &OwnerId, id: TransactionId) -> Result<bool, StoreError> {
        (**self).delete(owner, id).await
    }
}
