use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

use crate::ledger::{OwnerId, TransactionId};
use crate::store::{LedgerStore, StoreError, TransactionPage, TransactionQuery};
use crate::transaction::{Transaction, TransactionEdit};

/// In-process ledger with the same uniqueness rules as the SQLite store.
/// Entries are kept in insertion order.
#[derive(Default)]
pub struct MemoryLedger {
    rows: Mutex<Vec<Transaction>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    fn rows(&self) -> MutexGuard<'_, Vec<Transaction>> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn window(
        &self,
        owner: &OwnerId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StoreError> {
        Ok(self
            .rows()
            .iter()
            .filter(|t| &t.owner == owner && t.occurred_at >= since)
            .cloned()
            .collect())
    }

    async fn list(
        &self,
        owner: &OwnerId,
        query: &TransactionQuery,
    ) -> Result<TransactionPage, StoreError> {
        let mut matched: Vec<Transaction> = self
            .rows()
            .iter()
            .filter(|t| &t.owner == owner && query.matches(t))
            .cloned()
            .collect();
        // Ties on occurred_at put the latest insert first.
        matched.sort_by(|a, b| a.occurred_at.cmp(&b.occurred_at));
        matched.reverse();

        let total = matched.len() as u64;
        let transactions = match query.page {
            Some(page) => matched
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.size as usize)
                .collect(),
            None => matched,
        };
        Ok(TransactionPage { total, transactions })
    }

    async fn insert(&self, tx: &Transaction) -> Result<(), StoreError> {
        let mut rows = self.rows();
        if rows
            .iter()
            .any(|t| t.owner == tx.owner && t.fingerprint == tx.fingerprint)
        {
            return Err(StoreError::Conflict);
        }
        rows.push(tx.clone());
        Ok(())
    }

    async fn update(
        &self,
        owner: &OwnerId,
        id: TransactionId,
        edit: &TransactionEdit,
        now: DateTime<Utc>,
    ) -> Result<Option<Transaction>, StoreError> {
        let mut rows = self.rows();
        let Some(tx) = rows.iter_mut().find(|t| t.id == id && &t.owner == owner) else {
            return Ok(None);
        };
        tx.apply(edit.clone(), now)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Some(tx.clone()))
    }

    async fn delete(&self, owner: &OwnerId, id: TransactionId) -> Result<bool, StoreError> {
        let mut rows = self.rows();
        let before = rows.len();
        rows.retain(|t| !(t.id == id && &t.owner == owner));
        Ok(rows.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TransactionKind;
    use crate::period::DateRange;
    use crate::store::Page;
    use chrono::{Duration, NaiveDate, TimeZone};
    use rust_decimal::Decimal;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn tx(owner: &str, fingerprint: &str, kind: TransactionKind, occurred_at: DateTime<Utc>) -> Transaction {
        Transaction {
            id: TransactionId::generate(),
            owner: OwnerId::new(owner).unwrap(),
            amount: Decimal::from(10),
            kind,
            category: "Food".into(),
            description: fingerprint.into(),
            original_text: fingerprint.into(),
            occurred_at,
            fingerprint: fingerprint.into(),
            created_at: occurred_at,
            updated_at: occurred_at,
        }
    }

    #[tokio::test]
    async fn insert_rejects_same_fingerprint_for_same_owner() {
        let store = MemoryLedger::new();
        store.insert(&tx("a", "fp", TransactionKind::Expense, at(1, 9))).await.unwrap();
        let again = store.insert(&tx("a", "fp", TransactionKind::Expense, at(1, 10))).await;
        assert_eq!(again, Err(StoreError::Conflict));
        // Another owner may hold the same fingerprint.
        store.insert(&tx("b", "fp", TransactionKind::Expense, at(1, 10))).await.unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn window_is_owner_scoped_and_bounded() {
        let store = MemoryLedger::new();
        let now = at(10, 12);
        store.insert(&tx("a", "old", TransactionKind::Expense, now - Duration::hours(30))).await.unwrap();
        store.insert(&tx("a", "new", TransactionKind::Expense, now - Duration::hours(2))).await.unwrap();
        store.insert(&tx("b", "other", TransactionKind::Expense, now)).await.unwrap();

        let owner = OwnerId::new("a").unwrap();
        let window = store.window(&owner, now - Duration::hours(24)).await.unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].fingerprint, "new");
    }

    #[tokio::test]
    async fn list_filters_sorts_and_paginates() {
        let store = MemoryLedger::new();
        for day in 1..=5 {
            store
                .insert(&tx("a", &format!("d{day}"), TransactionKind::Expense, at(day, 9)))
                .await
                .unwrap();
        }
        store.insert(&tx("a", "inc", TransactionKind::Income, at(3, 9))).await.unwrap();
        let owner = OwnerId::new("a").unwrap();

        let query = TransactionQuery {
            range: DateRange::between(
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            ),
            kind: Some(TransactionKind::Expense),
            page: Some(Page::new(1, 2)),
            ..Default::default()
        };
        let page = store.list(&owner, &query).await.unwrap();
        assert_eq!(page.total, 3);
        let fps: Vec<_> = page.transactions.iter().map(|t| t.fingerprint.as_str()).collect();
        assert_eq!(fps, vec!["d4", "d3"]);
    }

    #[tokio::test]
    async fn update_and_delete_are_owner_scoped() {
        let store = MemoryLedger::new();
        let original = tx("a", "fp", TransactionKind::Expense, at(1, 9));
        store.insert(&original).await.unwrap();
        let intruder = OwnerId::new("b").unwrap();
        let owner = OwnerId::new("a").unwrap();

        let edit = TransactionEdit {
            amount: Decimal::from(20),
            kind: TransactionKind::Expense,
            category: "Food".into(),
            description: "Edited".into(),
            original_text: None,
            occurred_at: at(1, 9),
        };
        assert!(store.update(&intruder, original.id, &edit, at(2, 9)).await.unwrap().is_none());
        assert!(!store.delete(&intruder, original.id).await.unwrap());

        let updated = store.update(&owner, original.id, &edit, at(2, 9)).await.unwrap().unwrap();
        assert_eq!(updated.amount, Decimal::from(20));
        assert_eq!(updated.fingerprint, "fp");
        assert!(store.delete(&owner, original.id).await.unwrap());
        assert!(store.is_empty());
    }
}
