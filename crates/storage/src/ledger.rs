use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Sqlite};
use std::str::FromStr;
use tally_core::{
    LedgerStore, OwnerId, StoreError, Transaction, TransactionEdit, TransactionId,
    TransactionKind, TransactionPage, TransactionQuery,
};
use uuid::Uuid;

use crate::db::DbPool;

type TransactionRow = (String, String, String, String, String, String, String, i64, String, i64, i64);

const COLUMNS: &str = "id, owner, amount, kind, category, description, original_text, occurred_at, fingerprint, created_at, updated_at";

/// [`LedgerStore`] over the `transactions` table. The `(owner, fingerprint)`
/// unique index backs the dedup gate against concurrent submissions.
#[derive(Clone)]
pub struct SqliteLedger {
    pool: DbPool,
}

impl SqliteLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn fetch(&self, owner: &OwnerId, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {COLUMNS} FROM transactions WHERE id = ? AND owner = ?"
        ))
        .bind(id.to_string())
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(decode_row).transpose()
    }
}

#[async_trait]
impl LedgerStore for SqliteLedger {
    async fn window(
        &self,
        owner: &OwnerId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StoreError> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {COLUMNS} FROM transactions WHERE owner = ? AND occurred_at >= ? ORDER BY rowid"
        ))
        .bind(owner.as_str())
        .bind(since.timestamp_millis())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(decode_row).collect()
    }

    async fn list(
        &self,
        owner: &OwnerId,
        query: &TransactionQuery,
    ) -> Result<TransactionPage, StoreError> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM transactions");
        push_filters(&mut count, owner, query);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;

        let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM transactions"));
        push_filters(&mut select, owner, query);
        select.push(" ORDER BY occurred_at DESC, rowid DESC");
        if let Some(page) = query.page {
            select.push(" LIMIT ").push_bind(i64::from(page.size));
            select.push(" OFFSET ").push_bind(page.offset() as i64);
        }
        let rows: Vec<TransactionRow> = select
            .build_query_as::<TransactionRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        Ok(TransactionPage {
            total: total.max(0) as u64,
            transactions: rows.into_iter().map(decode_row).collect::<Result<_, _>>()?,
        })
    }

    async fn insert(&self, tx: &Transaction) -> Result<(), StoreError> {
        let result = sqlx::query(&format!(
            "INSERT INTO transactions ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(tx.id.to_string())
        .bind(tx.owner.as_str())
        .bind(tx.amount.to_string())
        .bind(tx.kind.as_str())
        .bind(&tx.category)
        .bind(&tx.description)
        .bind(&tx.original_text)
        .bind(tx.occurred_at.timestamp_millis())
        .bind(&tx.fingerprint)
        .bind(tx.created_at.timestamp_millis())
        .bind(tx.updated_at.timestamp_millis())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                tracing::debug!(owner = %tx.owner, fingerprint = %tx.fingerprint, "unique constraint hit");
                Err(StoreError::Conflict)
            }
            Err(e) => Err(backend(e)),
        }
    }

    async fn update(
        &self,
        owner: &OwnerId,
        id: TransactionId,
        edit: &TransactionEdit,
        now: DateTime<Utc>,
    ) -> Result<Option<Transaction>, StoreError> {
        let Some(mut tx) = self.fetch(owner, id).await? else {
            return Ok(None);
        };
        tx.apply(edit.clone(), now)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE transactions SET amount = ?, kind = ?, category = ?, description = ?, original_text = ?, occurred_at = ?, updated_at = ? WHERE id = ? AND owner = ?",
        )
        .bind(tx.amount.to_string())
        .bind(tx.kind.as_str())
        .bind(&tx.category)
        .bind(&tx.description)
        .bind(&tx.original_text)
        .bind(tx.occurred_at.timestamp_millis())
        .bind(tx.updated_at.timestamp_millis())
        .bind(id.to_string())
        .bind(owner.as_str())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        // Deleted between the read and the write.
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(tx))
    }

    async fn delete(&self, owner: &OwnerId, id: TransactionId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = ? AND owner = ?")
            .bind(id.to_string())
            .bind(owner.as_str())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, owner: &OwnerId, query: &TransactionQuery) {
    qb.push(" WHERE owner = ").push_bind(owner.as_str().to_string());
    if let Some(start) = query.range.start_instant() {
        qb.push(" AND occurred_at >= ").push_bind(start.timestamp_millis());
    }
    if let Some(end) = query.range.end_instant_exclusive() {
        qb.push(" AND occurred_at < ").push_bind(end.timestamp_millis());
    }
    if let Some(category) = &query.category {
        qb.push(" AND category = ").push_bind(category.clone());
    }
    if let Some(kind) = query.kind {
        qb.push(" AND kind = ").push_bind(kind.as_str());
    }
}

fn decode_row(r: TransactionRow) -> Result<Transaction, StoreError> {
    let id = Uuid::parse_str(&r.0)
        .map(TransactionId)
        .map_err(|e| corrupt("id", &r.0, e))?;
    let owner = OwnerId::new(&r.1).map_err(|e| corrupt("owner", &r.1, e))?;
    let amount = Decimal::from_str(&r.2).map_err(|e| corrupt("amount", &r.2, e))?;
    let kind = TransactionKind::from_str(&r.3).map_err(|e| corrupt("kind", &r.3, e))?;

    Ok(Transaction {
        id,
        owner,
        amount,
        kind,
        category: r.4,
        description: r.5,
        original_text: r.6,
        occurred_at: from_millis(r.7)?,
        fingerprint: r.8,
        created_at: from_millis(r.9)?,
        updated_at: from_millis(r.10)?,
    })
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::Backend(format!("timestamp out of range: {ms}")))
}

fn corrupt(column: &str, value: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("bad {column} value '{value}': {e}"))
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}
