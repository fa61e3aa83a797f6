use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::{DateRange, Money, Transaction, TransactionKind, TrendPeriod};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendBucket {
    /// `2024-03-05`, `2024-W10` or `2024-03` depending on the period.
    pub period: String,
    pub income: Money,
    pub expenses: Money,
}

/// Income and expense per day, ISO week or month, oldest first.
///
/// Only buckets holding at least one transaction are emitted. A bucket with
/// only one kind reports zero for the other.
pub fn trends(transactions: &[Transaction], period: TrendPeriod, range: DateRange) -> Vec<TrendBucket> {
    let mut buckets: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();
    for t in transactions.iter().filter(|t| range.contains_instant(t.occurred_at)) {
        let key = period.bucket_start(t.occurred_at.date_naive());
        let entry = buckets.entry(key).or_insert((Decimal::ZERO, Decimal::ZERO));
        match t.kind {
            TransactionKind::Income => entry.0 += t.amount,
            TransactionKind::Expense => entry.1 += t.amount,
        }
    }

    buckets
        .into_iter()
        .map(|(start, (income, expenses))| TrendBucket {
            period: period.label(start),
            income: Money::from(income),
            expenses: Money::from(expenses),
        })
        .collect()
}
