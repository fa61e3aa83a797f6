use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::{DateRange, Money, Transaction, TransactionKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: Money,
    pub count: u64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

/// Per-category totals of one kind inside `range`.
///
/// Expenses come out smallest first and income largest first. Equal amounts
/// fall back to category name.
pub fn category_breakdown(
    transactions: &[Transaction],
    kind: TransactionKind,
    range: DateRange,
) -> Vec<CategoryTotal> {
    let mut groups: BTreeMap<&str, (Decimal, u64)> = BTreeMap::new();
    for t in transactions
        .iter()
        .filter(|t| t.kind == kind && range.contains_instant(t.occurred_at))
    {
        let entry = groups.entry(t.category.as_str()).or_insert((Decimal::ZERO, 0));
        entry.0 += t.amount;
        entry.1 += 1;
    }

    let mut rows: Vec<CategoryTotal> = groups
        .into_iter()
        .map(|(category, (sum, count))| CategoryTotal {
            category: category.to_string(),
            amount: Money::from(sum),
            count,
            kind,
        })
        .collect();

    // BTreeMap iteration already ordered rows by name; a stable sort keeps that
    // for ties.
    match kind {
        TransactionKind::Expense => rows.sort_by(|a, b| a.amount.cmp(&b.amount)),
        TransactionKind::Income => rows.sort_by(|a, b| b.amount.cmp(&a.amount)),
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;
    use tally_core::{OwnerId, TransactionId};

    fn tx(amount: &str, kind: TransactionKind, category: &str) -> Transaction {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();
        Transaction {
            id: TransactionId::generate(),
            owner: OwnerId::new("u1").unwrap(),
            amount: Decimal::from_str(amount).unwrap(),
            kind,
            category: category.into(),
            description: category.into(),
            original_text: category.into(),
            occurred_at: at,
            fingerprint: TransactionId::generate().to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    fn shape(rows: &[CategoryTotal]) -> Vec<(String, String, u64)> {
        rows.iter()
            .map(|r| (r.category.clone(), r.amount.to_string(), r.count))
            .collect()
    }

    #[test]
    fn expenses_ascending() {
        let ledger = vec![
            tx("90", TransactionKind::Expense, "Transport"),
            tx("30", TransactionKind::Expense, "Food"),
        ];
        let rows = category_breakdown(&ledger, TransactionKind::Expense, DateRange::all());
        assert_eq!(
            shape(&rows),
            vec![
                ("Food".to_string(), "30.00".to_string(), 1),
                ("Transport".to_string(), "90.00".to_string(), 1),
            ]
        );
        assert!(rows.iter().all(|r| r.kind == TransactionKind::Expense));
    }

    #[test]
    fn income_descending() {
        let ledger = vec![
            tx("200", TransactionKind::Income, "Gift"),
            tx("3000", TransactionKind::Income, "Salary"),
            tx("500", TransactionKind::Expense, "Shopping"),
        ];
        let rows = category_breakdown(&ledger, TransactionKind::Income, DateRange::all());
        assert_eq!(
            shape(&rows),
            vec![
                ("Salary".to_string(), "3000.00".to_string(), 1),
                ("Gift".to_string(), "200.00".to_string(), 1),
            ]
        );
    }

    #[test]
    fn groups_and_counts() {
        let ledger = vec![
            tx("10.10", TransactionKind::Expense, "Food"),
            tx("5.255", TransactionKind::Expense, "Food"),
            tx("40", TransactionKind::Expense, "Utilities"),
        ];
        let rows = category_breakdown(&ledger, TransactionKind::Expense, DateRange::all());
        assert_eq!(rows[0].category, "Food");
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].amount.to_string(), "15.36");
    }

    #[test]
    fn ties_are_ordered_by_name() {
        let ledger = vec![
            tx("25", TransactionKind::Expense, "Shopping"),
            tx("25", TransactionKind::Expense, "Education"),
        ];
        let rows = category_breakdown(&ledger, TransactionKind::Expense, DateRange::all());
        assert_eq!(rows[0].category, "Education");
        assert_eq!(rows[1].category, "Shopping");
    }

    #[test]
    fn nothing_of_that_kind_is_empty() {
        let ledger = vec![tx("25", TransactionKind::Expense, "Food")];
        assert!(category_breakdown(&ledger, TransactionKind::Income, DateRange::all()).is_empty());
    }
}
