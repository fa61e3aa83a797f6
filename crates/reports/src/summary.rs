use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::{DateRange, Money, Transaction, TransactionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub income: Money,
    pub expenses: Money,
    /// `income - expenses`; negative when spending exceeds income.
    pub savings: Money,
}

impl Summary {
    pub fn zero() -> Self {
        Summary { income: Money::zero(), expenses: Money::zero(), savings: Money::zero() }
    }
}

/// Period totals for the transactions inside `range`. Empty input gives all zeros.
pub fn summarize(transactions: &[Transaction], range: DateRange) -> Summary {
    let (income, expenses) = transactions
        .iter()
        .filter(|t| range.contains_instant(t.occurred_at))
        .fold((Decimal::ZERO, Decimal::ZERO), |(inc, exp), t| match t.kind {
            TransactionKind::Income => (inc + t.amount, exp),
            TransactionKind::Expense => (inc, exp + t.amount),
        });

    Summary {
        income: Money::from(income),
        expenses: Money::from(expenses),
        savings: Money::from(income - expenses),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::str::FromStr;
    use tally_core::{OwnerId, TransactionId};

    fn tx(amount: &str, kind: TransactionKind, day: u32) -> Transaction {
        let at = Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap();
        Transaction {
            id: TransactionId::generate(),
            owner: OwnerId::new("u1").unwrap(),
            amount: Decimal::from_str(amount).unwrap(),
            kind,
            category: "Other".into(),
            description: "entry".into(),
            original_text: "entry".into(),
            occurred_at: at,
            fingerprint: format!("{amount}-{day}"),
            created_at: at,
            updated_at: at,
        }
    }

    fn money(s: &str) -> Money {
        Money::from(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn income_minus_expenses() {
        let ledger = vec![
            tx("1000", TransactionKind::Income, 1),
            tx("400", TransactionKind::Expense, 2),
        ];
        let summary = summarize(&ledger, DateRange::all());
        assert_eq!(summary.income, money("1000"));
        assert_eq!(summary.expenses, money("400"));
        assert_eq!(summary.savings, money("600"));
    }

    #[test]
    fn empty_ledger_is_all_zero() {
        assert_eq!(summarize(&[], DateRange::all()), Summary::zero());
    }

    #[test]
    fn savings_can_go_negative() {
        let ledger = vec![
            tx("50", TransactionKind::Income, 1),
            tx("80.255", TransactionKind::Expense, 2),
        ];
        let summary = summarize(&ledger, DateRange::all());
        assert_eq!(summary.expenses, money("80.26"));
        assert_eq!(summary.savings, money("-30.255"));
        assert_eq!(summary.savings.to_string(), "-30.26");
    }

    #[test]
    fn range_excludes_outside_entries() {
        let ledger = vec![
            tx("1000", TransactionKind::Income, 1),
            tx("400", TransactionKind::Expense, 20),
        ];
        let march_first_week = DateRange::between(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
        );
        let summary = summarize(&ledger, march_first_week);
        assert_eq!(summary.expenses, Money::zero());
        assert_eq!(summary.savings, money("1000"));
    }

    #[test]
    fn serializes_with_two_decimals() {
        let ledger = vec![tx("12.5", TransactionKind::Income, 1)];
        let json = serde_json::to_value(summarize(&ledger, DateRange::all())).unwrap();
        assert_eq!(json["income"], "12.50");
        assert_eq!(json["savings"], "12.50");
    }
}
