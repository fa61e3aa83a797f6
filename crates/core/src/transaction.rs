use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ledger::{LedgerError, OwnerId, TransactionId, TransactionKind};

/// A candidate transaction, before it has passed the duplicate gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub description: String,
    pub original_text: Option<String>,
    #[serde(rename = "date", default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

impl NewTransaction {
    pub fn validate(&self) -> Result<(), LedgerError> {
        check_fields(self.amount, &self.category, &self.description)
    }

    /// Text compared by the fuzzy duplicate check.
    pub fn comparable_text(&self) -> &str {
        non_blank(self.original_text.as_deref()).unwrap_or(&self.description)
    }
}

/// Full-field replacement of an existing entry. The fingerprint is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEdit {
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub description: String,
    pub original_text: Option<String>,
    #[serde(rename = "date")]
    pub occurred_at: DateTime<Utc>,
}

impl TransactionEdit {
    pub fn validate(&self) -> Result<(), LedgerError> {
        check_fields(self.amount, &self.category, &self.description)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub owner: OwnerId,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub description: String,
    pub original_text: String,
    #[serde(rename = "date")]
    pub occurred_at: DateTime<Utc>,
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Materialize an admitted candidate. `occurred_at` defaults to `now` and
    /// `original_text` to the description.
    pub fn record(
        owner: OwnerId,
        candidate: NewTransaction,
        fingerprint: String,
        now: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        candidate.validate()?;

        let original_text = non_blank(candidate.original_text.as_deref())
            .unwrap_or(&candidate.description)
            .to_string();

        Ok(Transaction {
            id: TransactionId::generate(),
            owner,
            amount: candidate.amount,
            kind: candidate.kind,
            category: candidate.category.trim().to_string(),
            description: candidate.description.trim().to_string(),
            original_text,
            occurred_at: candidate.occurred_at.unwrap_or(now),
            fingerprint,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply(&mut self, edit: TransactionEdit, now: DateTime<Utc>) -> Result<(), LedgerError> {
        edit.validate()?;

        self.original_text = non_blank(edit.original_text.as_deref())
            .unwrap_or(&edit.description)
            .to_string();
        self.amount = edit.amount;
        self.kind = edit.kind;
        self.category = edit.category.trim().to_string();
        self.description = edit.description.trim().to_string();
        self.occurred_at = edit.occurred_at;
        self.updated_at = now;
        Ok(())
    }

    pub fn comparable_text(&self) -> &str {
        non_blank(Some(self.original_text.as_str())).unwrap_or(&self.description)
    }
}

fn check_fields(amount: Decimal, category: &str, description: &str) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InputInvalid("amount must be greater than zero".into()));
    }
    if category.trim().is_empty() {
        return Err(LedgerError::InputInvalid("category is required".into()));
    }
    if description.trim().is_empty() {
        return Err(LedgerError::InputInvalid("description is required".into()));
    }
    Ok(())
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    fn owner() -> OwnerId {
        OwnerId::new("user-1").unwrap()
    }

    fn candidate(amount: Decimal, description: &str) -> NewTransaction {
        NewTransaction {
            amount,
            kind: TransactionKind::Expense,
            category: "Food".into(),
            description: description.into(),
            original_text: None,
            occurred_at: None,
        }
    }

    #[test]
    fn record_defaults_occurred_at_and_original_text() {
        let tx = Transaction::record(owner(), candidate(dec("150"), "Coffee 150"), "fp".into(), now())
            .unwrap();
        assert_eq!(tx.occurred_at, now());
        assert_eq!(tx.original_text, "Coffee 150");
        assert_eq!(tx.created_at, tx.updated_at);
    }

    #[test]
    fn record_keeps_explicit_original_text() {
        let mut c = candidate(dec("12.5"), "Lunch");
        c.original_text = Some("lunch with Sam 12.50".into());
        let tx = Transaction::record(owner(), c, "fp".into(), now()).unwrap();
        assert_eq!(tx.original_text, "lunch with Sam 12.50");
        assert_eq!(tx.comparable_text(), "lunch with Sam 12.50");
    }

    #[test]
    fn rejects_non_positive_amount() {
        for amount in [dec("0"), dec("-5")] {
            assert!(matches!(
                candidate(amount, "Coffee").validate(),
                Err(LedgerError::InputInvalid(_))
            ));
        }
    }

    #[test]
    fn rejects_blank_description() {
        assert!(matches!(
            candidate(dec("1"), "   ").validate(),
            Err(LedgerError::InputInvalid(_))
        ));
    }

    #[test]
    fn comparable_text_falls_back_to_description() {
        let mut c = candidate(dec("1"), "Coffee");
        c.original_text = Some("  ".into());
        assert_eq!(c.comparable_text(), "Coffee");
    }

    #[test]
    fn apply_edit_replaces_fields_but_not_fingerprint() {
        let mut tx =
            Transaction::record(owner(), candidate(dec("150"), "Coffee 150"), "fp-1".into(), now())
                .unwrap();
        let later = now() + chrono::Duration::hours(2);
        let edit = TransactionEdit {
            amount: dec("175"),
            kind: TransactionKind::Expense,
            category: "Food".into(),
            description: "Coffee and cake".into(),
            original_text: None,
            occurred_at: now(),
        };
        tx.apply(edit, later).unwrap();
        assert_eq!(tx.amount, dec("175"));
        assert_eq!(tx.description, "Coffee and cake");
        assert_eq!(tx.original_text, "Coffee and cake");
        assert_eq!(tx.fingerprint, "fp-1");
        assert_eq!(tx.updated_at, later);
        assert_eq!(tx.created_at, now());
    }

    #[test]
    fn serializes_camel_case() {
        let tx = Transaction::record(owner(), candidate(dec("150"), "Coffee 150"), "fp".into(), now())
            .unwrap();
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["originalText"], "Coffee 150");
        assert_eq!(json["type"], "expense");
        assert_eq!(json["date"], "2024-01-15T12:00:00Z");
        assert_eq!(json["owner"], "user-1");
    }
}
