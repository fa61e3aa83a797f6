use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Opaque identifier of the ledger owner. Every ledger operation is scoped to one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(raw: &str) -> Result<Self, LedgerError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LedgerError::InputInvalid("owner is required".into()));
        }
        Ok(OwnerId(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    pub fn generate() -> Self {
        TransactionId(Uuid::new_v4())
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TransactionId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(TransactionId)
            .map_err(|_| LedgerError::InputInvalid(format!("malformed transaction id '{s}'")))
    }
}

/// Direction of money flow. Amounts are always stored as positive magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("Unknown transaction type: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Invalid input: {0}")]
    InputInvalid(String),
    #[error("This exact transaction was already added recently ({0})")]
    DuplicateExact(TransactionId),
    #[error("A similar transaction was already added recently ({0})")]
    DuplicateSimilar(TransactionId),
    #[error("Duplicate transaction detected")]
    PersistenceConflict,
    #[error("Transaction not found: {0}")]
    NotFound(TransactionId),
    #[error("Ledger store error: {0}")]
    Store(String),
}

impl LedgerError {
    /// Exact duplicates and store-level conflicts are the same outcome to a caller.
    pub fn is_exact_duplicate(&self) -> bool {
        matches!(self, LedgerError::DuplicateExact(_) | LedgerError::PersistenceConflict)
    }

    /// The colliding entry, when the rejection names one.
    pub fn duplicate_of(&self) -> Option<TransactionId> {
        match self {
            LedgerError::DuplicateExact(id) | LedgerError::DuplicateSimilar(id) => Some(*id),
            _ => None,
        }
    }
}

pub const OTHER_CATEGORY: &str = "Other";

/// Recommended category labels. The set is open; these are what the parser
/// is asked to choose from.
pub const CATEGORIES: &[&str] = &[
    "Food",
    "Transportation",
    "Entertainment",
    "Shopping",
    "Healthcare",
    "Education",
    "Utilities",
    "Salary",
    "Gift",
    OTHER_CATEGORY,
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn owner_is_trimmed() {
        assert_eq!(OwnerId::new("  user-1 ").unwrap().as_str(), "user-1");
    }

    #[test]
    fn blank_owner_is_invalid() {
        assert!(matches!(OwnerId::new("   "), Err(LedgerError::InputInvalid(_))));
    }

    #[test]
    fn kind_roundtrip() {
        assert_eq!(TransactionKind::from_str("Income").unwrap(), TransactionKind::Income);
        assert_eq!(TransactionKind::Expense.to_string(), "expense");
        assert!(TransactionKind::from_str("transfer").is_err());
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&TransactionKind::Income).unwrap();
        assert_eq!(json, "\"income\"");
    }

    #[test]
    fn malformed_id_is_invalid_input() {
        assert!(matches!(
            TransactionId::from_str("not-a-uuid"),
            Err(LedgerError::InputInvalid(_))
        ));
    }

    #[test]
    fn persistence_conflict_counts_as_exact() {
        assert!(LedgerError::PersistenceConflict.is_exact_duplicate());
        let id = TransactionId::generate();
        assert!(LedgerError::DuplicateExact(id).is_exact_duplicate());
        assert!(!LedgerError::DuplicateSimilar(id).is_exact_duplicate());
        assert_eq!(LedgerError::DuplicateSimilar(id).duplicate_of(), Some(id));
    }

    #[test]
    fn categories_end_with_other() {
        assert_eq!(CATEGORIES.last(), Some(&OTHER_CATEGORY));
    }
}
