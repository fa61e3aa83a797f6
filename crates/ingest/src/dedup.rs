use chrono::{DateTime, Duration, Utc};
use tally_core::{NewTransaction, OwnerId, Transaction, TransactionId};

use crate::fingerprint::fingerprint;
use crate::similarity::similarity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Safe to persist with this fingerprint.
    Accepted { fingerprint: String },
    /// Same content already recorded inside the window.
    RejectedExact(TransactionId),
    /// Text too close to an entry inside the window.
    RejectedSimilar(TransactionId),
}

/// Pure duplicate decision over a caller-supplied window of the owner's
/// recent transactions. Performs no I/O.
#[derive(Debug, Clone)]
pub struct DedupGate {
    /// Scores strictly above this are treated as duplicates.
    pub similarity_threshold: f32,
    pub window: Duration,
}

impl Default for DedupGate {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.7,
            window: Duration::hours(24),
        }
    }
}

impl DedupGate {
    pub fn new(similarity_threshold: f32, window: Duration) -> Self {
        Self { similarity_threshold, window }
    }

    /// Earliest `occurred_at` the caller must include in the window.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window
    }

    /// The exact check runs over the whole window before any fuzzy check, so a
    /// fingerprint match always wins.
    pub fn admit(
        &self,
        owner: &OwnerId,
        candidate: &NewTransaction,
        window: &[Transaction],
    ) -> Admission {
        let fingerprint = fingerprint(
            owner,
            candidate.amount,
            &candidate.description,
            candidate.original_text.as_deref(),
        );

        if let Some(existing) = window.iter().find(|t| t.fingerprint == fingerprint) {
            return Admission::RejectedExact(existing.id);
        }

        let text = candidate.comparable_text();
        if let Some(existing) = window
            .iter()
            .find(|t| similarity(text, t.comparable_text()) > self.similarity_threshold)
        {
            return Admission::RejectedSimilar(existing.id);
        }

        Admission::Accepted { fingerprint }
    }
}
