use std::sync::Arc;

use tally_core::{
    Clock, LedgerError, LedgerStore, NewTransaction, OwnerId, Transaction, TransactionEdit,
    TransactionId, TransactionPage, TransactionQuery,
};

use crate::completion::CompletionBackend;
use crate::dedup::{Admission, DedupGate};
use crate::parser::{ParsedTransaction, TextParser};

/// Orchestrates: parse → fingerprint → window read → dedup gate → insert.
pub struct IngestPipeline<C: CompletionBackend, S: LedgerStore> {
    parser: TextParser<C>,
    gate: DedupGate,
    store: S,
    clock: Arc<dyn Clock>,
}

impl<C: CompletionBackend, S: LedgerStore> IngestPipeline<C, S> {
    pub fn new(parser: TextParser<C>, gate: DedupGate, store: S, clock: Arc<dyn Clock>) -> Self {
        Self { parser, gate, store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn parse(&self, text: &str) -> Result<ParsedTransaction, LedgerError> {
        if text.trim().is_empty() {
            return Err(LedgerError::InputInvalid("text is required".into()));
        }
        Ok(self.parser.parse(text).await)
    }

    pub async fn submit(
        &self,
        owner: &OwnerId,
        candidate: NewTransaction,
    ) -> Result<Transaction, LedgerError> {
        candidate.validate()?;

        let now = self.clock.now();
        let window = self.store.window(owner, self.gate.window_start(now)).await?;

        let fingerprint = match self.gate.admit(owner, &candidate, &window) {
            Admission::Accepted { fingerprint } => fingerprint,
            Admission::RejectedExact(existing) => {
                tracing::info!(%owner, %existing, "rejected exact duplicate");
                return Err(LedgerError::DuplicateExact(existing));
            }
            Admission::RejectedSimilar(existing) => {
                tracing::info!(%owner, %existing, "rejected similar duplicate");
                return Err(LedgerError::DuplicateSimilar(existing));
            }
        };

        let tx = Transaction::record(owner.clone(), candidate, fingerprint, now)?;
        if let Err(e) = self.store.insert(&tx).await {
            tracing::info!(%owner, error = %e, "insert rejected by store");
            return Err(e.into());
        }

        tracing::info!(%owner, id = %tx.id, kind = %tx.kind, category = %tx.category, "transaction recorded");
        Ok(tx)
    }

    /// Parse free text and submit the result in one step.
    pub async fn ingest(&self, owner: &OwnerId, text: &str) -> Result<Transaction, LedgerError> {
        let parsed = self.parse(text).await?;
        self.submit(owner, parsed.into_candidate(text)).await
    }

    pub async fn list(
        &self,
        owner: &OwnerId,
        query: &TransactionQuery,
    ) -> Result<TransactionPage, LedgerError> {
        Ok(self.store.list(owner, query).await?)
    }

    pub async fn update(
        &self,
        owner: &OwnerId,
        id: TransactionId,
        edit: TransactionEdit,
    ) -> Result<Transaction, LedgerError> {
        edit.validate()?;
        self.store
            .update(owner, id, &edit, self.clock.now())
            .await?
            .ok_or(LedgerError::NotFound(id))
    }

    pub async fn delete(&self, owner: &OwnerId, id: TransactionId) -> Result<(), LedgerError> {
        if self.store.delete(owner, id).await? {
            tracing::info!(%owner, %id, "transaction deleted");
            Ok(())
        } else {
            Err(LedgerError::NotFound(id))
        }
    }
}
