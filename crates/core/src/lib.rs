pub mod clock;
pub mod ledger;
pub mod memory;
pub mod money;
pub mod period;
pub mod store;
pub mod transaction;

pub use clock::{Clock, FixedClock, SystemClock};
pub use ledger::{
    LedgerError, OwnerId, TransactionId, TransactionKind, CATEGORIES, OTHER_CATEGORY,
};
pub use memory::MemoryLedger;
pub use money::{round_cents, Money};
pub use period::{DateRange, TrendPeriod};
pub use store::{LedgerStore, Page, StoreError, TransactionPage, TransactionQuery};
pub use transaction::{NewTransaction, Transaction, TransactionEdit};
