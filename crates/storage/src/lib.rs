pub mod db;
pub mod ledger;

pub use db::{create_db, DbPool};
pub use ledger::SqliteLedger;
