//! Read-side rollups over an owner's ledger. Every function here is pure: the
//! caller loads the transactions and passes them in.

pub mod breakdown;
pub mod summary;
pub mod trends;

pub use breakdown::{category_breakdown, CategoryTotal};
pub use summary::{summarize, Summary};
pub use trends::{trends, TrendBucket};
