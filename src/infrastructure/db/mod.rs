pub mod accounts;
pub mod compliance;
pub mod connection;
pub mod suppression;

pub use accounts::SqliteAccountStore;
pub use compliance::SqliteComplianceStore;
pub use connection::{init_db, init_memory_db};
pub use suppression::SqliteSuppressionStore;
