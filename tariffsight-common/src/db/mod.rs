//! Database access shared across TariffSight crates

pub mod init;

pub use init::init_database;
