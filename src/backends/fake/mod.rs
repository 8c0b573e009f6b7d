//! Snapshot-backed fake repository.
//!
//! Keeps every entity in memory and mirrors the full state to a JSON file
//! after each mutation, so separate processes (or a restarted test) can
//! observe what a previous run wrote.
//!
//! # Key derivation
//!
//! | Entity | Id |
//! |--------|----|
//! | User | email |
//! | Group | name |
//! | Vault | name |
//! | Item | title |
//! | Membership | (group id, user id) |
//! | VaultGroupAccess | (vault id, group id) |
//! | VaultUserAccess | (vault id, user id) |
//!
//! # Example
//!
//! ```
//! use vaultorg::{Config, BackendType};
//!
//! let config = Config::new(BackendType::Fake)
//!     .with_storage_path("/tmp/vaultorg-fake.json");
//! ```

mod backend;
mod snapshot;

pub use backend::FakeRepository;
