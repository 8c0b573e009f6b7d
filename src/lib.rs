//! Vaultorg - Repository for password-manager organizations.
//!
//! Vaultorg stores the entities a password-manager organization is made of
//! (users, groups, vaults, items, group memberships and per-vault access
//! grants) behind one [`Repository`] trait. Reconciliation code is written
//! once and runs against either a snapshot-backed fake or the 1Password CLI.
//!
//! # Features
//!
//! - **One contract**: both backends derive ids and check existence the same way
//! - **Async/Await**: Built on tokio; `op` subprocesses are killed when a call is dropped
//! - **Composite keys**: memberships and access grants keyed by typed id pairs
//! - **Error Context**: backend, operation and entity attached to every failure
//! - **Feature Flags**: each backend compiles only when enabled
//!
//! # Quick Start
//!
//! ```no_run
//! use vaultorg::{factory, AccessPermissions, BackendType, Config, Permission, Vault, VaultUserAccess};
//!
//! #[tokio::main]
//! async fn main() -> vaultorg::Result<()> {
//!     let config = Config::new(BackendType::Fake).with_storage_path("state.json");
//!     let repo = factory::new_repository(config).await?;
//!
//!     let vault = repo.create_vault(Vault::new("team", "Team secrets")).await?;
//!
//!     let perms = AccessPermissions::default().with(Permission::AllowViewing);
//!     repo.ensure_vault_user_access(VaultUserAccess::new(&vault.id, "u1", perms))
//!         .await?;
//!
//!     let access = repo.get_vault_user_access(&vault.id, "u1").await?;
//!     assert!(access.permissions.allow_viewing);
//!     Ok(())
//! }
//! ```
//!
//! # Supported Backends
//!
//! | Backend | Feature Flag | CLI Required | Notes |
//! |---------|-------------|--------------|-------|
//! | Fake | `fake` (default) | None | In-memory, JSON snapshot after every write |
//! | 1Password | `onepassword` (default) | `op` | CLI integration |

pub mod backends;
pub mod cli;
pub mod config;
pub mod error;
pub mod factory;
pub mod model;
pub mod permissions;
pub mod repository;
pub mod validation;

pub use config::{BackendType, Config};
pub use error::{Result, VaultorgError};
pub use model::{
    CompositeKey, Field, Group, Item, Membership, User, Vault, VaultGroupAccess, VaultUserAccess,
};
pub use permissions::{AccessPermissions, Permission};
pub use repository::Repository;
