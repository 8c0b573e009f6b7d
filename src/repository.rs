//! Repository trait shared by every backend.
//!
//! This module defines the [`Repository`] contract. Callers hold one
//! implementation (usually as `Arc<dyn Repository>`) and can swap the
//! snapshot-backed fake for the 1Password CLI backend without changing
//! behavior: id derivation, existence preconditions and composite-key
//! semantics are the same on both.

use crate::model::{Group, Item, Membership, User, Vault, VaultGroupAccess, VaultUserAccess};
use crate::Result;
use async_trait::async_trait;

/// Repository represents a store of organization entities.
///
/// All implementations must be `Send + Sync` so one instance can serve
/// concurrent reconciliation of many resources.
///
/// # Implementations
///
/// - **Fake**: in-memory maps persisted to a JSON snapshot after every write
/// - **1Password**: one `op` CLI invocation per logical command
///
/// # Example
///
/// ```no_run
/// use vaultorg::{factory, BackendType, Config, Vault};
///
/// #[tokio::main]
/// async fn main() -> vaultorg::Result<()> {
///     let config = Config::new(BackendType::Fake).with_storage_path("/tmp/vaultorg.json");
///     let repo = factory::new_repository(config).await?;
///
///     let vault = repo.create_vault(Vault::new("test-00", "Test00")).await?;
///     let same = repo.get_vault_by_id(&vault.id).await?;
///     assert_eq!(vault, same);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait Repository: Send + Sync {
    // ========================================================================
    // Metadata
    // ========================================================================

    /// Returns the backend name ("fake", "onepassword").
    fn name(&self) -> &str;

    // ========================================================================
    // Users
    // ========================================================================

    /// Creates a user. The fake backend assigns `id = email`.
    ///
    /// # Errors
    ///
    /// - [`VaultorgError::AlreadyExists`](crate::VaultorgError::AlreadyExists):
    ///   a user with the same email exists
    async fn create_user(&self, user: User) -> Result<User>;

    /// Retrieves a user by id.
    ///
    /// # Errors
    ///
    /// - [`VaultorgError::NotFound`](crate::VaultorgError::NotFound): no such user
    async fn get_user_by_id(&self, id: &str) -> Result<User>;

    /// Retrieves a user by email.
    async fn get_user_by_email(&self, email: &str) -> Result<User>;

    /// Replaces an existing user record. Never creates.
    ///
    /// The fake backend derives ids from the email and rejects a changed email
    /// with [`VaultorgError::NaturalKeyChanged`](crate::VaultorgError::NaturalKeyChanged).
    /// The 1Password backend only updates the name; the email is left as is.
    ///
    /// # Errors
    ///
    /// - [`VaultorgError::NotFound`](crate::VaultorgError::NotFound): `user.id` is unknown
    async fn ensure_user(&self, user: User) -> Result<User>;

    /// Deletes a user.
    async fn delete_user(&self, id: &str) -> Result<()>;

    // ========================================================================
    // Groups
    // ========================================================================

    /// Creates a group. The fake backend assigns `id = name`.
    async fn create_group(&self, group: Group) -> Result<Group>;

    /// Retrieves a group by id.
    async fn get_group_by_id(&self, id: &str) -> Result<Group>;

    /// Retrieves a group by name.
    async fn get_group_by_name(&self, name: &str) -> Result<Group>;

    /// Replaces an existing group record. Never creates.
    ///
    /// The fake backend derives ids from the name and rejects a changed name
    /// with [`VaultorgError::NaturalKeyChanged`](crate::VaultorgError::NaturalKeyChanged).
    /// The 1Password backend addresses the record by its stable id and applies
    /// the rename.
    async fn ensure_group(&self, group: Group) -> Result<Group>;

    /// Deletes a group.
    async fn delete_group(&self, id: &str) -> Result<()>;

    // ========================================================================
    // Group membership
    // ========================================================================

    /// Adds the user to the group, or leaves an existing membership in place.
    async fn ensure_membership(&self, membership: Membership) -> Result<()>;

    /// Retrieves a membership.
    ///
    /// # Errors
    ///
    /// - [`VaultorgError::NotFound`](crate::VaultorgError::NotFound): user is not in the group
    async fn get_membership(&self, group_id: &str, user_id: &str) -> Result<Membership>;

    /// Removes the user from the group.
    async fn delete_membership(&self, group_id: &str, user_id: &str) -> Result<()>;

    // ========================================================================
    // Vaults
    // ========================================================================

    /// Creates a vault. The fake backend assigns `id = name`.
    ///
    /// # Errors
    ///
    /// - [`VaultorgError::AlreadyExists`](crate::VaultorgError::AlreadyExists):
    ///   a vault with the same name exists
    async fn create_vault(&self, vault: Vault) -> Result<Vault>;

    /// Retrieves a vault by id.
    async fn get_vault_by_id(&self, id: &str) -> Result<Vault>;

    /// Retrieves a vault by name.
    async fn get_vault_by_name(&self, name: &str) -> Result<Vault>;

    /// Lists vaults the user has been granted direct access to.
    async fn list_vaults_by_user(&self, user_id: &str) -> Result<Vec<Vault>>;

    /// Replaces an existing vault record. Never creates.
    ///
    /// The fake backend derives ids from the name and rejects a changed name
    /// with [`VaultorgError::NaturalKeyChanged`](crate::VaultorgError::NaturalKeyChanged).
    /// The 1Password backend addresses the record by its stable id and applies
    /// the rename.
    async fn ensure_vault(&self, vault: Vault) -> Result<Vault>;

    /// Deletes a vault.
    async fn delete_vault(&self, id: &str) -> Result<()>;

    // ========================================================================
    // Vault access
    // ========================================================================

    /// Grants a group access to a vault, replacing any previous grant.
    async fn ensure_vault_group_access(&self, access: VaultGroupAccess) -> Result<()>;

    /// Retrieves a group's grant on a vault.
    async fn get_vault_group_access(&self, vault_id: &str, group_id: &str)
        -> Result<VaultGroupAccess>;

    /// Revokes a group's grant on a vault.
    async fn delete_vault_group_access(&self, vault_id: &str, group_id: &str) -> Result<()>;

    /// Grants a user access to a vault, replacing any previous grant.
    async fn ensure_vault_user_access(&self, access: VaultUserAccess) -> Result<()>;

    /// Retrieves a user's grant on a vault.
    async fn get_vault_user_access(&self, vault_id: &str, user_id: &str)
        -> Result<VaultUserAccess>;

    /// Revokes a user's grant on a vault.
    async fn delete_vault_user_access(&self, vault_id: &str, user_id: &str) -> Result<()>;

    // ========================================================================
    // Items
    // ========================================================================

    /// Creates an item. The fake backend assigns `id = title`.
    async fn create_item(&self, item: Item) -> Result<Item>;

    /// Retrieves an item by id.
    async fn get_item_by_id(&self, id: &str) -> Result<Item>;

    /// Retrieves an item by title. Titles are only unique within a vault.
    async fn get_item_by_title(&self, vault_id: &str, title: &str) -> Result<Item>;

    /// Replaces an existing item record, fields included. Never creates.
    ///
    /// Fields absent from `item` are removed (built-in 1Password fields, which
    /// cannot be deleted, are cleared instead).
    ///
    /// The fake backend derives ids from the title and rejects a changed title
    /// with [`VaultorgError::NaturalKeyChanged`](crate::VaultorgError::NaturalKeyChanged).
    /// The 1Password backend addresses the record by its stable id and applies
    /// the rename.
    async fn ensure_item(&self, item: Item) -> Result<Item>;

    /// Deletes an item.
    async fn delete_item(&self, id: &str) -> Result<()>;
}
