//! Fake repository implementation.

use super::snapshot::{Snapshot, State};
use crate::model::{
    CompositeKey, Group, Item, Membership, User, Vault, VaultGroupAccess, VaultUserAccess,
};
use crate::validation::validate_name;
use crate::{Repository, Result, VaultorgError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Records whose id is derived from one of their own fields.
trait NaturalKeyed: Clone {
    /// Entity name used in errors and logs.
    const KIND: &'static str;
    /// What the natural key is called ("email", "name", "title").
    const KEY_NAME: &'static str;

    fn natural_key(&self) -> &str;
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
}

macro_rules! natural_keyed {
    ($ty:ty, $kind:literal, $key:ident) => {
        impl NaturalKeyed for $ty {
            const KIND: &'static str = $kind;
            const KEY_NAME: &'static str = stringify!($key);

            fn natural_key(&self) -> &str {
                &self.$key
            }

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }
        }
    };
}

natural_keyed!(User, "user", email);
natural_keyed!(Group, "group", name);
natural_keyed!(Vault, "vault", name);
natural_keyed!(Item, "item", title);

fn insert_new<T: NaturalKeyed>(map: &mut HashMap<String, T>, mut record: T) -> Result<T> {
    validate_name(&format!("{} {}", T::KIND, T::KEY_NAME), record.natural_key())?;

    let id = record.natural_key().to_string();
    if map.contains_key(&id) {
        return Err(VaultorgError::AlreadyExists(format!("{} {}", T::KIND, id)));
    }

    record.set_id(id.clone());
    map.insert(id, record.clone());
    Ok(record)
}

fn replace_existing<T: NaturalKeyed>(map: &mut HashMap<String, T>, record: T) -> Result<T> {
    if !map.contains_key(record.id()) {
        return Err(VaultorgError::NotFound(format!("{} {}", T::KIND, record.id())));
    }

    // The id is derived from the natural key, so the key is frozen too.
    if record.natural_key() != record.id() {
        return Err(VaultorgError::NaturalKeyChanged {
            id: record.id().to_string(),
            key: record.natural_key().to_string(),
        });
    }

    map.insert(record.id().to_string(), record.clone());
    Ok(record)
}

fn lookup<T: NaturalKeyed>(map: &HashMap<String, T>, id: &str) -> Result<T> {
    map.get(id)
        .cloned()
        .ok_or_else(|| VaultorgError::NotFound(format!("{} {}", T::KIND, id)))
}

fn scan<T: NaturalKeyed>(map: &HashMap<String, T>, key: &str) -> Result<T> {
    map.values()
        .find(|r| r.natural_key() == key)
        .cloned()
        .ok_or_else(|| VaultorgError::NotFound(format!("{} {}", T::KIND, key)))
}

fn remove<T>(map: &mut HashMap<String, T>, kind: &str, id: &str) -> Result<()> {
    map.remove(id)
        .map(|_| ())
        .ok_or_else(|| VaultorgError::NotFound(format!("{} {}", kind, id)))
}

fn lookup_pair<T: Clone>(map: &HashMap<CompositeKey, T>, kind: &str, key: CompositeKey) -> Result<T> {
    map.get(&key)
        .cloned()
        .ok_or_else(|| VaultorgError::NotFound(format!("{} {}", kind, key)))
}

fn remove_pair<T>(map: &mut HashMap<CompositeKey, T>, kind: &str, key: CompositeKey) -> Result<()> {
    map.remove(&key)
        .map(|_| ())
        .ok_or_else(|| VaultorgError::NotFound(format!("{} {}", kind, key)))
}

/// Fake repository for tests.
///
/// Holds every entity in memory behind a single reader/writer lock and, when
/// opened on a path, rewrites the whole snapshot file after each successful
/// mutation while still holding the write lock.
///
/// # Example
///
/// ```
/// use vaultorg::backends::fake::FakeRepository;
/// use vaultorg::{Repository, Vault};
///
/// #[tokio::main]
/// async fn main() -> vaultorg::Result<()> {
///     let repo = FakeRepository::in_memory();
///
///     let vault = repo.create_vault(Vault::new("test-00", "Test00")).await?;
///     assert_eq!(vault.id, "test-00");
///
///     let again = repo.create_vault(Vault::new("test-00", "other")).await;
///     assert!(again.unwrap_err().is_already_exists());
///     Ok(())
/// }
/// ```
pub struct FakeRepository {
    path: Option<PathBuf>,
    state: RwLock<State>,
}

impl FakeRepository {
    /// Opens a repository persisted at `path`.
    ///
    /// A missing file starts an empty store. An unreadable or malformed file
    /// also starts empty (with a warning); it is overwritten on the first
    /// mutation.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let state = match Snapshot::read(&path).await {
            Ok(Some(snapshot)) => State::from(snapshot),
            Ok(None) => {
                debug!(path = %path.display(), "no snapshot, starting empty");
                State::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unusable snapshot");
                State::default()
            }
        };

        Self {
            path: Some(path),
            state: RwLock::new(state),
        }
    }

    /// Creates a repository that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(State::default()),
        }
    }

    /// Applies `change` to a copy of the state and installs the copy once it
    /// is on disk. A failed change or write leaves the state untouched.
    async fn commit<T, F>(&self, change: F) -> Result<T>
    where
        F: FnOnce(&mut State) -> Result<T> + Send,
        T: Send,
    {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let out = change(&mut next)?;
        if let Some(path) = &self.path {
            next.to_snapshot().write(path).await?;
        }
        *state = next;
        Ok(out)
    }
}

#[async_trait]
impl Repository for FakeRepository {
    fn name(&self) -> &str {
        "fake"
    }

    async fn create_user(&self, user: User) -> Result<User> {
        let user = self.commit(move |state| insert_new(&mut state.users, user)).await?;
        debug!(user = %user.id, "created user");
        Ok(user)
    }

    async fn get_user_by_id(&self, id: &str) -> Result<User> {
        let state = self.state.read().await;
        lookup(&state.users, id)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User> {
        let state = self.state.read().await;
        scan(&state.users, email)
    }

    async fn ensure_user(&self, user: User) -> Result<User> {
        let user = self.commit(move |state| replace_existing(&mut state.users, user)).await?;
        debug!(user = %user.id, "updated user");
        Ok(user)
    }

    async fn delete_user(&self, id: &str) -> Result<()> {
        self.commit(|state| remove(&mut state.users, User::KIND, id)).await?;
        debug!(user = %id, "deleted user");
        Ok(())
    }

    async fn create_group(&self, group: Group) -> Result<Group> {
        let group = self.commit(move |state| insert_new(&mut state.groups, group)).await?;
        debug!(group = %group.id, "created group");
        Ok(group)
    }

    async fn get_group_by_id(&self, id: &str) -> Result<Group> {
        let state = self.state.read().await;
        lookup(&state.groups, id)
    }

    async fn get_group_by_name(&self, name: &str) -> Result<Group> {
        let state = self.state.read().await;
        scan(&state.groups, name)
    }

    async fn ensure_group(&self, group: Group) -> Result<Group> {
        let group = self.commit(move |state| replace_existing(&mut state.groups, group)).await?;
        debug!(group = %group.id, "updated group");
        Ok(group)
    }

    async fn delete_group(&self, id: &str) -> Result<()> {
        self.commit(|state| remove(&mut state.groups, Group::KIND, id)).await?;
        debug!(group = %id, "deleted group");
        Ok(())
    }

    async fn ensure_membership(&self, membership: Membership) -> Result<()> {
        let key = membership.key();
        debug!(membership = %key, "ensuring membership");
        self.commit(move |state| {
            state.members.insert(key, membership);
            Ok(())
        })
        .await
    }

    async fn get_membership(&self, group_id: &str, user_id: &str) -> Result<Membership> {
        let state = self.state.read().await;
        lookup_pair(&state.members, "membership", CompositeKey::new(group_id, user_id))
    }

    async fn delete_membership(&self, group_id: &str, user_id: &str) -> Result<()> {
        let key = CompositeKey::new(group_id, user_id);
        self.commit(move |state| remove_pair(&mut state.members, "membership", key)).await
    }

    async fn create_vault(&self, vault: Vault) -> Result<Vault> {
        let vault = self.commit(move |state| insert_new(&mut state.vaults, vault)).await?;
        debug!(vault = %vault.id, "created vault");
        Ok(vault)
    }

    async fn get_vault_by_id(&self, id: &str) -> Result<Vault> {
        let state = self.state.read().await;
        lookup(&state.vaults, id)
    }

    async fn get_vault_by_name(&self, name: &str) -> Result<Vault> {
        let state = self.state.read().await;
        scan(&state.vaults, name)
    }

    async fn list_vaults_by_user(&self, user_id: &str) -> Result<Vec<Vault>> {
        let state = self.state.read().await;
        let mut vaults: Vec<Vault> = state
            .vault_users
            .keys()
            .filter(|key| key.child == user_id)
            .filter_map(|key| state.vaults.get(&key.parent).cloned())
            .collect();
        vaults.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(vaults)
    }

    async fn ensure_vault(&self, vault: Vault) -> Result<Vault> {
        let vault = self.commit(move |state| replace_existing(&mut state.vaults, vault)).await?;
        debug!(vault = %vault.id, "updated vault");
        Ok(vault)
    }

    async fn delete_vault(&self, id: &str) -> Result<()> {
        self.commit(|state| remove(&mut state.vaults, Vault::KIND, id)).await?;
        debug!(vault = %id, "deleted vault");
        Ok(())
    }

    async fn ensure_vault_group_access(&self, access: VaultGroupAccess) -> Result<()> {
        let key = access.key();
        debug!(access = %key, "ensuring vault group access");
        self.commit(move |state| {
            state.vault_groups.insert(key, access);
            Ok(())
        })
        .await
    }

    async fn get_vault_group_access(
        &self,
        vault_id: &str,
        group_id: &str,
    ) -> Result<VaultGroupAccess> {
        let state = self.state.read().await;
        lookup_pair(
            &state.vault_groups,
            "vault group access",
            CompositeKey::new(vault_id, group_id),
        )
    }

    async fn delete_vault_group_access(&self, vault_id: &str, group_id: &str) -> Result<()> {
        let key = CompositeKey::new(vault_id, group_id);
        self.commit(move |state| remove_pair(&mut state.vault_groups, "vault group access", key))
            .await
    }

    async fn ensure_vault_user_access(&self, access: VaultUserAccess) -> Result<()> {
        let key = access.key();
        debug!(access = %key, "ensuring vault user access");
        self.commit(move |state| {
            state.vault_users.insert(key, access);
            Ok(())
        })
        .await
    }

    async fn get_vault_user_access(
        &self,
        vault_id: &str,
        user_id: &str,
    ) -> Result<VaultUserAccess> {
        let state = self.state.read().await;
        lookup_pair(
            &state.vault_users,
            "vault user access",
            CompositeKey::new(vault_id, user_id),
        )
    }

    async fn delete_vault_user_access(&self, vault_id: &str, user_id: &str) -> Result<()> {
        let key = CompositeKey::new(vault_id, user_id);
        self.commit(move |state| remove_pair(&mut state.vault_users, "vault user access", key)).await
    }

    async fn create_item(&self, item: Item) -> Result<Item> {
        let item = self.commit(move |state| insert_new(&mut state.items, item)).await?;
        debug!(item = %item.id, vault = %item.vault_id, "created item");
        Ok(item)
    }

    async fn get_item_by_id(&self, id: &str) -> Result<Item> {
        let state = self.state.read().await;
        lookup(&state.items, id)
    }

    async fn get_item_by_title(&self, vault_id: &str, title: &str) -> Result<Item> {
        let state = self.state.read().await;
        state
            .items
            .values()
            .find(|i| i.title == title && i.vault_id == vault_id)
            .cloned()
            .ok_or_else(|| VaultorgError::NotFound(format!("item {} in vault {}", title, vault_id)))
    }

    async fn ensure_item(&self, item: Item) -> Result<Item> {
        let item = self.commit(move |state| replace_existing(&mut state.items, item)).await?;
        debug!(item = %item.id, fields = item.fields.len(), "updated item");
        Ok(item)
    }

    async fn delete_item(&self, id: &str) -> Result<()> {
        self.commit(|state| remove(&mut state.items, Item::KIND, id)).await?;
        debug!(item = %id, "deleted item");
        Ok(())
    }
}
