//! On-disk snapshot of the fake repository.

use crate::model::{
    CompositeKey, Group, Item, Membership, User, Vault, VaultGroupAccess, VaultUserAccess,
};
use crate::{Result, VaultorgError};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// File format: seven top-level maps from derived key to record.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub(crate) struct Snapshot {
    #[serde(deserialize_with = "null_as_empty")]
    users: BTreeMap<String, User>,
    #[serde(deserialize_with = "null_as_empty")]
    items: BTreeMap<String, Item>,
    #[serde(deserialize_with = "null_as_empty")]
    groups: BTreeMap<String, Group>,
    #[serde(deserialize_with = "null_as_empty")]
    members: BTreeMap<String, Membership>,
    #[serde(deserialize_with = "null_as_empty")]
    vaults: BTreeMap<String, Vault>,
    #[serde(deserialize_with = "null_as_empty")]
    vault_group_access: BTreeMap<String, VaultGroupAccess>,
    #[serde(deserialize_with = "null_as_empty")]
    vault_user_access: BTreeMap<String, VaultUserAccess>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Snapshot {
    /// Reads a snapshot. A missing file yields `Ok(None)`.
    pub(crate) async fn read(path: &Path) -> Result<Option<Snapshot>> {
        let data = match tokio::fs::read(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(VaultorgError::Persistence {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Ok(Some(serde_json::from_slice(&data)?))
    }

    /// Overwrites `path` with the full snapshot.
    pub(crate) async fn write(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, data)
            .await
            .map_err(|source| VaultorgError::Persistence {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// In-memory state of the fake repository.
#[derive(Debug, Default, Clone)]
pub(crate) struct State {
    pub(crate) users: HashMap<String, User>,
    pub(crate) groups: HashMap<String, Group>,
    pub(crate) vaults: HashMap<String, Vault>,
    pub(crate) items: HashMap<String, Item>,
    pub(crate) members: HashMap<CompositeKey, Membership>,
    pub(crate) vault_groups: HashMap<CompositeKey, VaultGroupAccess>,
    pub(crate) vault_users: HashMap<CompositeKey, VaultUserAccess>,
}

impl State {
    pub(crate) fn to_snapshot(&self) -> Snapshot {
        fn by_id<T: Clone>(map: &HashMap<String, T>) -> BTreeMap<String, T> {
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        }
        fn by_pair<T: Clone>(map: &HashMap<CompositeKey, T>) -> BTreeMap<String, T> {
            map.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
        }

        Snapshot {
            users: by_id(&self.users),
            items: by_id(&self.items),
            groups: by_id(&self.groups),
            members: by_pair(&self.members),
            vaults: by_id(&self.vaults),
            vault_group_access: by_pair(&self.vault_groups),
            vault_user_access: by_pair(&self.vault_users),
        }
    }
}

impl From<Snapshot> for State {
    // Composite keys come from the records, not from the joined map keys.
    fn from(snapshot: Snapshot) -> Self {
        Self {
            users: snapshot.users.into_iter().collect(),
            groups: snapshot.groups.into_iter().collect(),
            vaults: snapshot.vaults.into_iter().collect(),
            items: snapshot.items.into_iter().collect(),
            members: snapshot
                .members
                .into_values()
                .map(|m| (m.key(), m))
                .collect(),
            vault_groups: snapshot
                .vault_group_access
                .into_values()
                .map(|a| (a.key(), a))
                .collect(),
            vault_users: snapshot
                .vault_user_access
                .into_values()
                .map(|a| (a.key(), a))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AccessPermissions;

    #[test]
    fn test_top_level_keys() {
        let json = serde_json::to_value(Snapshot::default()).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        for expected in [
            "Users",
            "Items",
            "Groups",
            "Members",
            "Vaults",
            "VaultGroupAccess",
            "VaultUserAccess",
        ] {
            assert!(keys.contains(&expected), "missing {}", expected);
        }
        assert_eq!(keys.len(), 7);
    }

    #[test]
    fn test_null_maps_load_empty() {
        let snapshot: Snapshot =
            serde_json::from_str(r#"{"Users":null,"Members":null,"Vaults":{}}"#).unwrap();
        let state = State::from(snapshot);
        assert!(state.users.is_empty());
        assert!(state.members.is_empty());
    }

    #[test]
    fn test_composite_keys_rebuilt_from_records() {
        let mut state = State::default();
        let access = VaultUserAccess::new("a/b", "c", AccessPermissions::default());
        state.vault_users.insert(access.key(), access.clone());

        let json = serde_json::to_string(&state.to_snapshot()).unwrap();
        assert!(json.contains("\"a/b/c\""));

        let reloaded = State::from(serde_json::from_str::<Snapshot>(&json).unwrap());
        assert_eq!(
            reloaded.vault_users.get(&CompositeKey::new("a/b", "c")),
            Some(&access)
        );
        assert!(!reloaded.vault_users.contains_key(&CompositeKey::new("a", "b/c")));
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Snapshot::read(&dir.path().join("absent.json")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_read_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let result = Snapshot::read(&path).await;
        assert!(matches!(result, Err(VaultorgError::Json(_))));
    }

    #[tokio::test]
    async fn test_write_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("state.json");

        let result = Snapshot::default().write(&path).await;
        assert!(matches!(result, Err(VaultorgError::Persistence { .. })));
    }
}
