//! Domain records managed by a [`Repository`](crate::Repository).
//!
//! Records serialize field-for-field with PascalCase names (`ID`, `VaultID`,
//! `Title`, ...), which is the representation stored in the fake backend's
//! snapshot file.

use crate::AccessPermissions;
use serde::{Deserialize, Serialize};

/// A member of the organization. Email is the natural key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct User {
    #[serde(rename = "ID")]
    pub id: String,
    pub email: String,
    pub name: String,
}

impl User {
    /// Creates a user record without an id; the repository assigns one.
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            email: email.into(),
            name: name.into(),
        }
    }
}

/// A group of users. Name is the natural key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Group {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub description: String,
}

impl Group {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// A named container of items. Name is the natural key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Vault {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub description: String,
}

impl Vault {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// A secret record inside a vault. Title is the natural key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Item {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "VaultID")]
    pub vault_id: String,
    pub title: String,
    pub fields: Vec<Field>,
}

impl Item {
    pub fn new(vault_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            vault_id: vault_id.into(),
            title: title.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field, keeping insertion order.
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }
}

/// A labeled value inside an item.
///
/// `Debug` output redacts [`value`](Field::value).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Field {
    #[serde(rename = "ID")]
    pub id: String,
    pub label: String,
    #[serde(rename = "Type")]
    pub field_type: String,
    pub purpose: String,
    pub value: String,
}

impl Field {
    /// Creates a plain string field.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            label: label.into(),
            field_type: "STRING".to_string(),
            purpose: String::new(),
            value: value.into(),
        }
    }
}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("field_type", &self.field_type)
            .field("purpose", &self.purpose)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Identity of a record keyed by two foreign keys.
///
/// Kept as two fields so ids containing `/` can never collide; the joined
/// form only appears in the snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeKey {
    pub parent: String,
    pub child: String,
}

impl CompositeKey {
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
        }
    }
}

impl std::fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.parent, self.child)
    }
}

/// A user belonging to a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Membership {
    #[serde(rename = "GroupID")]
    pub group_id: String,
    #[serde(rename = "UserID")]
    pub user_id: String,
}

impl Membership {
    pub fn new(group_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            user_id: user_id.into(),
        }
    }

    /// (group, user)
    pub fn key(&self) -> CompositeKey {
        CompositeKey::new(&self.group_id, &self.user_id)
    }
}

/// Permissions a group holds on a vault.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultGroupAccess {
    #[serde(rename = "VaultID")]
    pub vault_id: String,
    #[serde(rename = "GroupID")]
    pub group_id: String,
    #[serde(rename = "Permissions")]
    pub permissions: AccessPermissions,
}

impl VaultGroupAccess {
    pub fn new(
        vault_id: impl Into<String>,
        group_id: impl Into<String>,
        permissions: AccessPermissions,
    ) -> Self {
        Self {
            vault_id: vault_id.into(),
            group_id: group_id.into(),
            permissions,
        }
    }

    /// (vault, group)
    pub fn key(&self) -> CompositeKey {
        CompositeKey::new(&self.vault_id, &self.group_id)
    }
}

/// Permissions a user holds directly on a vault.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultUserAccess {
    #[serde(rename = "VaultID")]
    pub vault_id: String,
    #[serde(rename = "UserID")]
    pub user_id: String,
    #[serde(rename = "Permissions")]
    pub permissions: AccessPermissions,
}

impl VaultUserAccess {
    pub fn new(
        vault_id: impl Into<String>,
        user_id: impl Into<String>,
        permissions: AccessPermissions,
    ) -> Self {
        Self {
            vault_id: vault_id.into(),
            user_id: user_id.into(),
            permissions,
        }
    }

    /// (vault, user)
    pub fn key(&self) -> CompositeKey {
        CompositeKey::new(&self.vault_id, &self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Permission;

    #[test]
    fn test_field_debug_redacts_value() {
        let field = Field::new("password", "hunter2");
        let debug = format!("{:?}", field);
        assert!(debug.contains("password"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_composite_keys() {
        let access = VaultUserAccess::new("v1", "u1", AccessPermissions::default());
        assert_eq!(access.key(), CompositeKey::new("v1", "u1"));
        assert_eq!(access.key().to_string(), "v1/u1");

        // Joined forms collide, keys do not.
        let a = CompositeKey::new("a/b", "c");
        let b = CompositeKey::new("a", "b/c");
        assert_eq!(a.to_string(), b.to_string());
        assert_ne!(a, b);
    }

    #[test]
    fn test_snapshot_representation() {
        let item = Item::new("vault-1", "db").with_field(Field::new("password", "s3cret"));
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["VaultID"], "vault-1");
        assert_eq!(json["Title"], "db");
        assert_eq!(json["Fields"][0]["Label"], "password");
        assert_eq!(json["Fields"][0]["Type"], "STRING");

        let access = VaultGroupAccess::new(
            "vault-1",
            "ops",
            AccessPermissions::default().with(Permission::ManageVault),
        );
        let json = serde_json::to_value(&access).unwrap();
        assert_eq!(json["GroupID"], "ops");
        assert_eq!(json["Permissions"]["ManageVault"], true);
    }

    #[test]
    fn test_missing_fields_default() {
        let user: User = serde_json::from_str(r#"{"Email":"a@b.c"}"#).unwrap();
        assert_eq!(user.email, "a@b.c");
        assert!(user.id.is_empty());
    }
}
