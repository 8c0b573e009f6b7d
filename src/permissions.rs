//! Vault access permissions.
//!
//! [`AccessPermissions`] is a set of 15 independent capability flags. Setting
//! one flag never touches another here; any implication between permissions
//! (e.g. `edit_items` needing `view_items`) is enforced by the remote store's
//! own policy.
//!
//! On the CLI wire permissions travel as a list of snake_case names, see
//! [`AccessPermissions::granted`] and [`AccessPermissions::from_granted`].

use crate::{Result, VaultorgError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A single vault permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Permission {
    AllowViewing,
    AllowEditing,
    AllowManaging,
    ViewItems,
    CreateItems,
    EditItems,
    ArchiveItems,
    DeleteItems,
    ViewAndCopyPasswords,
    ViewItemHistory,
    ImportItems,
    ExportItems,
    CopyAndShareItems,
    PrintItems,
    ManageVault,
}

impl Permission {
    /// Every permission, in wire order.
    pub const ALL: [Permission; 15] = [
        Permission::AllowViewing,
        Permission::AllowEditing,
        Permission::AllowManaging,
        Permission::ViewItems,
        Permission::CreateItems,
        Permission::EditItems,
        Permission::ArchiveItems,
        Permission::DeleteItems,
        Permission::ViewAndCopyPasswords,
        Permission::ViewItemHistory,
        Permission::ImportItems,
        Permission::ExportItems,
        Permission::CopyAndShareItems,
        Permission::PrintItems,
        Permission::ManageVault,
    ];

    /// Name used by the `op` CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllowViewing => "allow_viewing",
            Self::AllowEditing => "allow_editing",
            Self::AllowManaging => "allow_managing",
            Self::ViewItems => "view_items",
            Self::CreateItems => "create_items",
            Self::EditItems => "edit_items",
            Self::ArchiveItems => "archive_items",
            Self::DeleteItems => "delete_items",
            Self::ViewAndCopyPasswords => "view_and_copy_passwords",
            Self::ViewItemHistory => "view_item_history",
            Self::ImportItems => "import_items",
            Self::ExportItems => "export_items",
            Self::CopyAndShareItems => "copy_and_share_items",
            Self::PrintItems => "print_items",
            Self::ManageVault => "manage_vault",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = VaultorgError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| VaultorgError::Other(anyhow::anyhow!("unknown permission: {}", s)))
    }
}

/// Permissions granted by a vault access record.
///
/// Serialized field-for-field (PascalCase) in the fake snapshot file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AccessPermissions {
    pub allow_viewing: bool,
    pub allow_editing: bool,
    pub allow_managing: bool,
    pub view_items: bool,
    pub create_items: bool,
    pub edit_items: bool,
    pub archive_items: bool,
    pub delete_items: bool,
    pub view_and_copy_passwords: bool,
    pub view_item_history: bool,
    pub import_items: bool,
    pub export_items: bool,
    pub copy_and_share_items: bool,
    pub print_items: bool,
    pub manage_vault: bool,
}

impl AccessPermissions {
    fn flag_mut(&mut self, permission: Permission) -> &mut bool {
        match permission {
            Permission::AllowViewing => &mut self.allow_viewing,
            Permission::AllowEditing => &mut self.allow_editing,
            Permission::AllowManaging => &mut self.allow_managing,
            Permission::ViewItems => &mut self.view_items,
            Permission::CreateItems => &mut self.create_items,
            Permission::EditItems => &mut self.edit_items,
            Permission::ArchiveItems => &mut self.archive_items,
            Permission::DeleteItems => &mut self.delete_items,
            Permission::ViewAndCopyPasswords => &mut self.view_and_copy_passwords,
            Permission::ViewItemHistory => &mut self.view_item_history,
            Permission::ImportItems => &mut self.import_items,
            Permission::ExportItems => &mut self.export_items,
            Permission::CopyAndShareItems => &mut self.copy_and_share_items,
            Permission::PrintItems => &mut self.print_items,
            Permission::ManageVault => &mut self.manage_vault,
        }
    }

    /// Returns whether `permission` is granted.
    pub fn get(&self, permission: Permission) -> bool {
        match permission {
            Permission::AllowViewing => self.allow_viewing,
            Permission::AllowEditing => self.allow_editing,
            Permission::AllowManaging => self.allow_managing,
            Permission::ViewItems => self.view_items,
            Permission::CreateItems => self.create_items,
            Permission::EditItems => self.edit_items,
            Permission::ArchiveItems => self.archive_items,
            Permission::DeleteItems => self.delete_items,
            Permission::ViewAndCopyPasswords => self.view_and_copy_passwords,
            Permission::ViewItemHistory => self.view_item_history,
            Permission::ImportItems => self.import_items,
            Permission::ExportItems => self.export_items,
            Permission::CopyAndShareItems => self.copy_and_share_items,
            Permission::PrintItems => self.print_items,
            Permission::ManageVault => self.manage_vault,
        }
    }

    /// Sets a single flag, leaving the others untouched.
    pub fn set(&mut self, permission: Permission, granted: bool) {
        *self.flag_mut(permission) = granted;
    }

    /// Builder-style [`set`](Self::set) for granting one permission.
    ///
    /// ```
    /// use vaultorg::{AccessPermissions, Permission};
    ///
    /// let perms = AccessPermissions::default().with(Permission::ViewItems);
    /// assert!(perms.view_items);
    /// assert!(!perms.allow_viewing);
    /// ```
    pub fn with(mut self, permission: Permission) -> Self {
        self.set(permission, true);
        self
    }

    /// Granted permissions in wire order.
    pub fn granted(&self) -> Vec<Permission> {
        Permission::ALL
            .into_iter()
            .filter(|p| self.get(*p))
            .collect()
    }

    /// Builds a permission set from granted permission names.
    ///
    /// # Errors
    ///
    /// Fails on a name that is not one of the 15 known permissions.
    pub fn from_granted<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut perms = Self::default();
        for name in names {
            perms.set(name.as_ref().parse()?, true);
        }
        Ok(perms)
    }

    /// Permissions granted here but not in `other`, in wire order.
    ///
    /// ```
    /// use vaultorg::{AccessPermissions, Permission};
    ///
    /// let old = AccessPermissions::default()
    ///     .with(Permission::AllowViewing)
    ///     .with(Permission::AllowEditing);
    /// let new = AccessPermissions::default().with(Permission::AllowViewing);
    /// assert_eq!(old.difference(&new), vec![Permission::AllowEditing]);
    /// assert!(new.difference(&old).is_empty());
    /// ```
    pub fn difference(&self, other: &AccessPermissions) -> Vec<Permission> {
        Permission::ALL
            .into_iter()
            .filter(|p| self.get(*p) && !other.get(*p))
            .collect()
    }

    /// True if no permission is granted.
    pub fn is_empty(&self) -> bool {
        self.granted().is_empty()
    }
}
