//! JSON records printed by `op`, and their mapping to domain records.
//!
//! Every field defaults when missing and unknown fields are ignored, so newer
//! tool versions adding keys do not break decoding.

use crate::model::{Field, Group, Item, User, Vault};
use crate::{AccessPermissions, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Decodes `op` stdout.
pub(crate) fn decode<T: DeserializeOwned>(stdout: &str) -> Result<T> {
    Ok(serde_json::from_str(stdout)?)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct OpVault {
    #[serde(alias = "id")]
    pub uuid: String,
    pub name: String,
    #[serde(alias = "description")]
    pub desc: String,
}

impl From<OpVault> for Vault {
    fn from(v: OpVault) -> Self {
        Vault {
            id: v.uuid,
            name: v.name,
            description: v.desc,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct OpUser {
    #[serde(alias = "id")]
    pub uuid: String,
    pub email: String,
    pub name: String,
}

impl From<OpUser> for User {
    fn from(u: OpUser) -> Self {
        User {
            id: u.uuid,
            email: u.email,
            name: u.name,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct OpGroup {
    #[serde(alias = "id")]
    pub uuid: String,
    pub name: String,
    #[serde(alias = "description")]
    pub desc: String,
}

impl From<OpGroup> for Group {
    fn from(g: OpGroup) -> Self {
        Group {
            id: g.uuid,
            name: g.name,
            description: g.desc,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct OpItemVault {
    pub id: String,
    pub name: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub(crate) struct OpField {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub purpose: String,
    pub label: String,
    pub value: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub(crate) struct OpItem {
    pub id: String,
    pub title: String,
    pub vault: OpItemVault,
    pub fields: Vec<OpField>,
}

impl From<OpItem> for Item {
    fn from(i: OpItem) -> Self {
        Item {
            id: i.id,
            vault_id: i.vault.id,
            title: i.title,
            fields: i
                .fields
                .into_iter()
                .map(|f| Field {
                    id: f.id,
                    label: f.label,
                    field_type: f.field_type,
                    purpose: f.purpose,
                    value: f.value,
                })
                .collect(),
        }
    }
}

/// Entry of `list users|groups --vault|--group`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct OpMember {
    #[serde(alias = "id")]
    pub uuid: String,
    pub name: String,
    pub email: String,
    pub permissions: Vec<String>,
}

impl OpMember {
    pub(crate) fn matches(&self, id: &str) -> bool {
        self.uuid == id || (!self.email.is_empty() && self.email == id)
    }

    pub(crate) fn access_permissions(&self) -> Result<AccessPermissions> {
        AccessPermissions::from_granted(&self.permissions)
    }
}
