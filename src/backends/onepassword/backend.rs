//! 1Password repository implementation.

use super::command::OpCommand;
use super::wire::{decode, OpGroup, OpItem, OpMember, OpUser, OpVault};
use crate::cli::{CommandRunner, ProcessRunner};
use crate::model::{Group, Item, Membership, User, Vault, VaultGroupAccess, VaultUserAccess};
use crate::validation::{validate_name, validate_value};
use crate::{AccessPermissions, Config, Repository, Result, VaultorgError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

const BACKEND: &str = "onepassword";

/// Fragments of `op` stderr that mean the target does not exist.
const NOT_FOUND_MARKERS: &[&str] = &["isn't a", "doesn't exist", "does not exist", "not found"];

/// Stderr part of a non-zero exit reported by [`run_command`](crate::cli::run_command).
fn exit_stderr(msg: &str) -> Option<&str> {
    let (_, rest) = msg.split_once(" failed with exit code ")?;
    rest.split_once(": ").map(|(_, stderr)| stderr)
}

/// Maps a failed invocation whose stderr reports a missing target to
/// [`VaultorgError::NotFound`]. Spawn failures are left alone.
fn classify(err: VaultorgError, entity: &str) -> VaultorgError {
    let missing = match &err {
        VaultorgError::CommandFailed(msg) => exit_stderr(msg)
            .map(|stderr| {
                let stderr = stderr.to_lowercase();
                NOT_FOUND_MARKERS.iter().any(|m| stderr.contains(m))
            })
            .unwrap_or(false),
        _ => false,
    };

    if missing {
        VaultorgError::NotFound(entity.to_string())
    } else {
        err
    }
}

/// 1Password CLI repository.
///
/// Most methods map to one `op` invocation. Creates look the entity up
/// first, and grant and item ensures read the current record so they can
/// remove what the new record drops. No state is held between calls.
pub struct OnePasswordRepository {
    runner: Arc<dyn CommandRunner>,
}

impl OnePasswordRepository {
    /// Creates a repository running `config.op_path`.
    ///
    /// The `session` option, when set, is exported as `OP_SESSION`.
    pub fn new(config: &Config) -> Self {
        let mut runner = ProcessRunner::new(config.op_path.clone());
        if let Some(session) = config.get_option("session") {
            runner = runner.with_env("OP_SESSION", session.clone());
        }
        Self::with_runner(Arc::new(runner))
    }

    /// Creates a repository on top of any command runner.
    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    async fn run(&self, operation: &str, entity: &str, cmd: OpCommand) -> Result<String> {
        self.runner
            .run(cmd.args())
            .await
            .map_err(|e| VaultorgError::backend_op(BACKEND, operation, entity, classify(e, entity)))
    }

    async fn run_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        entity: &str,
        cmd: OpCommand,
    ) -> Result<T> {
        let stdout = self.run(operation, entity, cmd).await?;
        decode(&stdout).map_err(|e| VaultorgError::backend_op(BACKEND, operation, entity, e))
    }

    fn already_exists(entity: &str) -> VaultorgError {
        VaultorgError::backend_op(
            BACKEND,
            "create",
            entity,
            VaultorgError::AlreadyExists(entity.to_string()),
        )
    }

    fn not_found(operation: &str, entity: &str) -> VaultorgError {
        VaultorgError::backend_op(
            BACKEND,
            operation,
            entity,
            VaultorgError::NotFound(entity.to_string()),
        )
    }

    /// Finds `member_id` in a `list users|groups` listing.
    async fn find_member(
        &self,
        entity: &str,
        cmd: OpCommand,
        member_id: &str,
    ) -> Result<OpMember> {
        let members: Vec<OpMember> = self.run_json("get", entity, cmd).await?;
        members
            .into_iter()
            .find(|m| m.matches(member_id))
            .ok_or_else(|| Self::not_found("get", entity))
    }

    /// Moves a vault grant from `current` to exactly `wanted`.
    ///
    /// Flags held but no longer wanted are revoked first. The grant is then
    /// (re)issued with the full wanted set unless nothing new is added.
    async fn apply_grant(
        &self,
        entity: &str,
        noun: fn(OpCommand) -> OpCommand,
        vault_id: &str,
        member_id: &str,
        current: Option<AccessPermissions>,
        wanted: AccessPermissions,
    ) -> Result<()> {
        if let Some(current) = current {
            let dropped = current.difference(&wanted);
            if !dropped.is_empty() {
                let cmd = noun(OpCommand::new().remove())
                    .arg(member_id)
                    .vault_flag(vault_id)
                    .permissions(dropped.iter().map(|p| p.as_str()));
                self.run("remove", entity, cmd).await?;
                debug!(access = %entity, revoked = dropped.len(), "narrowed grant");
            }
            if wanted.difference(&current).is_empty() {
                return Ok(());
            }
        }

        let cmd = noun(OpCommand::new().add())
            .arg(member_id)
            .vault_flag(vault_id)
            .permissions(wanted.granted().iter().map(|p| p.as_str()));
        self.run("add", entity, cmd).await?;
        Ok(())
    }

    fn item_assignments(cmd: OpCommand, item: &Item) -> Result<OpCommand> {
        let mut cmd = cmd.assign("title", &item.title);
        for field in &item.fields {
            validate_name("field label", &field.label)?;
            validate_value("field value", &field.value)?;
            cmd = cmd.assign(&field.label, &field.value);
        }
        Ok(cmd)
    }
}

#[async_trait]
impl Repository for OnePasswordRepository {
    fn name(&self) -> &str {
        BACKEND
    }

    async fn create_user(&self, user: User) -> Result<User> {
        validate_name("user email", &user.email)?;
        validate_value("user name", &user.name)?;
        let entity = format!("user {}", user.email);

        if self.get_user_by_email(&user.email).await.is_ok() {
            return Err(Self::already_exists(&entity));
        }

        let cmd = OpCommand::new().create().user().arg(&user.email).arg(&user.name);
        let created: OpUser = self.run_json("create", &entity, cmd).await?;
        debug!(user = %created.uuid, "created user");
        Ok(created.into())
    }

    async fn get_user_by_id(&self, id: &str) -> Result<User> {
        validate_name("user id", id)?;
        let cmd = OpCommand::new().get().user().arg(id);
        let user: OpUser = self.run_json("get", &format!("user {}", id), cmd).await?;
        Ok(user.into())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User> {
        validate_name("user email", email)?;
        let cmd = OpCommand::new().get().user().arg(email);
        let user: OpUser = self.run_json("get", &format!("user {}", email), cmd).await?;
        Ok(user.into())
    }

    async fn ensure_user(&self, user: User) -> Result<User> {
        validate_name("user id", &user.id)?;
        validate_value("user name", &user.name)?;

        let cmd = OpCommand::new().edit().user().arg(&user.id).name_flag(&user.name);
        self.run("edit", &format!("user {}", user.id), cmd).await?;
        Ok(user)
    }

    async fn delete_user(&self, id: &str) -> Result<()> {
        validate_name("user id", id)?;
        let cmd = OpCommand::new().delete().user().arg(id);
        self.run("delete", &format!("user {}", id), cmd).await?;
        Ok(())
    }

    async fn create_group(&self, group: Group) -> Result<Group> {
        validate_name("group name", &group.name)?;
        validate_value("group description", &group.description)?;
        let entity = format!("group {}", group.name);

        if self.get_group_by_name(&group.name).await.is_ok() {
            return Err(Self::already_exists(&entity));
        }

        let mut cmd = OpCommand::new().create().group().arg(&group.name);
        if !group.description.is_empty() {
            cmd = cmd.description(&group.description);
        }
        let created: OpGroup = self.run_json("create", &entity, cmd).await?;
        debug!(group = %created.uuid, "created group");
        Ok(created.into())
    }

    async fn get_group_by_id(&self, id: &str) -> Result<Group> {
        validate_name("group id", id)?;
        let cmd = OpCommand::new().get().group().arg(id);
        let group: OpGroup = self.run_json("get", &format!("group {}", id), cmd).await?;
        Ok(group.into())
    }

    async fn get_group_by_name(&self, name: &str) -> Result<Group> {
        validate_name("group name", name)?;
        let cmd = OpCommand::new().get().group().arg(name);
        let group: OpGroup = self.run_json("get", &format!("group {}", name), cmd).await?;
        Ok(group.into())
    }

    async fn ensure_group(&self, group: Group) -> Result<Group> {
        validate_name("group id", &group.id)?;
        validate_name("group name", &group.name)?;
        validate_value("group description", &group.description)?;

        let cmd = OpCommand::new()
            .edit()
            .group()
            .arg(&group.id)
            .name_flag(&group.name)
            .description(&group.description);
        self.run("edit", &format!("group {}", group.id), cmd).await?;
        Ok(group)
    }

    async fn delete_group(&self, id: &str) -> Result<()> {
        validate_name("group id", id)?;
        let cmd = OpCommand::new().delete().group().arg(id);
        self.run("delete", &format!("group {}", id), cmd).await?;
        Ok(())
    }

    async fn ensure_membership(&self, membership: Membership) -> Result<()> {
        validate_name("group id", &membership.group_id)?;
        validate_name("user id", &membership.user_id)?;

        let cmd = OpCommand::new()
            .add()
            .user()
            .arg(&membership.user_id)
            .group_flag(&membership.group_id);
        self.run("add", &format!("membership {}", membership.key()), cmd)
            .await?;
        Ok(())
    }

    async fn get_membership(&self, group_id: &str, user_id: &str) -> Result<Membership> {
        validate_name("group id", group_id)?;
        validate_name("user id", user_id)?;

        let membership = Membership::new(group_id, user_id);
        let cmd = OpCommand::new().list().users().group_flag(group_id);
        self.find_member(&format!("membership {}", membership.key()), cmd, user_id)
            .await?;
        Ok(membership)
    }

    async fn delete_membership(&self, group_id: &str, user_id: &str) -> Result<()> {
        validate_name("group id", group_id)?;
        validate_name("user id", user_id)?;

        let cmd = OpCommand::new()
            .remove()
            .user()
            .arg(user_id)
            .group_flag(group_id);
        self.run("remove", &format!("membership {}/{}", group_id, user_id), cmd)
            .await?;
        Ok(())
    }

    async fn create_vault(&self, vault: Vault) -> Result<Vault> {
        validate_name("vault name", &vault.name)?;
        validate_value("vault description", &vault.description)?;
        let entity = format!("vault {}", vault.name);

        // Not atomic with the create below.
        if self.get_vault_by_name(&vault.name).await.is_ok() {
            return Err(Self::already_exists(&entity));
        }

        let mut cmd = OpCommand::new().create().vault().arg(&vault.name);
        if !vault.description.is_empty() {
            cmd = cmd.description(&vault.description);
        }
        let created: OpVault = self.run_json("create", &entity, cmd).await?;
        debug!(vault = %created.uuid, "created vault");
        Ok(created.into())
    }

    async fn get_vault_by_id(&self, id: &str) -> Result<Vault> {
        validate_name("vault id", id)?;
        let cmd = OpCommand::new().get().vault().arg(id);
        let vault: OpVault = self.run_json("get", &format!("vault {}", id), cmd).await?;
        Ok(vault.into())
    }

    async fn get_vault_by_name(&self, name: &str) -> Result<Vault> {
        validate_name("vault name", name)?;
        let cmd = OpCommand::new().get().vault().arg(name);
        let vault: OpVault = self.run_json("get", &format!("vault {}", name), cmd).await?;
        Ok(vault.into())
    }

    async fn list_vaults_by_user(&self, user_id: &str) -> Result<Vec<Vault>> {
        validate_name("user id", user_id)?;
        let cmd = OpCommand::new().list().vaults().user_flag(user_id);
        let vaults: Vec<OpVault> = self
            .run_json("list", &format!("vaults of user {}", user_id), cmd)
            .await?;
        Ok(vaults.into_iter().map(Vault::from).collect())
    }

    async fn ensure_vault(&self, vault: Vault) -> Result<Vault> {
        validate_name("vault id", &vault.id)?;
        validate_name("vault name", &vault.name)?;
        validate_value("vault description", &vault.description)?;

        let cmd = OpCommand::new()
            .edit()
            .vault()
            .arg(&vault.id)
            .name_flag(&vault.name)
            .description(&vault.description);
        self.run("edit", &format!("vault {}", vault.id), cmd).await?;
        Ok(vault)
    }

    async fn delete_vault(&self, id: &str) -> Result<()> {
        validate_name("vault id", id)?;
        let cmd = OpCommand::new().delete().vault().arg(id);
        self.run("delete", &format!("vault {}", id), cmd).await?;
        Ok(())
    }

    async fn ensure_vault_group_access(&self, access: VaultGroupAccess) -> Result<()> {
        validate_name("vault id", &access.vault_id)?;
        validate_name("group id", &access.group_id)?;

        let current = match self
            .get_vault_group_access(&access.vault_id, &access.group_id)
            .await
        {
            Ok(existing) => Some(existing.permissions),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };

        self.apply_grant(
            &format!("vault group access {}", access.key()),
            OpCommand::group,
            &access.vault_id,
            &access.group_id,
            current,
            access.permissions,
        )
        .await
    }

    async fn get_vault_group_access(
        &self,
        vault_id: &str,
        group_id: &str,
    ) -> Result<VaultGroupAccess> {
        validate_name("vault id", vault_id)?;
        validate_name("group id", group_id)?;

        let entity = format!("vault group access {}/{}", vault_id, group_id);
        let cmd = OpCommand::new().list().groups().vault_flag(vault_id);
        let member = self.find_member(&entity, cmd, group_id).await?;
        let permissions = member
            .access_permissions()
            .map_err(|e| VaultorgError::backend_op(BACKEND, "get", &entity, e))?;
        Ok(VaultGroupAccess::new(vault_id, group_id, permissions))
    }

    async fn delete_vault_group_access(&self, vault_id: &str, group_id: &str) -> Result<()> {
        validate_name("vault id", vault_id)?;
        validate_name("group id", group_id)?;

        let cmd = OpCommand::new()
            .remove()
            .group()
            .arg(group_id)
            .vault_flag(vault_id);
        self.run(
            "remove",
            &format!("vault group access {}/{}", vault_id, group_id),
            cmd,
        )
        .await?;
        Ok(())
    }

    async fn ensure_vault_user_access(&self, access: VaultUserAccess) -> Result<()> {
        validate_name("vault id", &access.vault_id)?;
        validate_name("user id", &access.user_id)?;

        let current = match self
            .get_vault_user_access(&access.vault_id, &access.user_id)
            .await
        {
            Ok(existing) => Some(existing.permissions),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };

        self.apply_grant(
            &format!("vault user access {}", access.key()),
            OpCommand::user,
            &access.vault_id,
            &access.user_id,
            current,
            access.permissions,
        )
        .await
    }

    async fn get_vault_user_access(
        &self,
        vault_id: &str,
        user_id: &str,
    ) -> Result<VaultUserAccess> {
        validate_name("vault id", vault_id)?;
        validate_name("user id", user_id)?;

        let entity = format!("vault user access {}/{}", vault_id, user_id);
        let cmd = OpCommand::new().list().users().vault_flag(vault_id);
        let member = self.find_member(&entity, cmd, user_id).await?;
        let permissions = member
            .access_permissions()
            .map_err(|e| VaultorgError::backend_op(BACKEND, "get", &entity, e))?;
        Ok(VaultUserAccess::new(vault_id, user_id, permissions))
    }

    async fn delete_vault_user_access(&self, vault_id: &str, user_id: &str) -> Result<()> {
        validate_name("vault id", vault_id)?;
        validate_name("user id", user_id)?;

        let cmd = OpCommand::new()
            .remove()
            .user()
            .arg(user_id)
            .vault_flag(vault_id);
        self.run(
            "remove",
            &format!("vault user access {}/{}", vault_id, user_id),
            cmd,
        )
        .await?;
        Ok(())
    }

    async fn create_item(&self, item: Item) -> Result<Item> {
        validate_name("vault id", &item.vault_id)?;
        validate_name("item title", &item.title)?;
        let entity = format!("item {}", item.title);

        if self.get_item_by_title(&item.vault_id, &item.title).await.is_ok() {
            return Err(Self::already_exists(&entity));
        }

        let cmd = OpCommand::new().create().item().vault_flag(&item.vault_id);
        let cmd = Self::item_assignments(cmd, &item)?.format_json();
        let created: OpItem = self.run_json("create", &entity, cmd).await?;
        debug!(item = %created.id, vault = %item.vault_id, "created item");
        Ok(created.into())
    }

    async fn get_item_by_id(&self, id: &str) -> Result<Item> {
        validate_name("item id", id)?;
        let cmd = OpCommand::new().get().item().arg(id).format_json();
        let item: OpItem = self.run_json("get", &format!("item {}", id), cmd).await?;
        Ok(item.into())
    }

    async fn get_item_by_title(&self, vault_id: &str, title: &str) -> Result<Item> {
        validate_name("vault id", vault_id)?;
        validate_name("item title", title)?;

        let cmd = OpCommand::new()
            .get()
            .item()
            .arg(title)
            .vault_flag(vault_id)
            .format_json();
        let item: OpItem = self
            .run_json("get", &format!("item {} in vault {}", title, vault_id), cmd)
            .await?;
        Ok(item.into())
    }

    async fn ensure_item(&self, item: Item) -> Result<Item> {
        validate_name("item id", &item.id)?;
        validate_name("item title", &item.title)?;

        let stored = self.get_item_by_id(&item.id).await?;

        let cmd = OpCommand::new().edit().item().arg(&item.id);
        let mut cmd = Self::item_assignments(cmd, &item)?;
        // Built-in fields cannot be deleted, only cleared.
        for dropped in stored
            .fields
            .iter()
            .filter(|old| !item.fields.iter().any(|f| f.label == old.label))
        {
            cmd = if dropped.purpose.is_empty() {
                cmd.delete_field(&dropped.label)
            } else {
                cmd.assign(&dropped.label, "")
            };
        }

        self.run("edit", &format!("item {}", item.id), cmd).await?;
        Ok(item)
    }

    async fn delete_item(&self, id: &str) -> Result<()> {
        validate_name("item id", id)?;
        let cmd = OpCommand::new().delete().item().arg(id);
        self.run("delete", &format!("item {}", id), cmd).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Field, Permission};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Runner that expects an exact sequence of commands.
    #[derive(Default)]
    struct ScriptedRunner {
        script: Mutex<VecDeque<(Vec<String>, Result<String>)>>,
    }

    impl ScriptedRunner {
        fn expect(self, cmd: &str, response: Result<&str>) -> Self {
            let args = cmd.split_whitespace().map(String::from).collect();
            self.script
                .lock()
                .unwrap()
                .push_back((args, response.map(String::from)));
            self
        }

        fn assert_done(&self) {
            let left = self.script.lock().unwrap();
            assert!(left.is_empty(), "unconsumed commands: {:?}", left.len());
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, args: &[String]) -> Result<String> {
            let (expected, response) = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected command: {:?}", args));
            assert_eq!(args, expected.as_slice());
            response
        }
    }

    fn failed(stderr: &str) -> Result<&str> {
        Err(VaultorgError::CommandFailed(format!(
            "op failed with exit code 1: {}",
            stderr
        )))
    }

    fn repo(runner: ScriptedRunner) -> (OnePasswordRepository, Arc<ScriptedRunner>) {
        let runner = Arc::new(runner);
        (OnePasswordRepository::with_runner(runner.clone()), runner)
    }

    const VAULT_JSON: &str = r#"{"uuid":"1234567890","type":"U","name":"test-00","desc":"Test00","createdAt":"2022-03-14T07:48:26.179385832+01:00"}"#;

    #[tokio::test]
    async fn test_create_vault() {
        let (repo, runner) = repo(
            ScriptedRunner::default()
                .expect("get vault test-00", failed("vault doesn't exist"))
                .expect("create vault test-00 --description Test00", Ok(VAULT_JSON)),
        );

        let vault = repo.create_vault(Vault::new("test-00", "Test00")).await.unwrap();
        assert_eq!(
            vault,
            Vault {
                id: "1234567890".to_string(),
                name: "test-00".to_string(),
                description: "Test00".to_string(),
            }
        );
        runner.assert_done();
    }

    #[tokio::test]
    async fn test_create_vault_already_exists() {
        let (repo, runner) = repo(
            ScriptedRunner::default().expect("get vault test-00", Ok(VAULT_JSON)),
        );

        let err = repo.create_vault(Vault::new("test-00", "Test00")).await.unwrap_err();
        assert!(err.is_already_exists());
        runner.assert_done();
    }

    #[tokio::test]
    async fn test_create_vault_lookup_error_means_absent() {
        let (repo, runner) = repo(
            ScriptedRunner::default()
                .expect("get vault test-00", failed("something"))
                .expect("create vault test-00 --description Test00", failed("something")),
        );

        let err = repo.create_vault(Vault::new("test-00", "Test00")).await.unwrap_err();
        assert!(matches!(err.root(), VaultorgError::CommandFailed(_)));
        assert!(err.to_string().contains("onepassword: create vault test-00"));
        runner.assert_done();
    }

    #[tokio::test]
    async fn test_get_vault_by_id() {
        let (repo, runner) = repo(
            ScriptedRunner::default().expect(
                "get vault test-id",
                Ok(r#"{"uuid":"1234567890","type":"U","name":"test-00","desc":"Test00"}"#),
            ),
        );

        let vault = repo.get_vault_by_id("test-id").await.unwrap();
        assert_eq!(vault.id, "1234567890");
        assert_eq!(vault.description, "Test00");
        runner.assert_done();
    }

    #[tokio::test]
    async fn test_get_vault_not_found() {
        let (repo, runner) = repo(
            ScriptedRunner::default()
                .expect("get vault ghost", failed("\"ghost\" isn't a vault in this account")),
        );

        let err = repo.get_vault_by_id("ghost").await.unwrap_err();
        assert!(err.is_not_found());
        runner.assert_done();
    }

    #[tokio::test]
    async fn test_get_vault_malformed_output() {
        let (repo, runner) =
            repo(ScriptedRunner::default().expect("get vault test-id", Ok("{\"uuid\":")));

        let err = repo.get_vault_by_id("test-id").await.unwrap_err();
        assert!(matches!(err.root(), VaultorgError::Json(_)));
        runner.assert_done();
    }

    #[tokio::test]
    async fn test_ensure_vault() {
        let (repo, runner) = repo(
            ScriptedRunner::default()
                .expect("edit vault test-id --name test-00 --description Test00", Ok("")),
        );

        let vault = Vault {
            id: "test-id".to_string(),
            name: "test-00".to_string(),
            description: "Test00".to_string(),
        };
        assert_eq!(repo.ensure_vault(vault.clone()).await.unwrap(), vault);
        runner.assert_done();
    }

    #[tokio::test]
    async fn test_ensure_vault_missing() {
        let (repo, runner) = repo(
            ScriptedRunner::default().expect(
                "edit vault test-id --name test-00 --description Test00",
                failed("vault test-id doesn't exist"),
            ),
        );

        let mut vault = Vault::new("test-00", "Test00");
        vault.id = "test-id".to_string();
        assert!(repo.ensure_vault(vault).await.unwrap_err().is_not_found());
        runner.assert_done();
    }

    #[tokio::test]
    async fn test_delete_vault() {
        let (repo, runner) = repo(
            ScriptedRunner::default()
                .expect("delete vault test-id", Ok(""))
                .expect("delete vault test-id", failed("something")),
        );

        repo.delete_vault("test-id").await.unwrap();
        assert!(repo.delete_vault("test-id").await.is_err());
        runner.assert_done();
    }

    #[tokio::test]
    async fn test_user_lifecycle() {
        let user_json = r#"{"uuid":"U1","email":"alice@example.com","name":"Alice","state":"A"}"#;
        let (repo, runner) = repo(
            ScriptedRunner::default()
                .expect("get user alice@example.com", failed("user not found"))
                .expect("create user alice@example.com Alice", Ok(user_json))
                .expect("edit user U1 --name Alicia", Ok(""))
                .expect("delete user U1", Ok("")),
        );

        let user = repo.create_user(User::new("alice@example.com", "Alice")).await.unwrap();
        assert_eq!(user.id, "U1");

        let renamed = User {
            name: "Alicia".to_string(),
            ..user
        };
        assert_eq!(repo.ensure_user(renamed.clone()).await.unwrap(), renamed);
        repo.delete_user("U1").await.unwrap();
        runner.assert_done();
    }

    #[tokio::test]
    async fn test_create_group_without_description() {
        let (repo, runner) = repo(
            ScriptedRunner::default()
                .expect("get group ops", failed("group ops doesn't exist"))
                .expect("create group ops", Ok(r#"{"uuid":"G1","name":"ops"}"#)),
        );

        let group = repo.create_group(Group::new("ops", "")).await.unwrap();
        assert_eq!(group.id, "G1");
        assert!(group.description.is_empty());
        runner.assert_done();
    }

    #[tokio::test]
    async fn test_membership() {
        let listing = r#"[{"uuid":"U1","email":"alice@example.com","name":"Alice"}]"#;
        let (repo, runner) = repo(
            ScriptedRunner::default()
                .expect("add user U1 --group G1", Ok(""))
                .expect("list users --group G1", Ok(listing))
                .expect("list users --group G1", Ok(listing))
                .expect("remove user U1 --group G1", Ok("")),
        );

        repo.ensure_membership(Membership::new("G1", "U1")).await.unwrap();
        assert_eq!(
            repo.get_membership("G1", "U1").await.unwrap(),
            Membership::new("G1", "U1")
        );
        assert!(repo.get_membership("G1", "U2").await.unwrap_err().is_not_found());
        repo.delete_membership("G1", "U1").await.unwrap();
        runner.assert_done();
    }

    #[tokio::test]
    async fn test_vault_user_access() {
        let listing = r#"[
            {"uuid":"U1","name":"Alice","permissions":["allow_viewing"]},
            {"uuid":"U2","name":"Bob","permissions":["allow_viewing","allow_editing"]}
        ]"#;
        let (repo, runner) = repo(
            ScriptedRunner::default()
                .expect("list users --vault V1", Ok("[]"))
                .expect("add user U1 --vault V1 --permissions allow_viewing", Ok(""))
                .expect("list users --vault V1", Ok(listing))
                .expect("list users --vault V1", Ok(listing))
                .expect("remove user U1 --vault V1", Ok("")),
        );

        let perms = AccessPermissions::default().with(Permission::AllowViewing);
        repo.ensure_vault_user_access(VaultUserAccess::new("V1", "U1", perms))
            .await
            .unwrap();

        let access = repo.get_vault_user_access("V1", "U1").await.unwrap();
        assert_eq!(access.permissions, perms);
        assert_eq!(access.permissions.granted().len(), 1);

        let err = repo.get_vault_user_access("V1", "U3").await.unwrap_err();
        assert!(err.is_not_found());

        repo.delete_vault_user_access("V1", "U1").await.unwrap();
        runner.assert_done();
    }

    #[tokio::test]
    async fn test_ensure_user_access_narrows_grant() {
        let both = r#"[{"uuid":"U1","name":"Alice","permissions":["allow_viewing","allow_editing"]}]"#;
        let viewing = r#"[{"uuid":"U1","name":"Alice","permissions":["allow_viewing"]}]"#;
        let (repo, runner) = repo(
            ScriptedRunner::default()
                .expect("list users --vault V1", Ok(both))
                .expect("remove user U1 --vault V1 --permissions allow_editing", Ok(""))
                .expect("list users --vault V1", Ok(viewing))
                .expect("remove user U1 --vault V1 --permissions allow_viewing", Ok("")),
        );

        let viewing_only = AccessPermissions::default().with(Permission::AllowViewing);
        repo.ensure_vault_user_access(VaultUserAccess::new("V1", "U1", viewing_only))
            .await
            .unwrap();
        repo.ensure_vault_user_access(VaultUserAccess::new(
            "V1",
            "U1",
            AccessPermissions::default(),
        ))
        .await
        .unwrap();
        runner.assert_done();
    }

    #[tokio::test]
    async fn test_ensure_group_access_swaps_flags() {
        let (repo, runner) = repo(
            ScriptedRunner::default()
                .expect(
                    "list groups --vault V1",
                    Ok(r#"[{"uuid":"G1","name":"ops","permissions":["view_items"]}]"#),
                )
                .expect("remove group G1 --vault V1 --permissions view_items", Ok(""))
                .expect("add group G1 --vault V1 --permissions edit_items", Ok("")),
        );

        let perms = AccessPermissions::default().with(Permission::EditItems);
        repo.ensure_vault_group_access(VaultGroupAccess::new("V1", "G1", perms))
            .await
            .unwrap();
        runner.assert_done();
    }

    #[tokio::test]
    async fn test_ensure_group_access_unchanged_is_noop() {
        let (repo, runner) = repo(ScriptedRunner::default().expect(
            "list groups --vault V1",
            Ok(r#"[{"uuid":"G1","name":"ops","permissions":["view_items"]}]"#),
        ));

        let perms = AccessPermissions::default().with(Permission::ViewItems);
        repo.ensure_vault_group_access(VaultGroupAccess::new("V1", "G1", perms))
            .await
            .unwrap();
        runner.assert_done();
    }

    #[tokio::test]
    async fn test_vault_group_access_without_permissions() {
        let teleport = r#"[{"uuid":"G1","name":"ops","permissions":["teleport"]}]"#;
        let (repo, runner) = repo(
            ScriptedRunner::default()
                .expect("list groups --vault V1", Ok("[]"))
                .expect("add group G1 --vault V1", Ok(""))
                .expect("list groups --vault V1", Ok(teleport))
                .expect("list groups --vault V1", Ok(teleport)),
        );

        let none = AccessPermissions::default();
        repo.ensure_vault_group_access(VaultGroupAccess::new("V1", "G1", none))
            .await
            .unwrap();

        let err = repo.get_vault_group_access("V1", "G1").await.unwrap_err();
        assert!(err.to_string().contains("teleport"));

        let err = repo
            .ensure_vault_group_access(VaultGroupAccess::new("V1", "G1", none))
            .await
            .unwrap_err();
        assert!(!err.is_not_found());
        runner.assert_done();
    }

    #[tokio::test]
    async fn test_item_lifecycle() {
        let item_json = r#"{"id":"I1","title":"db","vault":{"id":"V1","name":"Team"},"fields":[{"id":"password","type":"CONCEALED","purpose":"PASSWORD","label":"password","value":"s3cret"}]}"#;
        let (repo, runner) = repo(
            ScriptedRunner::default()
                .expect("get item db --vault V1 --format json", failed("\"db\" isn't an item"))
                .expect(
                    "create item --vault V1 title=db password=s3cret --format json",
                    Ok(item_json),
                )
                .expect("get item I1 --format json", Ok(item_json))
                .expect("get item I1 --format json", Ok(item_json))
                .expect("edit item I1 title=db2 password=", Ok(""))
                .expect("delete item I1", Ok("")),
        );

        let item = Item::new("V1", "db").with_field(Field::new("password", "s3cret"));
        let created = repo.create_item(item).await.unwrap();
        assert_eq!(created.id, "I1");
        assert_eq!(created.fields[0].value, "s3cret");

        assert_eq!(repo.get_item_by_id("I1").await.unwrap(), created);

        let renamed = Item {
            title: "db2".to_string(),
            fields: Vec::new(),
            ..created
        };
        repo.ensure_item(renamed).await.unwrap();
        repo.delete_item("I1").await.unwrap();
        runner.assert_done();
    }

    #[tokio::test]
    async fn test_ensure_item_deletes_dropped_fields() {
        let stored = r#"{"id":"I1","title":"db","vault":{"id":"V1"},"fields":[
            {"id":"a1","type":"STRING","label":"host","value":"10.0.0.1"},
            {"id":"a2","type":"STRING","label":"port","value":"5432"}
        ]}"#;
        let (repo, runner) = repo(
            ScriptedRunner::default()
                .expect("get item I1 --format json", Ok(stored))
                .expect("edit item I1 title=db host=10.0.0.2 port[delete]", Ok("")),
        );

        let mut item = Item::new("V1", "db").with_field(Field::new("host", "10.0.0.2"));
        item.id = "I1".to_string();
        assert_eq!(repo.ensure_item(item.clone()).await.unwrap(), item);
        runner.assert_done();
    }

    #[tokio::test]
    async fn test_ensure_item_missing() {
        let (repo, runner) = repo(
            ScriptedRunner::default()
                .expect("get item I9 --format json", failed("\"I9\" isn't an item")),
        );

        let mut item = Item::new("V1", "db");
        item.id = "I9".to_string();
        assert!(repo.ensure_item(item).await.unwrap_err().is_not_found());
        runner.assert_done();
    }

    #[tokio::test]
    async fn test_list_vaults_by_user() {
        let (repo, runner) = repo(ScriptedRunner::default().expect(
            "list vaults --user U1",
            Ok(r#"[{"uuid":"V1","name":"Team"},{"uuid":"V2","name":"Infra"}]"#),
        ));

        let vaults = repo.list_vaults_by_user("U1").await.unwrap();
        assert_eq!(vaults.len(), 2);
        assert_eq!(vaults[1].name, "Infra");
        runner.assert_done();
    }

    #[tokio::test]
    async fn test_invalid_input_never_runs() {
        let (repo, runner) = repo(ScriptedRunner::default());

        let err = repo.get_vault_by_name("--format").await.unwrap_err();
        assert!(matches!(err, VaultorgError::InvalidName(_)));
        runner.assert_done();
    }

    #[test]
    fn test_classify() {
        let err = classify(
            VaultorgError::CommandFailed(
                "op failed with exit code 1: [ERROR] \"x\" isn't an item".to_string(),
            ),
            "item x",
        );
        assert!(matches!(err, VaultorgError::NotFound(ref e) if e == "item x"));

        let err = classify(
            VaultorgError::CommandFailed("op failed with exit code 1: timeout".to_string()),
            "item x",
        );
        assert!(matches!(err, VaultorgError::CommandFailed(_)));
    }

    #[test]
    fn test_classify_ignores_spawn_failures() {
        let err = classify(
            VaultorgError::CommandFailed(
                "/opt/op could not be started: No such file or directory (os error 2)".to_string(),
            ),
            "vault v1",
        );
        assert!(matches!(err, VaultorgError::CommandFailed(_)));

        let err = classify(
            VaultorgError::CommandFailed("op could not be started: not found".to_string()),
            "vault v1",
        );
        assert!(!err.is_not_found());
    }
}
