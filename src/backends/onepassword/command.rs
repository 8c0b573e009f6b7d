//! Argument builder for `op` invocations.

/// Accumulates the argv of one `op` command.
///
/// ```
/// use vaultorg::backends::onepassword::OpCommand;
///
/// let cmd = OpCommand::new().create().vault().arg("test-00").description("Test00");
/// assert_eq!(cmd.args(), ["create", "vault", "test-00", "--description", "Test00"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpCommand {
    args: Vec<String>,
}

impl OpCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw positional argument.
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Appends `--<name> <value>`.
    pub fn flag(self, name: &str, value: impl Into<String>) -> Self {
        self.arg(format!("--{}", name)).arg(value)
    }

    // Verbs

    pub fn get(self) -> Self {
        self.arg("get")
    }

    pub fn create(self) -> Self {
        self.arg("create")
    }

    pub fn edit(self) -> Self {
        self.arg("edit")
    }

    pub fn delete(self) -> Self {
        self.arg("delete")
    }

    pub fn add(self) -> Self {
        self.arg("add")
    }

    pub fn remove(self) -> Self {
        self.arg("remove")
    }

    pub fn list(self) -> Self {
        self.arg("list")
    }

    // Nouns

    pub fn vault(self) -> Self {
        self.arg("vault")
    }

    pub fn vaults(self) -> Self {
        self.arg("vaults")
    }

    pub fn item(self) -> Self {
        self.arg("item")
    }

    pub fn user(self) -> Self {
        self.arg("user")
    }

    pub fn users(self) -> Self {
        self.arg("users")
    }

    pub fn group(self) -> Self {
        self.arg("group")
    }

    pub fn groups(self) -> Self {
        self.arg("groups")
    }

    // Flags

    pub fn name_flag(self, name: impl Into<String>) -> Self {
        self.flag("name", name)
    }

    pub fn description(self, description: impl Into<String>) -> Self {
        self.flag("description", description)
    }

    pub fn vault_flag(self, vault: impl Into<String>) -> Self {
        self.flag("vault", vault)
    }

    pub fn group_flag(self, group: impl Into<String>) -> Self {
        self.flag("group", group)
    }

    pub fn user_flag(self, user: impl Into<String>) -> Self {
        self.flag("user", user)
    }

    /// Appends `--permissions a,b,c`. Nothing is added for an empty list.
    pub fn permissions<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = names
            .into_iter()
            .map(|n| n.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        if joined.is_empty() {
            self
        } else {
            self.flag("permissions", joined)
        }
    }

    pub fn format_json(self) -> Self {
        self.flag("format", "json")
    }

    /// Appends a field assignment `<label>=<value>`.
    ///
    /// `.`, `=`, `[` and `\` in the label are backslash-escaped so the tool
    /// does not read them as section, assignment or type separators.
    pub fn assign(self, label: &str, value: &str) -> Self {
        self.arg(format!("{}={}", escape_label(label), value))
    }

    /// Appends `<label>[delete]`, removing a custom field from an item.
    pub fn delete_field(self, label: &str) -> Self {
        self.arg(format!("{}[delete]", escape_label(label)))
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn into_args(self) -> Vec<String> {
        self.args
    }
}

fn escape_label(label: &str) -> String {
    let mut escaped = String::with_capacity(label.len());
    for c in label.chars() {
        if matches!(c, '.' | '=' | '\\' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_item_by_title() {
        let cmd = OpCommand::new()
            .get()
            .item()
            .arg("db")
            .vault_flag("v1")
            .format_json();
        assert_eq!(
            cmd.into_args(),
            vec!["get", "item", "db", "--vault", "v1", "--format", "json"]
        );
    }

    #[test]
    fn test_assign_escapes_label() {
        let cmd = OpCommand::new().assign("db.host=primary", "10.0.0.1");
        assert_eq!(cmd.args(), [r"db\.host\=primary=10.0.0.1"]);
    }

    #[test]
    fn test_delete_field() {
        let cmd = OpCommand::new().edit().item().arg("I1").delete_field("db.host");
        assert_eq!(cmd.args(), ["edit", "item", "I1", r"db\.host[delete]"]);
    }

    #[test]
    fn test_empty_permissions_omitted() {
        let none: [&str; 0] = [];
        let cmd = OpCommand::new().add().group().arg("ops").permissions(none);
        assert_eq!(cmd.args(), ["add", "group", "ops"]);

        let cmd = OpCommand::new().permissions(["view_items", "edit_items"]);
        assert_eq!(cmd.args(), ["--permissions", "view_items,edit_items"]);
    }
}
