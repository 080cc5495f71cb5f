//! Raw command entries to executable commands.
//!
//! Normalization runs once per selected block, right before its commands
//! execute, so named `for-vars` lists see block variables too.

use super::resolver::ResolvedBlock;
use super::schema::{describe_value, RawCommand, RawForVars};
use super::template::placeholders;
use super::vars::{VarLookup, VarRegistry, INDEX_VAR, ITER_VAR};
use crate::error::DexError;

/// Value iterated once when a command has no `for-vars`.
pub const SINGLE_PASS: &str = "1";

/// A command ready to execute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    /// Template run with the shell
    pub exec: String,

    /// Template echoed before `exec`
    pub diag: String,

    /// Template for a working directory that sticks for later commands
    pub dir: String,

    /// Template for a `test` expression gating the command
    pub condition: String,

    /// Shell program
    pub shell: String,

    /// Shell arguments, before the rendered command text
    pub shell_args: Vec<String>,

    /// Values iterated over, one pass each
    pub for_vars: Vec<String>,
}

/// A selected block with its commands normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedBlock {
    /// Block name
    pub name: String,

    /// Working directory template for the first command
    pub dir: String,

    /// Commands in declared order
    pub commands: Vec<Command>,
}

/// Normalize every command of a resolved block.
pub fn prepare_block(resolved: &ResolvedBlock<'_>, registry: &VarRegistry) -> PreparedBlock {
    let commands = resolved
        .block
        .commands
        .iter()
        .map(|raw| normalize_command(raw, &resolved.shell, &resolved.shell_args, registry))
        .collect::<Vec<_>>();

    for command in &commands {
        report_unknown_placeholders(command, registry);
    }

    PreparedBlock { name: resolved.block.name.clone(), dir: resolved.dir.clone(), commands }
}

/// Normalize one raw command, defaulting its shell from the block.
pub fn normalize_command(
    raw: &RawCommand,
    shell: &str,
    shell_args: &[String],
    registry: &VarRegistry,
) -> Command {
    let text = |field: &Option<String>| field.clone().unwrap_or_default();

    Command {
        exec: text(&raw.exec),
        diag: text(&raw.diag),
        dir: text(&raw.dir),
        condition: text(&raw.condition),
        shell: raw.shell.clone().filter(|s| !s.is_empty()).unwrap_or_else(|| shell.to_string()),
        shell_args: raw
            .shell_args
            .clone()
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| shell_args.to_vec()),
        for_vars: resolve_for_vars(raw.for_vars.as_ref(), registry),
    }
}

/// Turn a `for-vars` entry into the concrete values to iterate.
///
/// A name that does not hold a list yields no passes, as does an entry of
/// unsupported shape.
pub fn resolve_for_vars(for_vars: Option<&RawForVars>, registry: &VarRegistry) -> Vec<String> {
    match for_vars {
        None => vec![SINGLE_PASS.to_string()],
        Some(RawForVars::List(items)) => items.iter().map(ToString::to_string).collect(),
        Some(RawForVars::Name(name)) => match registry.lookup(name).and_then(|v| v.as_list()) {
            Some(items) => items.to_vec(),
            None => {
                tracing::debug!(variable = %name, "for-vars names a variable without a list value, nothing to iterate");
                Vec::new()
            }
        },
        Some(RawForVars::Unsupported(value)) => {
            let err = DexError::UnsupportedIteration { found: describe_value(value).to_string() };
            tracing::warn!("{err}");
            Vec::new()
        }
    }
}

fn report_unknown_placeholders(command: &Command, registry: &VarRegistry) {
    let templates = [&command.exec, &command.diag, &command.dir, &command.condition];

    for name in templates.into_iter().flat_map(|t| placeholders(t)) {
        if name != INDEX_VAR && name != ITER_VAR && registry.lookup(name).is_none() {
            tracing::debug!(variable = %name, "Undefined variable in command renders as empty text");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::v2::resolver::resolve_path;
    use crate::v2::schema::Scalar;
    use crate::v2::{parse_config, vars::ResolvedVar};

    fn raw(yaml: &str) -> RawCommand {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn shell_args() -> Vec<String> {
        vec!["-c".to_string()]
    }

    #[test]
    fn test_copies_fields_and_defaults_shell() {
        let command = normalize_command(
            &raw("exec: echo hi\ndiag: saying hi\ndir: /tmp\ncondition: 1 -eq 1\n"),
            "/bin/bash",
            &shell_args(),
            &VarRegistry::new(),
        );

        assert_eq!(
            command,
            Command {
                exec: "echo hi".to_string(),
                diag: "saying hi".to_string(),
                dir: "/tmp".to_string(),
                condition: "1 -eq 1".to_string(),
                shell: "/bin/bash".to_string(),
                shell_args: shell_args(),
                for_vars: vec![SINGLE_PASS.to_string()],
            }
        );
    }

    #[test]
    fn test_command_shell_override() {
        let command = normalize_command(
            &raw("exec: echo\nshell: /usr/bin/zsh\nshell_args: [-f, -c]\n"),
            "/bin/bash",
            &shell_args(),
            &VarRegistry::new(),
        );

        assert_eq!(command.shell, "/usr/bin/zsh");
        assert_eq!(command.shell_args, vec!["-f", "-c"]);
    }

    #[test]
    fn test_inline_for_vars() {
        let for_vars = RawForVars::List(vec![
            Scalar::Text("one".to_string()),
            Scalar::Integer(2),
            Scalar::Text("three".to_string()),
        ]);

        assert_eq!(resolve_for_vars(Some(&for_vars), &VarRegistry::new()), vec!["one", "2", "three"]);
    }

    #[test]
    fn test_named_for_vars() {
        let mut registry = VarRegistry::new();
        registry.insert("some_list", ResolvedVar::list(["four", "five", "six"]));
        registry.insert("some_string", ResolvedVar::scalar("foobar"));

        let named = |name: &str| RawForVars::Name(name.to_string());

        assert_eq!(resolve_for_vars(Some(&named("some_list")), &registry), vec!["four", "five", "six"]);
        assert!(resolve_for_vars(Some(&named("some_string")), &registry).is_empty());
        assert!(resolve_for_vars(Some(&named("missing")), &registry).is_empty());
    }

    #[test]
    fn test_unsupported_for_vars_runs_nothing() {
        let for_vars = RawForVars::Unsupported(serde_yaml::Value::Bool(true));
        assert!(resolve_for_vars(Some(&for_vars), &VarRegistry::new()).is_empty());
    }

    #[test]
    fn test_prepare_block_sees_block_variables() {
        let document = parse_config(
            r"
version: 2
vars:
  items: [a, b]
blocks:
  - name: loop
    desc: loop over block items
    dir: /tmp
    vars:
      items: [x, y, z]
    commands:
      - exec: echo [% var %]
        for-vars: items
",
        )
        .unwrap();

        let mut registry = VarRegistry::new();
        registry.resolve_all(&document.vars);

        let path = vec!["loop".to_string()];
        let resolved = resolve_path(&document, &path).unwrap();
        registry.resolve_all(&resolved.block.vars);

        let prepared = prepare_block(&resolved, &registry);

        assert_eq!(prepared.name, "loop");
        assert_eq!(prepared.dir, "/tmp");
        assert_eq!(prepared.commands[0].for_vars, vec!["x", "y", "z"]);
        assert_eq!(prepared.commands[0].shell, "/bin/bash");
    }
}
