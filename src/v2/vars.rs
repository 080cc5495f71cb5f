//! Variable registry and resolution.
//!
//! A [`VarRegistry`] is created per run, seeded from the document's global
//! variables, then extended by the selected block's variables. Block values
//! shadow globals for the rest of the run.

use std::collections::{BTreeMap, HashMap};

use super::schema::{describe_value, RawVar, VarControl};
use crate::core::{ExecContext, Executor, OutputStream};
use crate::error::DexError;

/// Name bound to the current iteration index while rendering.
pub const INDEX_VAR: &str = "index";

/// Name bound to the current iteration value while rendering.
pub const ITER_VAR: &str = "var";

/// The resolved value of a variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VarValue {
    /// No source produced a value; renders as empty text
    #[default]
    Undefined,

    /// A single string
    Scalar(String),

    /// A list, only usable through `for-vars`
    List(Vec<String>),
}

impl VarValue {
    /// Whether a value has been set.
    pub fn is_defined(&self) -> bool {
        !matches!(self, Self::Undefined)
    }

    /// The scalar value, if this is one.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::Undefined | Self::List(_) => None,
        }
    }

    /// The list value, if this is one.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            Self::Undefined | Self::Scalar(_) => None,
        }
    }
}

/// A resolved variable along with where its value could have come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedVar {
    /// Final value
    pub value: VarValue,

    /// Environment variable consulted, if any
    pub from_env: Option<String>,

    /// Shell snippet run, if any
    pub from_command: Option<String>,

    /// Declared fallback, if any
    pub default: Option<String>,
}

impl ResolvedVar {
    /// A literal scalar.
    pub fn scalar(value: impl Into<String>) -> Self {
        Self { value: VarValue::Scalar(value.into()), ..Self::default() }
    }

    /// A literal list.
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { value: VarValue::List(items.into_iter().map(Into::into).collect()), ..Self::default() }
    }
}

/// Read access to variables during rendering.
pub trait VarLookup {
    /// The value bound to `name`, if any.
    fn lookup(&self, name: &str) -> Option<&VarValue>;

    /// The scalar bound to `name`; lists and unknown names give `None`.
    fn scalar(&self, name: &str) -> Option<&str> {
        self.lookup(name).and_then(VarValue::as_scalar)
    }
}

/// Shell used to run `from-command` snippets.
#[derive(Debug, Clone)]
pub struct CommandShell {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for CommandShell {
    fn default() -> Self {
        Self {
            program: super::DEFAULT_SHELL.to_string(),
            args: super::DEFAULT_SHELL_ARGS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// The run's variables.
#[derive(Debug, Clone, Default)]
pub struct VarRegistry {
    vars: HashMap<String, ResolvedVar>,
    shell: CommandShell,
}

impl VarRegistry {
    /// Create an empty registry using the default shell for `from-command`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry that runs `from-command` snippets with `shell`.
    pub fn with_shell(shell: CommandShell) -> Self {
        Self { vars: HashMap::new(), shell }
    }

    /// Resolve a set of raw variables into the registry.
    ///
    /// Later calls overwrite names set by earlier ones. A variable of an
    /// unsupported shape is reported and skipped.
    pub fn resolve_all(&mut self, raw: &BTreeMap<String, RawVar>) {
        for (name, var) in raw {
            match self.resolve(var) {
                Some(resolved) => {
                    tracing::debug!(name = %name, value = ?resolved.value, "Resolved variable");
                    self.vars.insert(name.clone(), resolved);
                }
                None => {
                    let err = DexError::UnsupportedVariable { name: name.clone() };
                    tracing::warn!("{err}");
                }
            }
        }
    }

    /// Resolve a single raw variable. `None` means the shape is unsupported.
    pub fn resolve(&self, raw: &RawVar) -> Option<ResolvedVar> {
        match raw {
            RawVar::Integer(n) => Some(ResolvedVar::scalar(n.to_string())),
            RawVar::Scalar(s) => Some(ResolvedVar::scalar(s.clone())),
            RawVar::List(items) => Some(ResolvedVar::list(items.iter().map(ToString::to_string))),
            RawVar::Control(control) => Some(self.resolve_control(control)),
            RawVar::Unsupported(value) => {
                tracing::debug!(shape = describe_value(value), "Unsupported variable shape");
                None
            }
        }
    }

    /// Apply env, then command, then default. Each step may overwrite the last.
    fn resolve_control(&self, control: &VarControl) -> ResolvedVar {
        let mut resolved = ResolvedVar {
            value: VarValue::Undefined,
            from_env: control.from_env.clone(),
            from_command: control.from_command.clone(),
            default: control.default.as_ref().map(ToString::to_string),
        };

        if let Some(ref env_name) = control.from_env {
            match std::env::var(env_name) {
                Ok(value) if !value.is_empty() => resolved.value = VarValue::Scalar(value),
                _ => tracing::debug!(env = %env_name, "Environment variable unset or empty"),
            }
        }

        if let Some(ref snippet) = control.from_command {
            if let Some(value) = self.capture_command(snippet) {
                resolved.value = value;
            }
        }

        if !resolved.value.is_defined() {
            if let Some(default) = resolved.default.as_ref().filter(|d| !d.is_empty()) {
                resolved.value = VarValue::Scalar(default.clone());
            }
        }

        resolved
    }

    /// Run a snippet and turn its output into a value.
    ///
    /// A failing snippet produces no value.
    fn capture_command(&self, snippet: &str) -> Option<VarValue> {
        let (stdout, buffer) = OutputStream::capture();
        let ctx = ExecContext::new(&self.shell.program)
            .args(self.shell.args.iter().cloned())
            .args([snippet])
            .with_output(stdout, OutputStream::Inherit);

        let code = Executor::new().status(&ctx);
        if code != 0 {
            tracing::warn!(command = %snippet, code = code, "from-command failed, variable not set by it");
            return None;
        }

        let output = String::from_utf8_lossy(&buffer.lock()).into_owned();
        Some(value_from_output(&output))
    }

    /// Set a variable directly.
    pub fn insert(&mut self, name: impl Into<String>, var: ResolvedVar) {
        self.vars.insert(name.into(), var);
    }

    /// Full resolution record of a variable.
    pub fn get(&self, name: &str) -> Option<&ResolvedVar> {
        self.vars.get(name)
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether no variables are set.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Bind the iteration index and value on top of this registry.
    pub fn overlay(&self, index: usize, value: &str) -> Overlay<'_> {
        Overlay {
            base: self,
            index: VarValue::Scalar(index.to_string()),
            value: VarValue::Scalar(value.to_string()),
        }
    }
}

impl VarLookup for VarRegistry {
    fn lookup(&self, name: &str) -> Option<&VarValue> {
        self.vars.get(name).map(|v| &v.value)
    }
}

/// Turn captured output into a value: one trailing newline is dropped, and
/// more than one line makes a list. Empty output sets nothing.
pub fn value_from_output(output: &str) -> VarValue {
    let trimmed = output.strip_suffix('\n').unwrap_or(output);

    if trimmed.is_empty() {
        VarValue::Undefined
    } else if trimmed.contains('\n') {
        VarValue::List(trimmed.split('\n').map(ToString::to_string).collect())
    } else {
        VarValue::Scalar(trimmed.to_string())
    }
}

/// The registry plus the iteration bindings of one loop pass.
#[derive(Debug)]
pub struct Overlay<'a> {
    base: &'a VarRegistry,
    index: VarValue,
    value: VarValue,
}

impl VarLookup for Overlay<'_> {
    fn lookup(&self, name: &str) -> Option<&VarValue> {
        match name {
            INDEX_VAR => Some(&self.index),
            ITER_VAR => Some(&self.value),
            _ => self.base.lookup(name),
        }
    }
}
