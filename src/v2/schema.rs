//! Version 2 dex file schema.
//!
//! These types mirror the YAML as written. Loosely typed entries (variables
//! and `for-vars`) decode into closed enums here and are turned into strict
//! structures later, once the variable state they depend on exists.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::MenuEntry;

/// A version 2 dex file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Dialect version, must be 2
    #[serde(default)]
    pub version: u32,

    /// Global variables
    #[serde(default)]
    pub vars: BTreeMap<String, RawVar>,

    /// Top-level blocks, in menu order
    #[serde(default)]
    pub blocks: Vec<Block>,

    /// Default shell program
    #[serde(default)]
    pub shell: String,

    /// Default shell arguments, placed before the command text
    #[serde(default, alias = "shellArgs")]
    pub shell_args: Vec<String>,
}

/// A named node in the block tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Name used to select the block
    pub name: String,

    /// Menu description
    #[serde(default)]
    pub desc: String,

    /// Block variables, applied after the globals
    #[serde(default)]
    pub vars: BTreeMap<String, RawVar>,

    /// Working directory template (empty inherits)
    #[serde(default)]
    pub dir: String,

    /// Shell override (empty inherits)
    #[serde(default)]
    pub shell: String,

    /// Shell argument override (empty inherits)
    #[serde(default, alias = "shellArgs")]
    pub shell_args: Vec<String>,

    /// Commands as written
    #[serde(default)]
    pub commands: Vec<RawCommand>,

    /// Nested blocks
    #[serde(default)]
    pub children: Vec<Block>,
}

impl MenuEntry for Block {
    fn name(&self) -> &str {
        &self.name
    }

    fn desc(&self) -> &str {
        &self.desc
    }

    fn children(&self) -> &[Self] {
        &self.children
    }
}

/// A command entry as written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,

    #[serde(default, alias = "shellArgs", skip_serializing_if = "Option::is_none")]
    pub shell_args: Option<Vec<String>>,

    #[serde(default, rename = "for-vars", alias = "for_vars", skip_serializing_if = "Option::is_none")]
    pub for_vars: Option<RawForVars>,
}

/// A plain YAML scalar usable as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A variable entry as written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawVar {
    /// `name: 3`
    Integer(i64),

    /// `name: text`
    Scalar(String),

    /// `name: [a, b]`
    List(Vec<Scalar>),

    /// `name: { from-env: .., from-command: .., default: .. }`
    Control(VarControl),

    /// Anything else; reported and left unset
    Unsupported(serde_yaml::Value),
}

/// Where a control-object variable gets its value from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarControl {
    /// Environment variable to read
    #[serde(default, rename = "from-env", alias = "from_env", alias = "fromEnv")]
    pub from_env: Option<String>,

    /// Shell snippet whose standard output becomes the value
    #[serde(default, rename = "from-command", alias = "from_command", alias = "fromCommand")]
    pub from_command: Option<String>,

    /// Fallback when nothing else produced a value
    #[serde(default)]
    pub default: Option<Scalar>,
}

/// A `for-vars` entry as written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawForVars {
    /// Inline values
    List(Vec<Scalar>),

    /// Name of a list variable
    Name(String),

    /// Anything else; reported and treated as no iterations
    Unsupported(serde_yaml::Value),
}

/// Short description of a YAML value's shape, for diagnostics.
pub(crate) fn describe_value(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "boolean",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "sequence",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged value",
    }
}
