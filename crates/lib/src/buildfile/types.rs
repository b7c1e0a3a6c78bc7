use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::action::{Action, CmdAction, SetPropertyAction};

/// A build file: properties, default targets and target declarations.
///
/// ```json
/// {
///   "default_targets": ["test"],
///   "properties": { "configuration": "Release" },
///   "targets": [
///     { "name": "compile", "actions": [{ "type": "cmd", "cmd": "cargo build" }] },
///     { "name": "test", "depends_on": ["compile"], "actions": [{ "type": "cmd", "cmd": "cargo test" }] }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildFile {
  #[serde(default)]
  pub default_targets: Vec<String>,
  #[serde(default)]
  pub properties: BTreeMap<String, String>,
  #[serde(default)]
  pub targets: Vec<TargetDef>,
}

/// One declared target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetDef {
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub hidden: bool,
  #[serde(default)]
  pub depends_on: Vec<String>,
  #[serde(default)]
  pub actions: Vec<ActionDef>,
}

/// Serialized form of a built-in action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionDef {
  Cmd {
    cmd: String,
    #[serde(default)]
    env: Option<BTreeMap<String, String>>,
    #[serde(default)]
    cwd: Option<String>,
    #[serde(default)]
    capture: Option<String>,
  },
  SetProperty {
    key: String,
    value: String,
  },
}

impl ActionDef {
  pub fn to_action(&self) -> Arc<dyn Action> {
    match self {
      ActionDef::Cmd { cmd, env, cwd, capture } => Arc::new(CmdAction {
        cmd: cmd.clone(),
        env: env.clone(),
        cwd: cwd.clone(),
        capture: capture.clone(),
      }),
      ActionDef::SetProperty { key, value } => Arc::new(SetPropertyAction::new(key.clone(), value.clone())),
    }
  }
}
