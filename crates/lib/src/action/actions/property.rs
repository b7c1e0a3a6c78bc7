//! Property assignment action.

use async_trait::async_trait;

use crate::action::{Action, ActionOutcome};
use crate::context::BuildContext;
use crate::placeholder;

/// Set a build property, resolving placeholders in the value first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetPropertyAction {
  pub key: String,
  pub value: String,
}

impl SetPropertyAction {
  pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      value: value.into(),
    }
  }
}

#[async_trait]
impl Action for SetPropertyAction {
  async fn execute(&self, ctx: &BuildContext) -> ActionOutcome {
    let value = placeholder::substitute(&self.value, ctx)?;
    ctx.set(self.key.clone(), value);
    Ok(())
  }

  fn describe(&self) -> String {
    format!("set {} = {}", self.key, self.value)
  }
}
