//! Run lifecycle hooks.
//!
//! A [`RunHooks`] implementation is notified at fixed points of every
//! [`Scheduler`](super::Scheduler) run:
//!
//! | Hook                  | When                                                   |
//! |-----------------------|--------------------------------------------------------|
//! | `before_build`        | before the requested names are validated               |
//! | `before_execution`    | after resolution, before the first action runs         |
//! | `after_execution`     | after every unit finished, only if none failed         |
//! | `on_build_failed`     | once, with every failure, if the run failed            |
//! | `after_build`         | last, with the final result, whether or not it failed  |

use async_trait::async_trait;

use crate::context::BuildContext;

use super::types::{ExecuteError, RunResult};

/// Callbacks around a run. Every method defaults to doing nothing.
#[async_trait]
pub trait RunHooks: Send + Sync {
  async fn before_build(&self, _ctx: &BuildContext) {}

  async fn before_execution(&self, _ctx: &BuildContext, _requested: &[String]) {}

  async fn after_execution(&self, _ctx: &BuildContext) {}

  async fn on_build_failed(&self, _ctx: &BuildContext, _failures: &[ExecuteError]) {}

  async fn after_build(&self, _ctx: &BuildContext, _result: &RunResult) {}
}

/// Hooks that do nothing.
pub struct NoHooks;

impl RunHooks for NoHooks {}
