//! Dependency resolution for requested targets.
//!
//! The resolver turns one requested target name into the linear sequence of
//! target names to execute: every dependency precedes its dependents, each
//! name appears once (first discovery wins) and the requested target is last.
//! Dependency names are only checked here, never at declaration time.

use std::collections::HashMap;

use tracing::debug;

use crate::target::{Target, TargetRegistry};

use super::types::{ExecuteError, TargetState};

/// Depth-first resolver over a [`TargetRegistry`].
pub struct DependencyResolver<'a> {
  registry: &'a TargetRegistry,
}

impl<'a> DependencyResolver<'a> {
  pub fn new(registry: &'a TargetRegistry) -> Self {
    Self { registry }
  }

  /// Resolve the execution order for a single requested target.
  ///
  /// # Errors
  ///
  /// - `TargetNotFound` if the target or any transitive dependency is not registered.
  /// - `CyclicDependency` if the dependency relation reachable from `name` has a cycle.
  pub fn resolve(&self, name: &str) -> Result<Vec<String>, ExecuteError> {
    let mut walk = Walk::default();
    walk.enter(self.registry, name)?;

    // Explicit stack so deep chains cannot exhaust the thread's stack
    while let Some(frame) = walk.stack.last_mut() {
      let target = frame.target;
      match target.dependencies().get(frame.next) {
        Some(dep) => {
          frame.next += 1;
          walk.enter(self.registry, dep)?;
        }
        None => walk.leave(),
      }
    }

    debug!(target_name = %name, order = ?walk.order, "resolved execution order");
    Ok(walk.order)
  }

  /// Resolve every requested target, failing on the first resolution error.
  ///
  /// Each sequence is resolved independently, so names shared between
  /// requests appear in more than one sequence.
  pub fn resolve_all<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Vec<String>>, ExecuteError> {
    names.iter().map(|name| self.resolve(name.as_ref())).collect()
  }
}

/// A target whose dependencies are being expanded, and the next one to visit.
struct Frame<'a> {
  target: &'a Target,
  next: usize,
}

#[derive(Default)]
struct Walk<'a> {
  stack: Vec<Frame<'a>>,
  marks: HashMap<&'a str, TargetState>,
  order: Vec<String>,
}

impl<'a> Walk<'a> {
  /// Start expanding `name` unless it is already resolved.
  fn enter(&mut self, registry: &'a TargetRegistry, name: &str) -> Result<(), ExecuteError> {
    match self.marks.get(name) {
      Some(TargetState::Resolving) => {
        // Reached a target whose own expansion is still in progress
        let pos = self.stack.iter().position(|f| f.target.name() == name).unwrap_or(0);
        let mut path: Vec<String> = self.stack[pos..].iter().map(|f| f.target.name().to_string()).collect();
        path.push(name.to_string());
        return Err(ExecuteError::CyclicDependency {
          target: name.to_string(),
          path,
        });
      }
      Some(_) => return Ok(()),
      None => {}
    }

    let target = registry.get(name).ok_or_else(|| ExecuteError::TargetNotFound {
      names: vec![name.to_string()],
    })?;

    self.marks.insert(target.name(), TargetState::Resolving);
    self.stack.push(Frame { target, next: 0 });
    Ok(())
  }

  /// Finish the target on top of the stack once its dependencies are ordered.
  fn leave(&mut self) {
    if let Some(frame) = self.stack.pop() {
      let name = frame.target.name();
      // Ordered, now waiting to run
      self.marks.insert(name, TargetState::Pending);
      self.order.push(name.to_string());
    }
  }
}
