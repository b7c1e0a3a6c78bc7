//! tgraph-lib: target dependency graph and execution engine
//!
//! This crate provides the core of tgraph:
//! - `Target` / `TargetRegistry`: named units of work and their dependencies
//! - `Action`: the single capability every unit of work adapts to
//! - `DependencyResolver`: execution order for a requested target
//! - `Scheduler`: sequential or concurrent runs with exactly-once execution
//! - `BuildFile`: JSON declaration of targets for the `tg` CLI

pub mod action;
pub mod buildfile;
pub mod context;
pub mod execute;
pub mod placeholder;
pub mod target;
