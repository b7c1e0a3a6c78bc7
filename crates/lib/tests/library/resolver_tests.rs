use std::collections::HashSet;

use tgraph_lib::execute::{DependencyResolver, ExecuteError, TargetGraph};
use tgraph_lib::target::TargetRegistry;

use super::common::GraphBuilder;

fn registry(edges: &[(&str, &[&str])]) -> TargetRegistry {
  let mut registry = TargetRegistry::new();
  for (name, deps) in edges {
    registry.add_target(*name).unwrap().depends_on(deps.iter().copied());
  }
  registry
}

/// Every dependency strictly precedes its dependents and no name repeats.
fn assert_valid_order(registry: &TargetRegistry, order: &[String]) {
  let unique: HashSet<&String> = order.iter().collect();
  assert_eq!(unique.len(), order.len(), "order repeats a name: {order:?}");

  for (pos, name) in order.iter().enumerate() {
    for dep in registry.get(name).unwrap().dependencies() {
      let dep_pos = order.iter().position(|n| n == dep).unwrap();
      assert!(dep_pos < pos, "{dep} must precede {name} in {order:?}");
    }
  }
}

#[test]
fn acyclic_graphs_resolve_to_valid_orders() {
  let single: &[(&str, &[&str])] = &[("a", &[])];
  let chain: &[(&str, &[&str])] = &[("c", &["b"]), ("b", &["a"]), ("a", &[])];
  let diamond: &[(&str, &[&str])] = &[("a", &[]), ("b", &["a"]), ("c", &["a"]), ("d", &["b", "c"])];
  let pipeline: &[(&str, &[&str])] = &[
    ("clean", &[]),
    ("restore", &["clean"]),
    ("compile", &["restore", "clean"]),
    ("unit", &["compile"]),
    ("integration", &["compile", "restore"]),
    ("pack", &["unit", "integration", "clean"]),
  ];

  for edges in [single, chain, diamond, pipeline] {
    let registry = registry(edges);
    let resolver = DependencyResolver::new(&registry);
    for (name, _) in edges {
      let order = resolver.resolve(name).unwrap();
      assert_eq!(order.last().map(String::as_str), Some(*name));
      assert_valid_order(&registry, &order);
    }
  }
}

#[test]
fn first_discovery_wins_for_shared_dependencies() {
  let registry = registry(&[
    ("clean", &[]),
    ("restore", &["clean"]),
    ("compile", &["restore", "clean"]),
    ("pack", &["compile", "clean"]),
  ]);

  let order = DependencyResolver::new(&registry).resolve("pack").unwrap();

  assert_eq!(order, vec!["clean", "restore", "compile", "pack"]);
}

#[test]
fn dependencies_may_be_declared_before_registration() {
  let mut registry = TargetRegistry::new();
  registry.add_target("deploy").unwrap().depends_on(["package"]);
  registry.add_target("package").unwrap();

  let order = DependencyResolver::new(&registry).resolve("deploy").unwrap();

  assert_eq!(order, vec!["package", "deploy"]);
}

#[tokio::test]
async fn cycle_fails_for_every_member_without_running_actions() {
  let (scheduler, recorder) = GraphBuilder::new()
    .target("A", &["B"])
    .target("B", &["C"])
    .target("C", &["A"])
    .build();

  for name in ["A", "B", "C"] {
    for parallel in [false, true] {
      let result = scheduler.run(&[name], parallel).await;

      assert!(!result.succeeded);
      assert!(matches!(
        result.failure(),
        Some(ExecuteError::CyclicDependency { target, .. }) if target == name
      ));
      assert!(result.executed_order.is_empty());
    }
  }

  assert!(recorder.log().is_empty());
}

#[tokio::test]
async fn cycle_in_one_request_aborts_the_whole_run() {
  let (scheduler, recorder) = GraphBuilder::new()
    .target("ok", &[])
    .target("A", &["B"])
    .target("B", &["A"])
    .build();

  let result = scheduler.run(&["ok", "A"], false).await;

  assert!(!result.succeeded);
  assert!(recorder.log().is_empty());
}

#[tokio::test]
async fn unknown_dependency_surfaces_at_run_time() {
  let (scheduler, recorder) = GraphBuilder::new().target("deploy", &["package"]).build();

  let result = scheduler.run(&["deploy"], false).await;

  assert_eq!(
    result.failure(),
    Some(&ExecuteError::TargetNotFound {
      names: vec!["package".to_string()]
    })
  );
  assert!(recorder.log().is_empty());
}

#[test]
fn whole_registry_check_matches_resolver() {
  let registry = registry(&[("a", &[]), ("b", &["a"]), ("c", &["a"]), ("d", &["b", "c"])]);
  let graph = TargetGraph::from_registry(&registry).unwrap();

  assert_valid_order(&registry, &graph.topological_order());
}
