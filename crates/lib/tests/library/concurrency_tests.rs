use tgraph_lib::execute::{ExecuteConfig, ExecuteError};

use super::common::{GraphBuilder, shared_dependency_graph};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_shared_dependency_scenario() {
  let (scheduler, recorder) = GraphBuilder::new()
    .slow("A", &[], 50)
    .target("B", &["A"])
    .target("C", &["A"])
    .build();

  let result = scheduler.run(&["B", "C"], true).await;

  assert!(result.succeeded, "{:?}", result.failures);
  assert_eq!(recorder.count("A"), 1);
  assert_eq!(recorder.count("B"), 1);
  assert_eq!(recorder.count("C"), 1);
  assert_eq!(result.dependency_executions, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shared_dependency_finishes_before_both_dependents() {
  let (scheduler, recorder) = GraphBuilder::new()
    .slow("D", &[], 50)
    .target("B", &["D"])
    .target("C", &["D"])
    .build();

  let result = scheduler.run(&["B", "C"], true).await;

  assert!(result.succeeded, "{:?}", result.failures);
  let d = recorder.position("D").unwrap();
  assert!(d < recorder.position("B").unwrap());
  assert!(d < recorder.position("C").unwrap());

  let summary = &result.summary;
  let d_finished = summary.entry("D").unwrap().finished_at;
  assert!(d_finished <= summary.entry("B").unwrap().started_at);
  assert!(d_finished <= summary.entry("C").unwrap().started_at);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_units_share_one_dependency() {
  let mut builder = GraphBuilder::new().slow("restore", &[], 20);
  let names: Vec<String> = (0..12).map(|i| format!("project{i}")).collect();
  for name in &names {
    builder = builder.target(name, &["restore"]);
  }
  let (scheduler, recorder) = builder.build();

  let result = scheduler.run(&names, true).await;

  assert!(result.succeeded, "{:?}", result.failures);
  assert_eq!(recorder.count("restore"), 1);
  assert_eq!(recorder.log().len(), 13);
  assert_eq!(result.dependency_executions, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failing_unit_does_not_cancel_siblings() {
  let (scheduler, recorder) = GraphBuilder::new()
    .failing("lint", &[])
    .slow("test", &[], 50)
    .build();

  let result = scheduler.run(&["lint", "test"], true).await;

  assert!(!result.succeeded);
  assert_eq!(recorder.count("test"), 1);
  assert_eq!(result.failures.len(), 1);
  assert!(matches!(
    &result.failures[0],
    ExecuteError::ActionFailed { target, .. } if target == "lint"
  ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_unit_failure_is_collected() {
  let (scheduler, _) = GraphBuilder::new()
    .failing("lint", &[])
    .failing("audit", &[])
    .target("docs", &[])
    .build();

  let result = scheduler.run(&["lint", "audit", "docs"], true).await;

  assert!(!result.succeeded);
  let mut failed: Vec<String> = result
    .failures
    .iter()
    .map(|e| match e {
      ExecuteError::ActionFailed { target, .. } => target.clone(),
      other => panic!("unexpected failure {other:?}"),
    })
    .collect();
  failed.sort();
  assert_eq!(failed, vec!["audit", "lint"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shared_dependency_failure_stops_both_dependents() {
  let (scheduler, recorder) = GraphBuilder::new()
    .slow_failing("A", &[], 50)
    .target("B", &["A"])
    .target("C", &["A"])
    .build();

  let result = scheduler.run(&["B", "C"], true).await;

  assert!(!result.succeeded);
  assert_eq!(recorder.log(), vec!["A"]);
  assert_eq!(result.failures.len(), 2);
  assert!(
    result
      .failures
      .iter()
      .any(|e| matches!(e, ExecuteError::ActionFailed { target, .. } if target == "A"))
  );
  assert!(result.failures.iter().any(|e| matches!(
    e,
    ExecuteError::DependencyFailed { dependency, .. } if dependency == "A"
  )));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_diamond_with_three_requests() {
  let (scheduler, recorder) = GraphBuilder::new()
    .slow("a", &[], 20)
    .slow("b", &["a"], 10)
    .target("c", &["a"])
    .target("d", &["b", "c"])
    .build();

  let result = scheduler.run(&["b", "c", "d"], true).await;

  assert!(result.succeeded, "{:?}", result.failures);
  assert!(recorder.counts().values().all(|&n| n == 1));
  assert_eq!(recorder.log().len(), 4);
  assert_eq!(recorder.log().last().map(String::as_str), Some("d"));
}

#[tokio::test]
async fn bounded_pool_of_one_still_completes() {
  let config = ExecuteConfig {
    parallelism: 1,
    ..ExecuteConfig::default()
  };
  let (scheduler, recorder) = shared_dependency_graph().build_with(config);

  let result = scheduler.run(&["B", "C"], true).await;

  assert!(result.succeeded, "{:?}", result.failures);
  assert_eq!(recorder.count("A"), 1);
}

#[tokio::test]
async fn single_requested_target_runs_sequentially() {
  let (scheduler, recorder) = shared_dependency_graph().build();

  let result = scheduler.run(&["C"], true).await;

  assert!(result.succeeded);
  assert_eq!(recorder.log(), vec!["A", "C"]);
}
