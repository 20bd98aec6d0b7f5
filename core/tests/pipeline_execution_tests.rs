// tests/pipeline_execution_tests.rs
mod common;

use common::*;
use storeflow::{ContextData, FlowError, Pipeline, PipelineControl, PipelineResult};

#[tokio::test]
async fn test_pipeline_runs_steps_in_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("step1", false), ("step2", false), ("step3", false)]);

  pipeline.on_root("step1", create_simple_handler("step1", " S1"));
  pipeline.on_root("step2", create_simple_handler("step2", " S2"));
  pipeline.on_root_boxed("step3", create_simple_handler("step3", " S3"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.message, " S1 S2 S3");
  assert_eq!(guard.steps_executed, vec!["step1", "step2", "step3"]);
}

#[tokio::test]
async fn test_before_on_after_run_in_phase_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("only", false)]);

  pipeline.after_root("only", create_simple_handler("after", "a"));
  pipeline.on_root("only", create_simple_handler("on", "o"));
  pipeline.before_root("only", create_simple_handler("before", "b"));

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().message, "boa");
}

#[tokio::test]
async fn test_handlers_run_inside_their_step_span() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("traced", false)]);
  pipeline.on_root("traced", |ctx: ContextData<TestContext>| async move {
    let current = tracing::Span::current();
    let span_name = current.metadata().map(|meta| meta.name()).unwrap_or("none");
    let has_step_name = current
      .metadata()
      .map_or(false, |meta| meta.fields().field("step_name").is_some());
    let mut guard = ctx.write();
    guard.message.push_str(span_name);
    if has_step_name {
      guard.steps_executed.push("traced".to_string());
    }
    Ok::<_, TestError>(PipelineControl::Continue)
  });

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  let guard = ctx.read();
  assert_eq!(guard.message, "pipeline_step");
  assert_eq!(guard.steps_executed, vec!["traced"]);
}

#[tokio::test]
async fn test_pipeline_stops_on_pipeline_control_stop() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("stepA", false), ("stopStep", false), ("stepC", false)]);

  pipeline.on_root("stepA", create_simple_handler("stepA", "A"));
  pipeline.on_root("stopStep", |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push("stopStep".to_string());
      Ok::<PipelineControl, FlowError>(PipelineControl::Stop)
    })
  });
  pipeline.on_root("stepC", create_simple_handler("stepC", "C"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Stopped);
  let guard = ctx.read();
  assert_eq!(guard.counter, 1);
  assert_eq!(guard.steps_executed, vec!["stepA", "stopStep"]);
}

#[tokio::test]
async fn test_stop_in_before_phase_skips_on_handlers() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("guarded", false)]);
  pipeline.before_root("guarded", create_simple_handler("guard", "G"));
  pipeline.on_root("guarded", create_simple_handler("body", "B"));

  let ctx = ContextData::new(TestContext {
    should_stop_at: Some("guard".to_string()),
    ..Default::default()
  });
  let result = pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(result, PipelineResult::Stopped);
  assert_eq!(ctx.read().message, "G");
}

#[tokio::test]
async fn test_pipeline_propagates_handler_error() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<TestContext, TestError>::new(&[("good_step", false), ("bad_step", false), ("another_step", false)]);

  pipeline.on_root("good_step", create_simple_handler("good_step", "Good"));
  pipeline.on_root("bad_step", create_failing_handler("bad_step", "I am a bad step!"));
  pipeline.on_root("another_step", create_simple_handler("another_step", "NeverRun"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap_err(), TestError::Handler("I am a bad step!".to_string()));
  let guard = ctx.read();
  assert_eq!(guard.message, "Good");
  assert_eq!(guard.steps_executed, vec!["good_step", "bad_step"]);
}

#[tokio::test]
async fn test_optional_step_without_handlers_is_skipped() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("first", false), ("maybe", true), ("last", false)]);
  pipeline.on_root("first", create_simple_handler("first", "1"));
  pipeline.on_root("last", create_simple_handler("last", "3"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(result, PipelineResult::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["first", "last"]);
}

#[tokio::test]
async fn test_inserted_step_runs_in_position_and_removed_step_does_not() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("a", false), ("c", false), ("d", false)]);
  pipeline.insert_step_after("a", "b", false).unwrap();
  pipeline.remove_step("d").unwrap();
  assert_eq!(pipeline.step_names(), vec!["a", "b", "c"]);

  pipeline.on_root("a", create_simple_handler("a", "a"));
  pipeline.on_root("b", create_simple_handler("b", "b"));
  pipeline.on_root("c", create_simple_handler("c", "c"));

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().message, "abc");
}

#[test]
fn test_structural_edits_reject_unknown_and_duplicate_steps() {
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("a", false)]);
  assert!(matches!(
    pipeline.remove_step("missing"),
    Err(FlowError::StepNotFound { .. })
  ));
  assert!(matches!(
    pipeline.insert_step_after("missing", "x", false),
    Err(FlowError::StepNotFound { .. })
  ));
  assert!(matches!(
    pipeline.insert_step_after("a", "a", false),
    Err(FlowError::Internal(_))
  ));
}

#[test]
#[should_panic(expected = "not found in pipeline definition")]
fn test_registering_handler_for_unknown_step_panics() {
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("a", false)]);
  pipeline.on_root("nope", create_simple_handler("nope", ""));
}
