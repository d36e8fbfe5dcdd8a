//! Integration tests for the orchestration client.
//!
//! The engine is replaced by the mock runner; every test checks which
//! engine commands ran and what the driver printed.

use std::path::Path;
use std::sync::Arc;

use pilot_iac::{
    programs, AutomationError, Lifecycle, LifecycleOutcome, LocalWorkspace, Mode, ProgramContext,
    ProjectSettings, Stack, WorkspaceOptions,
};
use pilot_runner::{CaptureSink, MockResponse, MockRunner};

const HISTORY_WITH_CHANGES: &str =
    r#"[{"version":2,"kind":"update","result":"succeeded","resourceChanges":{"create":5}}]"#;
const HISTORY_NO_CHANGES: &str =
    r#"[{"version":3,"kind":"update","result":"succeeded","resourceChanges":{}}]"#;
const WEBSITE_OUTPUTS: &str =
    r#"{"website_url":"http://s3-website-bucket-1234.s3-website-us-west-2.amazonaws.com"}"#;

fn get_website_project_path() -> String {
    let candidates = ["projects/website", "../projects/website", "../../projects/website"];

    for candidate in candidates {
        if Path::new(candidate).exists() {
            return candidate.to_string();
        }
    }

    "projects/website".to_string()
}

fn website_mock(history: &str) -> Arc<MockRunner> {
    Arc::new(
        MockRunner::new()
            .on(&["refresh"], MockResponse::success("Refreshing (dev)"))
            .on(&["up"], MockResponse::success("Updating (dev)\n + 5 created"))
            .on(&["destroy"], MockResponse::success("Destroying (dev)\n - 5 deleted"))
            .on(&["stack", "history"], MockResponse::success(history))
            .on(&["stack", "output", "--json"], MockResponse::success(WEBSITE_OUTPUTS))
            .on(
                &["stack", "output", "--json", "--show-secrets"],
                MockResponse::success(WEBSITE_OUTPUTS),
            ),
    )
}

async fn website_stack(mock: &Arc<MockRunner>) -> Stack {
    LocalWorkspace::create_or_select_stack(
        programs::website::PROJECT_NAME,
        "dev",
        programs::website::declare,
        WorkspaceOptions::new(mock.clone()),
    )
    .await
    .unwrap()
}

fn website_lifecycle(mode: Mode) -> Lifecycle {
    Lifecycle::new(mode)
        .plugin(programs::AWS_PLUGIN)
        .config("aws:region", programs::DEFAULT_REGION)
        .output_label("website_url", "Website URL")
}

#[tokio::test]
async fn test_update_path_refreshes_first_and_prints_url() {
    let mock = website_mock(HISTORY_WITH_CHANGES);
    let stack = website_stack(&mock).await;
    let sink = CaptureSink::new();
    let mut out: Vec<u8> = Vec::new();

    let outcome = website_lifecycle(Mode::from_args(Vec::<String>::new()))
        .run(&stack, &sink, &mut out)
        .await
        .unwrap();

    let refresh = mock.position(&["refresh"]).unwrap();
    let up = mock.position(&["up"]).unwrap();
    assert!(refresh < up);
    assert!(!mock.was_called(&["destroy"]));
    assert!(mock.was_called(&["plugin", "install", "resource", "aws", "v6.68.0"]));
    assert!(mock.was_called(&["config", "set", "--stack", "dev", "aws:region", "us-west-2"]));

    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("update summary:\n    create: 5\n"));
    assert!(printed.contains(
        "Website URL: http://s3-website-bucket-1234.s3-website-us-west-2.amazonaws.com"
    ));
    assert!(sink.contains("Updating (dev)"));
    assert!(sink.contains("Refreshing (dev)"));

    let result = outcome.up_result().unwrap();
    assert!(result.outputs["website_url"]
        .as_str()
        .unwrap()
        .starts_with("http://"));
}

#[tokio::test]
async fn test_destroy_path_never_updates_or_prints_outputs() {
    let mock = website_mock(HISTORY_WITH_CHANGES);
    let stack = website_stack(&mock).await;
    let mut out: Vec<u8> = Vec::new();

    let outcome = website_lifecycle(Mode::from_args(["destroy"]))
        .run(&stack, &CaptureSink::new(), &mut out)
        .await
        .unwrap();

    assert!(matches!(outcome, LifecycleOutcome::Destroyed(_)));
    assert!(mock.position(&["refresh"]).unwrap() < mock.position(&["destroy"]).unwrap());
    assert!(!mock.was_called(&["up"]));
    assert!(!mock.was_called(&["stack", "output"]));

    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("stack destroy complete"));
    assert!(!printed.contains("update summary:"));
    assert!(!printed.contains("Website URL"));
}

#[tokio::test]
async fn test_summary_skipped_without_changes() {
    let mock = website_mock(HISTORY_NO_CHANGES);
    let stack = website_stack(&mock).await;
    let mut out: Vec<u8> = Vec::new();

    website_lifecycle(Mode::Up)
        .run(&stack, &CaptureSink::new(), &mut out)
        .await
        .unwrap();

    let printed = String::from_utf8(out).unwrap();
    assert!(!printed.contains("update summary:"));
    assert!(printed.contains("Website URL: http://"));
}

#[tokio::test]
async fn test_typo_action_updates() {
    let mock = website_mock(HISTORY_NO_CHANGES);
    let stack = website_stack(&mock).await;

    website_lifecycle(Mode::from_args(["destory"]))
        .run(&stack, &CaptureSink::new(), &mut Vec::<u8>::new())
        .await
        .unwrap();

    assert!(mock.was_called(&["up"]));
    assert!(!mock.was_called(&["destroy"]));
}

#[tokio::test]
async fn test_refresh_failure_stops_lifecycle() {
    let mock = Arc::new(
        MockRunner::new().on(&["refresh"], MockResponse::failure(255, "error: no credentials")),
    );
    let stack = website_stack(&mock).await;

    let err = website_lifecycle(Mode::Up)
        .run(&stack, &CaptureSink::new(), &mut Vec::<u8>::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AutomationError::CommandFailed { ref operation, .. } if operation == "refresh"));
    assert!(!mock.was_called(&["up"]));
}

#[tokio::test]
async fn test_missing_labeled_output() {
    let mock = Arc::new(
        MockRunner::new().on(&["stack", "history"], MockResponse::success(HISTORY_NO_CHANGES)),
    );
    let stack = website_stack(&mock).await;

    let err = website_lifecycle(Mode::Up)
        .run(&stack, &CaptureSink::new(), &mut Vec::<u8>::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AutomationError::MissingOutput(ref key) if key == "website_url"));
}

#[tokio::test]
async fn test_local_program_skips_plugins() {
    let mock = website_mock(HISTORY_NO_CHANGES);
    let stack = LocalWorkspace::create_or_select_stack_local(
        "dev",
        get_website_project_path(),
        WorkspaceOptions::new(mock.clone()),
    )
    .await
    .unwrap();

    Lifecycle::new(Mode::Up)
        .config("aws:region", programs::DEFAULT_REGION)
        .output_label("website_url", "Website URL")
        .run(&stack, &CaptureSink::new(), &mut Vec::<u8>::new())
        .await
        .unwrap();

    assert!(!mock.was_called(&["plugin"]));
    let select = &mock.get_matching_calls(&["stack", "select"])[0];
    assert!(select
        .workdir
        .as_deref()
        .unwrap()
        .ends_with("projects/website"));
}

#[test]
fn test_local_project_matches_inline_website() {
    let dir = get_website_project_path();
    let settings = ProjectSettings::load(Path::new(&dir)).unwrap();
    assert_eq!(settings.runtime_name(), Some("yaml"));

    let content = std::fs::read_to_string(Path::new(&dir).join(pilot_iac::PROJECT_FILE)).unwrap();
    let local: serde_yaml::Value = serde_yaml::from_str(&content).unwrap();

    let mut ctx = ProgramContext::new(programs::website::PROJECT_NAME);
    programs::website::declare(&mut ctx);
    let inline = ctx.to_document().unwrap();

    assert_eq!(local["resources"], inline["resources"]);
    assert_eq!(local["outputs"], inline["outputs"]);
}
