//! Integration tests for the command-session state machine
//!
//! Drives a session against a scripted mock backend so every path through
//! the state machine is deterministic: completion detection, exit-code
//! parsing, timeout-then-resume, interactive input, interrupts, and
//! contract-violation rejections.

mod support;

use std::time::Duration;

use shellbridge::{Error, ExecuteOptions, ExecutionStatus};
use support::{test_registry, Program};

fn quick(timeout_ms: u64) -> ExecuteOptions {
    ExecuteOptions::default().with_timeout(Duration::from_millis(timeout_ms))
}

#[tokio::test]
async fn test_empty_execute_on_fresh_session() {
    let (registry, _backend) = test_registry();

    let result = registry.execute("s1", "", quick(1000)).await.unwrap();
    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.exit_code, Some(0));
    assert_eq!(result.output, "");
}

#[tokio::test]
async fn test_echo_output_is_clean() {
    let (registry, backend) = test_registry();
    backend.program("echo hello", Program::instant("hello", 0));

    let result = registry.execute("s1", "echo hello", quick(1000)).await.unwrap();
    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.exit_code, Some(0));
    // No echoed command line, no prompt fragments
    assert_eq!(result.output, "hello");
}

#[tokio::test]
async fn test_exit_codes_reflect_shell_status() {
    let (registry, backend) = test_registry();
    backend.program("true", Program::instant("", 0));
    backend.program("false", Program::instant("", 1));

    let result = registry.execute("s1", "true", quick(1000)).await.unwrap();
    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.exit_code, Some(0));

    let result = registry.execute("s1", "false", quick(1000)).await.unwrap();
    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.exit_code, Some(1));
    assert_eq!(result.output, "");
}

#[tokio::test]
async fn test_consecutive_commands_do_not_leak_output() {
    let (registry, backend) = test_registry();
    backend.program("echo first", Program::instant("first", 0));
    backend.program("echo second", Program::instant("second", 0));

    let first = registry.execute("s1", "echo first", quick(1000)).await.unwrap();
    assert_eq!(first.output, "first");

    // History is cleared between commands, so nothing carries over
    let second = registry.execute("s1", "echo second", quick(1000)).await.unwrap();
    assert_eq!(second.output, "second");
}

#[tokio::test]
async fn test_timeout_returns_running_then_resume_completes() {
    let (registry, backend) = test_registry();
    backend.program("sleep 5", Program::slow(40));

    let result = registry.execute("s1", "sleep 5", quick(100)).await.unwrap();
    assert_eq!(result.status, ExecutionStatus::Running);
    assert_eq!(result.exit_code, None);
    assert!(result.output.contains("still running"));

    // Empty execute resumes waiting on the same command
    let result = registry.execute("s1", "", quick(5000)).await.unwrap();
    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.exit_code, Some(0));
}

#[tokio::test]
async fn test_second_command_rejected_while_running() {
    let (registry, backend) = test_registry();
    backend.program("sleep 99", Program::slow(1_000_000));
    backend.program("echo hi", Program::instant("hi", 0));

    let result = registry.execute("s1", "sleep 99", quick(50)).await.unwrap();
    assert_eq!(result.status, ExecutionStatus::Running);

    let rejected = registry.execute("s1", "echo hi", quick(1000)).await.unwrap();
    assert_eq!(rejected.status, ExecutionStatus::Error);
    assert_eq!(rejected.exit_code, None);
    assert!(rejected.output.contains("already running"));

    // The rejection did not disturb the outstanding command
    let interrupted = registry
        .execute("s1", "C-c", ExecuteOptions::input().with_timeout(Duration::from_millis(1000)))
        .await
        .unwrap();
    assert_eq!(interrupted.status, ExecutionStatus::Completed);
}

#[tokio::test]
async fn test_input_without_running_command_is_error() {
    let (registry, _backend) = test_registry();

    let result = registry
        .execute("s1", "y", ExecuteOptions::input())
        .await
        .unwrap();
    assert_eq!(result.status, ExecutionStatus::Error);
    assert!(result.output.contains("No command is currently running"));
}

#[tokio::test]
async fn test_interrupt_with_ctrl_c() {
    let (registry, backend) = test_registry();
    backend.program("sleep 99", Program::slow(1_000_000));

    let result = registry.execute("s1", "sleep 99", quick(50)).await.unwrap();
    assert_eq!(result.status, ExecutionStatus::Running);

    let result = registry
        .execute("s1", "C-c", ExecuteOptions::input())
        .await
        .unwrap();
    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.exit_code, Some(130));

    // A subsequent poll sees an idle session again
    let result = registry.execute("s1", "", quick(1000)).await.unwrap();
    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.exit_code, Some(0));
}

#[tokio::test]
async fn test_special_key_while_running_needs_no_is_input() {
    let (registry, backend) = test_registry();
    backend.program("sleep 99", Program::slow(1_000_000));

    registry.execute("s1", "sleep 99", quick(50)).await.unwrap();

    // Bare special key routes as input because a command is outstanding
    let result = registry.execute("s1", "C-c", quick(1000)).await.unwrap();
    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.exit_code, Some(130));
}

#[tokio::test]
async fn test_line_input_to_interactive_command() {
    let (registry, backend) = test_registry();
    backend.program("read name", Program::interactive("hello Alice", 0));

    let result = registry.execute("s1", "read name", quick(50)).await.unwrap();
    assert_eq!(result.status, ExecutionStatus::Running);

    let result = registry
        .execute("s1", "Alice", ExecuteOptions::input())
        .await
        .unwrap();
    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.exit_code, Some(0));
    assert!(result.output.contains("hello Alice"));
}

#[tokio::test]
async fn test_no_enter_input_keeps_command_running() {
    let (registry, backend) = test_registry();
    backend.program("confirm", Program::interactive("done", 0));

    registry.execute("s1", "confirm", quick(50)).await.unwrap();

    // A keystroke without enter never submits the line
    let result = registry
        .execute("s1", "y", ExecuteOptions::input().without_enter())
        .await
        .unwrap();
    assert_eq!(result.status, ExecutionStatus::Running);
    assert_eq!(result.exit_code, None);

    let result = registry
        .execute("s1", "es", ExecuteOptions::input())
        .await
        .unwrap();
    assert_eq!(result.status, ExecutionStatus::Completed);
    assert!(result.output.contains("done"));
}

#[tokio::test]
async fn test_working_dir_snapshot_in_results() {
    let (registry, _backend) = test_registry();

    let result = registry.execute("s1", "", quick(1000)).await.unwrap();
    assert_eq!(result.working_dir, std::path::PathBuf::from("/tmp"));
}

#[tokio::test]
async fn test_closed_session_fails_deterministically() {
    let (registry, _backend) = test_registry();

    let session = registry.get_or_create("s1").await.unwrap();
    assert!(registry.close("s1").await);

    let err = session
        .lock()
        .await
        .execute("echo hi", ExecuteOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SessionNotInitialized { .. }));
}
