// tests/dispatch_local.rs

use std::error::Error;

use hydra::dispatch::{DispatchRequest, Dispatcher};
use hydra::errors::{EXIT_FATAL, EXIT_INVALID_RUNNER_IP, HydraError};
use hydra::exec::CommandOutput;
use hydra::lock::MemoryLockStore;
use hydra_test_utils::builders::{ContextBuilder, TEST_ID, words};
use hydra_test_utils::fake_runner::RecordingRunner;
use hydra_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn dispatcher(ctx: hydra::context::RunnerContext, runner: &RecordingRunner) -> Dispatcher {
    let lock = MemoryLockStore::new(ctx.runner_ip_file());
    Dispatcher::new(ctx, Box::new(runner.clone()), Box::new(lock))
}

fn request(command: &[&str]) -> DispatchRequest {
    DispatchRequest {
        command: words(command),
        ..DispatchRequest::default()
    }
}

#[tokio::test]
async fn local_run_inspects_image_then_runs_container() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    let ctx = ContextBuilder::new(tmp.path()).build();
    let runner = RecordingRunner::healthy();

    let code = dispatcher(ctx, &runner)
        .dispatch(&request(&["list-resources"]))
        .await?;
    assert_eq!(code, 0);

    let rendered = runner.rendered();
    assert_eq!(rendered.len(), 3, "unexpected commands: {rendered:#?}");
    assert_eq!(rendered[0], "docker image inspect scylladb/hydra:test");
    assert_eq!(rendered[1], "sh -c 'id -u && id -g && id -G'");
    assert!(rendered[2].starts_with("docker run --rm -i --privileged -h SCT-CONTAINER"));
    assert!(rendered[2].contains(&format!("--name={TEST_ID}_")));
    assert!(rendered[2].contains("--group-add 1000 --group-add 998"));
    assert!(rendered[2].ends_with("'./get-qa-ssh-keys.sh && ./sct.py list-resources'"));
    assert!(!runner.programs().iter().any(|p| p == "ssh-agent"));
    Ok(())
}

#[tokio::test]
async fn missing_image_is_pulled_first() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ctx = ContextBuilder::new(tmp.path()).build();
    let runner = RecordingRunner::healthy();
    runner.fail("docker", Some("inspect"), 1);

    dispatcher(ctx, &runner).dispatch(&request(&["list"])).await?;

    let rendered = runner.rendered();
    assert_eq!(rendered[1], "docker pull scylladb/hydra:test");
    Ok(())
}

#[tokio::test]
async fn container_exit_status_is_propagated() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ctx = ContextBuilder::new(tmp.path()).build();
    let runner = RecordingRunner::healthy();
    runner.fail("docker", Some("--privileged"), 3);

    let code = dispatcher(ctx, &runner).dispatch(&request(&["run-test"])).await?;
    assert_eq!(code, 3);
    Ok(())
}

#[tokio::test]
async fn prefixed_variables_are_forwarded_by_name() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ctx = ContextBuilder::new(tmp.path())
        .with_var("SCT_FOO", "1")
        .with_var("PYTEST_BAR", "2")
        .with_var("JENKINS_URL", "http://ci")
        .with_var("RANDOM_VAR", "3")
        .build();
    let runner = RecordingRunner::healthy();

    dispatcher(ctx, &runner).dispatch(&request(&["list"])).await?;

    let calls = runner.calls();
    let run = calls.last().ok_or("no container run recorded")?;
    for name in ["SCT_FOO", "PYTEST_BAR", "JENKINS_URL", "SCT_TEST_ID"] {
        assert!(run.has_arg(name), "{name} should be forwarded");
    }
    assert!(!run.render().contains("RANDOM_VAR"));
    assert!(!run.has_arg("SCT_FOO=1"));
    Ok(())
}

#[tokio::test]
async fn conflicting_target_flags_run_nothing() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ctx = ContextBuilder::new(tmp.path()).build();
    let runner = RecordingRunner::healthy();

    let req = DispatchRequest {
        create_new_runner: true,
        runner_ip: Some("10.0.0.1".to_string()),
        ..DispatchRequest::default()
    };
    let err = dispatcher(ctx, &runner).dispatch(&req).await.unwrap_err();

    assert!(matches!(err, HydraError::ConfigError(_)));
    assert_eq!(err.exit_code(), EXIT_FATAL);
    assert!(runner.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn malformed_runner_address_exits_with_two_before_any_command() -> TestResult {
    for bad in ["10.0.0", "10.0.0.256", "runner.example.com", "10.0.0.1 ", "", "1.2.3.4.5"] {
        let tmp = tempfile::tempdir()?;
        let ctx = ContextBuilder::new(tmp.path()).build();
        let runner = RecordingRunner::healthy();

        let req = DispatchRequest {
            runner_ip: Some(bad.to_string()),
            ..DispatchRequest::default()
        };
        let err = dispatcher(ctx, &runner).dispatch(&req).await.unwrap_err();

        assert_eq!(err.exit_code(), EXIT_INVALID_RUNNER_IP, "address {bad:?}");
        assert!(runner.calls().is_empty(), "address {bad:?} ran commands");
    }
    Ok(())
}

#[tokio::test]
async fn missing_container_tool_is_a_tooling_error() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ctx = ContextBuilder::new(tmp.path())
        .without_var("HYDRA_TOOL")
        .with_var("PATH", tmp.path().to_str().ok_or("non-utf8 tempdir")?)
        .build();
    let runner = RecordingRunner::healthy();

    let err = dispatcher(ctx, &runner)
        .dispatch(&request(&["list"]))
        .await
        .unwrap_err();
    assert!(matches!(err, HydraError::ToolingError(_)));
    assert!(runner.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn aws_mock_pins_certificate_names_to_mock_address() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ctx = ContextBuilder::new(tmp.path()).build();
    let runner = RecordingRunner::healthy();
    runner.respond(
        "docker",
        Some("{{ .NetworkSettings.IPAddress }}"),
        CommandOutput::with_stdout("172.17.0.2\n"),
    );
    runner.respond(
        "sh",
        Some("openssl"),
        CommandOutput::with_stdout(
            "X509v3 Subject Alternative Name:\n    \
             DNS:aws-mock.itself, DNS:ec2.us-east-1.amazonaws.com\n",
        ),
    );

    let req = DispatchRequest {
        aws_mock: true,
        command: words(&["run-test"]),
        ..DispatchRequest::default()
    };
    dispatcher(ctx, &runner).dispatch(&req).await?;

    let run = runner.rendered().pop().ok_or("no container run recorded")?;
    assert!(run.contains("--add-host aws-mock.itself:172.17.0.2"));
    assert!(run.contains("--add-host ec2.us-east-1.amazonaws.com:172.17.0.2"));
    assert!(run.contains("update-ca-certificates"));
    Ok(())
}

#[tokio::test]
async fn help_skips_key_fetch_and_keeps_tool_args_first() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ctx = ContextBuilder::new(tmp.path()).build();
    let runner = RecordingRunner::healthy();

    let req = DispatchRequest {
        help: true,
        tool_args: words(&["--help"]),
        ..DispatchRequest::default()
    };
    dispatcher(ctx, &runner).dispatch(&req).await?;

    let run = runner.rendered().pop().ok_or("no container run recorded")?;
    assert!(!run.contains("get-qa-ssh-keys"));
    assert!(run.ends_with("/bin/bash -c './sct.py --help'"));
    Ok(())
}
