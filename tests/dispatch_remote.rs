// tests/dispatch_remote.rs

use std::error::Error;

use hydra::context::RunnerContext;
use hydra::dispatch::{DispatchRequest, Dispatcher};
use hydra::errors::HydraError;
use hydra::exec::CommandOutput;
use hydra::lock::MemoryLockStore;
use hydra_test_utils::builders::{ContextBuilder, words, write_aws_credentials};
use hydra_test_utils::fake_runner::RecordingRunner;
use hydra_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

const RUNNER: &str = "10.0.0.7";

fn dispatcher(ctx: RunnerContext, runner: &RecordingRunner) -> Dispatcher {
    let lock = MemoryLockStore::new(ctx.runner_ip_file());
    Dispatcher::new(ctx, Box::new(runner.clone()), Box::new(lock))
}

fn on_runner(command: &[&str]) -> DispatchRequest {
    DispatchRequest {
        runner_ip: Some(RUNNER.to_string()),
        command: words(command),
        ..DispatchRequest::default()
    }
}

fn agent_kills(runner: &RecordingRunner) -> usize {
    runner.count("ssh-agent", "-k")
}

#[tokio::test]
async fn remote_run_prepares_runner_then_targets_its_daemon() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    let ctx = ContextBuilder::new(tmp.path()).with_aws_env().build();
    let runner = RecordingRunner::healthy();

    let code = dispatcher(ctx, &runner)
        .dispatch(&on_runner(&["run-test", "longevity_test"]))
        .await?;
    assert_eq!(code, 0);

    let programs = runner.programs();
    assert_eq!(
        programs,
        [
            "ssh-agent", "ssh-add", "ssh-add", "ssh-keygen", "rsync", "docker", "ssh", "docker",
            "ssh-agent"
        ]
    );

    let rendered = runner.rendered();
    assert!(rendered[3].ends_with("ssh-keygen -R 10.0.0.7"));
    assert!(rendered[4].contains("rsync -ar -e 'ssh -o StrictHostKeyChecking=no' --delete"));
    assert!(rendered[4].ends_with("ubuntu@10.0.0.7:/home/ubuntu/"));
    assert!(rendered[4].starts_with("SSH_AGENT_PID=4242 SSH_AUTH_SOCK=/tmp/ssh-test/agent.1"));

    let run = &rendered[7];
    assert!(run.contains("docker -H ssh://ubuntu@10.0.0.7 run --rm"));
    assert!(run.contains("-h SCT-CONTAINER-RUNNER"));
    assert!(run.contains("-e RUNNER_IP=10.0.0.7"));
    assert!(run.contains("--label RunnerIp=10.0.0.7"));
    assert!(run.contains("-w /home/ubuntu/scylla-cluster-tests"));

    assert_eq!(agent_kills(&runner), 1);
    Ok(())
}

#[tokio::test]
async fn credential_directory_is_synced_when_not_in_environment() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let builder = ContextBuilder::new(tmp.path());
    write_aws_credentials(builder.home());
    let ctx = builder.build();
    let runner = RecordingRunner::healthy();

    dispatcher(ctx, &runner).dispatch(&on_runner(&["list"])).await?;

    let rendered = runner.rendered();
    assert!(
        rendered
            .iter()
            .any(|c| c.contains("/.aws/ ubuntu@10.0.0.7:/home/ubuntu/.aws/")),
        "no credential sync in {rendered:#?}"
    );
    assert_eq!(agent_kills(&runner), 1);
    Ok(())
}

#[tokio::test]
async fn agent_is_stopped_once_when_sync_fails() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ctx = ContextBuilder::new(tmp.path()).with_aws_env().build();
    let runner = RecordingRunner::healthy();
    runner.fail("rsync", None, 23);

    let err = dispatcher(ctx, &runner)
        .dispatch(&on_runner(&["list"]))
        .await
        .unwrap_err();

    assert!(matches!(err, HydraError::CommandFailed { code: 23, .. }));
    assert_eq!(agent_kills(&runner), 1);
    let last = runner.programs().last().cloned();
    assert_eq!(last.as_deref(), Some("ssh-agent"));
    assert!(!runner.programs().iter().any(|p| p == "docker"));
    Ok(())
}

#[tokio::test]
async fn missing_aws_credentials_fail_and_still_stop_agent() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ctx = ContextBuilder::new(tmp.path()).build();
    let runner = RecordingRunner::healthy();

    let err = dispatcher(ctx, &runner)
        .dispatch(&on_runner(&["list"]))
        .await
        .unwrap_err();

    assert!(matches!(err, HydraError::CredentialError(_)));
    assert!(err.to_string().contains("credentials"));
    assert_eq!(agent_kills(&runner), 1);
    Ok(())
}

#[tokio::test]
async fn unloadable_key_is_a_credential_error() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ctx = ContextBuilder::new(tmp.path()).with_aws_env().build();
    let runner = RecordingRunner::healthy();
    runner.fail("ssh-add", Some("scylla-test"), 1);

    let err = dispatcher(ctx, &runner)
        .dispatch(&on_runner(&["list"]))
        .await
        .unwrap_err();

    assert!(matches!(err, HydraError::CredentialError(_)));
    assert_eq!(agent_kills(&runner), 1);
    assert!(!runner.programs().iter().any(|p| p == "rsync"));
    Ok(())
}

#[tokio::test]
async fn stale_host_key_removal_failure_is_not_fatal() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ctx = ContextBuilder::new(tmp.path()).with_aws_env().build();
    let runner = RecordingRunner::healthy();
    runner.fail("ssh-keygen", None, 255);

    let code = dispatcher(ctx, &runner).dispatch(&on_runner(&["list"])).await?;
    assert_eq!(code, 0);
    Ok(())
}

#[tokio::test]
async fn gce_backend_syncs_credential_file_when_present() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let builder = ContextBuilder::new(tmp.path())
        .with_aws_env()
        .with_var("SCT_CLUSTER_BACKEND", "gce");
    std::fs::create_dir_all(builder.home())?;
    std::fs::write(
        builder.home().join(".google_libcloud_auth.skilled-adapter-452"),
        "{}",
    )?;
    let ctx = builder.build();
    let runner = RecordingRunner::healthy();

    dispatcher(ctx, &runner).dispatch(&on_runner(&["list"])).await?;

    let synced = ".google_libcloud_auth.skilled-adapter-452 ubuntu@10.0.0.7:/home/ubuntu/";
    assert!(runner.rendered().iter().any(|c| c.contains(synced)));
    Ok(())
}

#[tokio::test]
async fn gce_backend_without_credential_file_continues() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ctx = ContextBuilder::new(tmp.path())
        .with_aws_env()
        .with_var("SCT_CLUSTER_BACKEND", "gke")
        .build();
    let runner = RecordingRunner::healthy();

    let code = dispatcher(ctx, &runner).dispatch(&on_runner(&["list"])).await?;
    assert_eq!(code, 0);
    assert_eq!(runner.count("rsync", "--delete"), 1);
    Ok(())
}

#[tokio::test]
async fn unparseable_agent_output_still_kills_the_agent() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ctx = ContextBuilder::new(tmp.path()).with_aws_env().build();
    let runner = RecordingRunner::new();
    runner.respond(
        "ssh-agent",
        Some("-s"),
        CommandOutput::with_stdout("SSH_AGENT_PID=9911; export SSH_AGENT_PID;\n"),
    );

    let err = dispatcher(ctx, &runner)
        .dispatch(&on_runner(&["list"]))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("unexpected ssh-agent output"));
    assert_eq!(agent_kills(&runner), 1);
    let kill = runner
        .calls()
        .into_iter()
        .find(|c| c.has_arg("-k"))
        .ok_or("no agent kill recorded")?;
    assert_eq!(kill.get_envs()["SSH_AGENT_PID"], "9911");
    assert_eq!(runner.programs(), ["ssh-agent", "ssh-agent"]);
    Ok(())
}

#[tokio::test]
async fn failed_sync_reports_child_stderr() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ctx = ContextBuilder::new(tmp.path()).with_aws_env().build();
    let runner = RecordingRunner::healthy();
    runner.respond(
        "rsync",
        None,
        CommandOutput {
            code: 12,
            stdout: String::new(),
            stderr: "rsync error: error in rsync protocol data stream\n".to_string(),
        },
    );

    let err = dispatcher(ctx, &runner)
        .dispatch(&on_runner(&["list"]))
        .await
        .unwrap_err();

    assert!(matches!(err, HydraError::CommandFailed { code: 12, .. }));
    assert!(
        err.to_string()
            .ends_with("rsync error: error in rsync protocol data stream")
    );
    assert_eq!(agent_kills(&runner), 1);
    Ok(())
}
