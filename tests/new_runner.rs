// tests/new_runner.rs

use std::error::Error;
use std::future::Future;
use std::pin::Pin;

use hydra::dispatch::{DispatchRequest, Dispatcher};
use hydra::errors::{HydraError, Result as HydraResult};
use hydra::exec::{CommandOutput, CommandRunner, CommandSpec};
use hydra::lock::{LockStore, MemoryLockStore};
use hydra_test_utils::builders::{ContextBuilder, TEST_ID, words};
use hydra_test_utils::fake_runner::RecordingRunner;

type TestResult = Result<(), Box<dyn Error>>;

/// A runner whose provisioning step records `ip` in the marker, the way the
/// real provisioning command does.
struct ProvisioningRunner {
    inner: RecordingRunner,
    lock: MemoryLockStore,
    ip: Option<&'static str>,
}

impl CommandRunner for ProvisioningRunner {
    fn run<'a>(
        &'a mut self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = HydraResult<CommandOutput>> + Send + 'a>> {
        Box::pin(async move {
            if spec.has_arg("create-runner-instance") {
                if let Some(ip) = self.ip {
                    self.lock.write(ip)?;
                }
            }
            self.inner.run(spec).await
        })
    }
}

fn new_runner_request() -> DispatchRequest {
    DispatchRequest {
        create_new_runner: true,
        command: words(&["run-test", "longevity_test"]),
        ..DispatchRequest::default()
    }
}

#[tokio::test]
async fn existing_marker_blocks_provisioning() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ctx = ContextBuilder::new(tmp.path()).with_aws_env().build();
    let marker = ctx.runner_ip_file();
    let runner = RecordingRunner::healthy();
    let lock = MemoryLockStore::with_ip(&marker, "10.9.9.9");

    let mut dispatcher = Dispatcher::new(ctx, Box::new(runner.clone()), Box::new(lock));
    let err = dispatcher.dispatch(&new_runner_request()).await.unwrap_err();

    assert!(matches!(err, HydraError::LockConflictError { .. }));
    let message = err.to_string();
    assert!(message.contains(&marker.display().to_string()));
    assert!(message.contains("--execute-on-runner 10.9.9.9"));
    assert!(runner.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn provisioned_runner_address_is_read_from_marker() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ctx = ContextBuilder::new(tmp.path())
        .with_aws_env()
        .with_var("SCT_RUNNER_REGION", "us-east-1")
        .build();
    let inner = RecordingRunner::healthy();
    let lock = MemoryLockStore::new(ctx.runner_ip_file());
    let runner = ProvisioningRunner {
        inner: inner.clone(),
        lock: lock.clone(),
        ip: Some("10.4.5.6"),
    };

    let mut dispatcher = Dispatcher::new(ctx, Box::new(runner), Box::new(lock.clone()));
    let code = dispatcher.dispatch(&new_runner_request()).await?;
    assert_eq!(code, 0);

    let rendered = inner.rendered();
    assert_eq!(
        rendered[0],
        format!(
            "./sct.py create-runner-instance --cloud-provider aws --region us-east-1 \
             --availability-zone a --test-id {TEST_ID} --duration 1440"
        )
    );
    assert!(rendered.iter().any(|c| c.contains("docker -H ssh://ubuntu@10.4.5.6 run")));
    assert_eq!(inner.count("ssh-agent", "-k"), 1);
    assert_eq!(lock.read()?.as_deref(), Some("10.4.5.6"));
    Ok(())
}

#[tokio::test]
async fn provisioning_without_marker_is_fatal() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ctx = ContextBuilder::new(tmp.path()).with_aws_env().build();
    let inner = RecordingRunner::healthy();
    let lock = MemoryLockStore::new(ctx.runner_ip_file());
    let runner = ProvisioningRunner {
        inner: inner.clone(),
        lock: lock.clone(),
        ip: None,
    };

    let mut dispatcher = Dispatcher::new(ctx, Box::new(runner), Box::new(lock));
    let err = dispatcher.dispatch(&new_runner_request()).await.unwrap_err();

    assert_eq!(err.exit_code(), 1);
    assert_eq!(inner.programs(), ["./sct.py"]);
    Ok(())
}

#[tokio::test]
async fn failed_provisioning_starts_no_agent() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ctx = ContextBuilder::new(tmp.path()).with_aws_env().build();
    let runner = RecordingRunner::healthy();
    runner.fail("./sct.py", Some("create-runner-instance"), 1);
    let lock = MemoryLockStore::new(ctx.runner_ip_file());

    let mut dispatcher = Dispatcher::new(ctx, Box::new(runner.clone()), Box::new(lock));
    let err = dispatcher.dispatch(&new_runner_request()).await.unwrap_err();

    assert!(matches!(err, HydraError::CommandFailed { code: 1, .. }));
    assert!(!runner.programs().iter().any(|p| p == "ssh-agent"));
    Ok(())
}
