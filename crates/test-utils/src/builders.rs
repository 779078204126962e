#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use hydra::config::HydraConfig;
use hydra::context::RunnerContext;

/// Test id used by contexts built here unless overridden.
pub const TEST_ID: &str = "11111111-2222-3333-4444-555555555555";

/// Builder for `RunnerContext` rooted in a scratch directory.
///
/// Layout under `root`:
/// - `scylla-cluster-tests/` is the working tree
/// - `home/` is the invoking user's home
pub struct ContextBuilder {
    env: BTreeMap<String, String>,
    sct_dir: PathBuf,
    home: PathBuf,
    config: HydraConfig,
    dry_run: bool,
    tty: bool,
}

impl ContextBuilder {
    pub fn new(root: &Path) -> Self {
        let mut config = HydraConfig::default();
        config.image.tag = Some("test".to_string());

        let env = BTreeMap::from([
            ("HYDRA_TOOL".to_string(), "docker".to_string()),
            ("USER".to_string(), "tester".to_string()),
            ("SCT_TEST_ID".to_string(), TEST_ID.to_string()),
        ]);

        Self {
            env,
            sct_dir: root.join("scylla-cluster-tests"),
            home: root.join("home"),
            config,
            dry_run: false,
            tty: false,
        }
    }

    pub fn with_var(mut self, name: &str, value: &str) -> Self {
        self.env.insert(name.to_string(), value.to_string());
        self
    }

    pub fn without_var(mut self, name: &str) -> Self {
        self.env.remove(name);
        self
    }

    /// Export AWS credentials through the environment so no credentials
    /// directory is needed on disk.
    pub fn with_aws_env(self) -> Self {
        self.with_var("AWS_ACCESS_KEY_ID", "AKIATEST")
            .with_var("AWS_SECRET_ACCESS_KEY", "secret")
    }

    pub fn with_config(mut self, f: impl FnOnce(&mut HydraConfig)) -> Self {
        f(&mut self.config);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn tty(mut self, tty: bool) -> Self {
        self.tty = tty;
        self
    }

    pub fn sct_dir(&self) -> &Path {
        &self.sct_dir
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Create the directories and return the context.
    pub fn build(self) -> RunnerContext {
        fs::create_dir_all(&self.sct_dir).expect("create working tree");
        fs::create_dir_all(&self.home).expect("create home");
        RunnerContext::new(self.env, self.sct_dir, self.home, self.config, self.dry_run)
            .with_tty(self.tty)
    }
}

/// Write `~/.aws/credentials` under `home`.
pub fn write_aws_credentials(home: &Path) -> PathBuf {
    let dir = home.join(".aws");
    fs::create_dir_all(&dir).expect("create .aws");
    let file = dir.join("credentials");
    fs::write(&file, "[default]\naws_access_key_id = AKIATEST\n").expect("write credentials");
    file
}

/// Words helper for building argument lists.
pub fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
