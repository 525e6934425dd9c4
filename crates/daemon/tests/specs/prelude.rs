//! Shared helpers for kvsd specs

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory holding a transaction log and optional config
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Workspace whose transaction log has the given content
    pub fn with_log(content: &str) -> Self {
        let ws = Self::empty();
        std::fs::write(ws.log_path(), content).unwrap();
        ws
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn log_path(&self) -> PathBuf {
        self.path().join("transactions.log")
    }

    pub fn write_config(&self, content: &str) -> PathBuf {
        let path = self.path().join("kvsd.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    /// `kvsd` bound to an ephemeral port, logging to stderr
    pub fn kvsd(&self) -> Cli {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_kvsd"));
        cmd.current_dir(self.path())
            .env_remove("KVS_LOG_PATH")
            .env_remove("RUST_LOG")
            .env("KVS_BIND_ADDR", "127.0.0.1:0")
            .env("KVS_TRANSACTION_LOG", self.log_path())
            .timeout(std::time::Duration::from_secs(10));
        Cli { cmd }
    }
}

pub struct Cli {
    cmd: Command,
}

impl Cli {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    /// Run and require a non-zero exit
    pub fn fails(mut self) -> Outcome {
        let output = self.cmd.assert().failure().get_output().clone();
        Outcome {
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

pub struct Outcome {
    stderr: String,
}

impl Outcome {
    pub fn stderr_has(self, expected: &str) -> Self {
        assert!(
            self.stderr.contains(expected),
            "stderr should contain {:?}\nstderr:\n{}",
            expected,
            self.stderr
        );
        self
    }
}
