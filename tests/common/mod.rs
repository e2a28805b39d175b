//! Shared testing harness for CLI integration tests.

use assert_cmd::Command;
use assert_fs::TempDir;

#[allow(dead_code)]
pub struct TestContext {
    data_root: TempDir,
    system_root: TempDir,
}

#[allow(dead_code)]
impl TestContext {
    /// Create isolated, empty data and system roots (no `settings.yaml`,
    /// no vaults).
    pub fn new() -> Self {
        Self {
            data_root: TempDir::new().expect("create data root"),
            system_root: TempDir::new().expect("create system root"),
        }
    }

    pub fn data_root(&self) -> &TempDir {
        &self.data_root
    }

    pub fn data_path(&self) -> &std::path::Path {
        self.data_root.path()
    }

    pub fn system_path(&self) -> &std::path::Path {
        self.system_root.path()
    }

    /// Build a command for invoking the compiled `assistantmd` binary with
    /// this context's roots wired in via env.
    pub fn cli(&self) -> Command {
        let mut cmd = Command::cargo_bin("assistantmd").expect("locate assistantmd binary");
        cmd.env("CONTAINER_DATA_ROOT", self.data_root.path());
        cmd.env("CONTAINER_SYSTEM_ROOT", self.system_root.path());
        cmd
    }
}
