#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

pub fn deltadesk_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_deltadesk"))
}

/// An isolated deltadesk home in a temp directory
pub struct DeskTest {
    pub temp_dir: TempDir,
    pub binary_path: PathBuf,
}

impl DeskTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        Self {
            temp_dir,
            binary_path: deltadesk_binary(),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.temp_dir.path().join(".deltadesk")
    }

    pub fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.binary_path);
        cmd.args(args)
            .current_dir(self.temp_dir.path())
            .env("DELTADESK_ROOT", self.root())
            .env_remove("DELTADESK_TOKEN")
            .env_remove("DELTADESK_API_URL")
            .env_remove("DELTADESK_LOG");
        cmd
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args)
            .output()
            .expect("Failed to execute command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed:\nstdout: {}\nstderr: {}",
                args,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Command {:?} should have failed but succeeded:\nstdout: {}",
            args,
            String::from_utf8_lossy(&output.stdout)
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    pub fn write_config(&self, content: &str) {
        fs::create_dir_all(self.root()).expect("Failed to create desk root");
        fs::write(self.root().join("config.yaml"), content).expect("Failed to write config");
    }

    pub fn read_config(&self) -> String {
        fs::read_to_string(self.root().join("config.yaml")).expect("Failed to read config")
    }

    /// Store a session as `deltadesk login` would
    pub fn write_session(&self, user_name: &str, expiration: &str, is_superuser: bool) {
        fs::create_dir_all(self.root()).expect("Failed to create desk root");
        let content = format!(
            "access_token: test-token\nexpiration: {expiration}\nuser_name: {user_name}\nis_superuser: {is_superuser}\n"
        );
        fs::write(self.session_path(), content).expect("Failed to write session");
    }

    pub fn session_path(&self) -> PathBuf {
        self.root().join("session.yaml")
    }
}

impl Default for DeskTest {
    fn default() -> Self {
        Self::new()
    }
}
