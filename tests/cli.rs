//! CLI integration tests for rightsdesk admin commands.
//!
//! Each test uses an isolated temp directory for the database, ensuring tests
//! can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::Path;

use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;
use rightsdesk::identity::list_managers;
use rightsdesk::store::SqliteStore;
use rightsdesk::types::Role;

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("rightsdesk").expect("failed to find binary");
        cmd.env("NO_COLOR", "1");
        cmd
    }

    fn init_as(&self, email: &str) -> assert_cmd::assert::Assert {
        self.cmd()
            .args(["admin", "init", "--data-dir"])
            .arg(self.data_dir())
            .args(["--email", email, "--password", "admin-password"])
            .assert()
    }

    fn init(&self) -> assert_cmd::assert::Assert {
        self.init_as("admin@label.test")
    }

    fn open_store(&self) -> SqliteStore {
        SqliteStore::new(self.data_dir().join("rightsdesk.db")).expect("open store")
    }
}

// ============================================================================
// Init Command Tests
// ============================================================================

#[test]
fn init_creates_database_admin_and_token_file() {
    let ctx = TestContext::new();

    ctx.init()
        .success()
        .stdout(predicate::str::contains("Created admin 'admin@label.test'"));

    assert!(ctx.data_dir().join("rightsdesk.db").exists());

    let token_content = std::fs::read_to_string(ctx.data_dir().join(".admin_token"))
        .expect("failed to read token file");
    assert!(token_content.starts_with("rdesk_"));

    let admin = ctx
        .open_store()
        .get_user_by_email("admin@label.test")
        .unwrap()
        .expect("admin exists");
    assert_eq!(admin.role, Role::Admin);
}

#[cfg(unix)]
#[test]
fn init_writes_token_file_readable_by_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let ctx = TestContext::new();
    ctx.init().success();

    let mode = std::fs::metadata(ctx.data_dir().join(".admin_token"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn init_rejects_second_initialization_with_existing_database() {
    let ctx = TestContext::new();

    ctx.init().success();
    ctx.init_as("second@label.test")
        .failure()
        .stderr(predicate::str::contains("already initialized"));

    let store = ctx.open_store();
    assert!(store.get_user_by_email("second@label.test").unwrap().is_none());
    assert!(list_managers(&store).unwrap().is_empty());
}

#[test]
fn init_rejects_short_password() {
    let ctx = TestContext::new();

    ctx.cmd()
        .args(["admin", "init", "--data-dir"])
        .arg(ctx.data_dir())
        .args(["--email", "admin@label.test", "--password", "short"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("8 characters"));

    assert!(!ctx.data_dir().join(".admin_token").exists());
}

// ============================================================================
// Serve Command Tests
// ============================================================================

#[test]
fn serve_refuses_uninitialized_data_dir() {
    let ctx = TestContext::new();

    ctx.cmd()
        .args(["serve", "--port", "0", "--data-dir"])
        .arg(ctx.data_dir())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Server not initialized"));
}

#[test]
fn serve_reports_bad_config_file() {
    let ctx = TestContext::new();
    let config = ctx.data_dir().join("rightsdesk.toml");
    std::fs::write(&config, "token_ttl_minutes = -5\n").unwrap();

    ctx.cmd()
        .args(["serve", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("token_ttl_minutes"));
}
