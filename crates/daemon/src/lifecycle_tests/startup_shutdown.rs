// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
#[serial(env)]
async fn startup_writes_pid_and_version_then_shutdown_removes_them() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let StartupResult {
        mut daemon,
        listener,
    } = startup(&config).await.unwrap();

    let pid = std::fs::read_to_string(&config.lock_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());
    assert_eq!(
        std::fs::read_to_string(&config.version_path).unwrap(),
        env!("CARGO_PKG_VERSION")
    );
    assert!(config.agents_dir.is_dir());
    assert_ne!(listener.local_addr().unwrap().port(), 0);

    daemon.shutdown().unwrap();
    assert!(!config.lock_path.exists());
    assert!(!config.version_path.exists());
}

#[tokio::test]
#[serial(env)]
async fn startup_lock_failed_does_not_remove_existing_files() {
    // A second startup attempt against a held lock must fail without
    // deleting anything.
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    std::fs::write(&config.version_path, b"0.1.0").unwrap();

    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)
        .unwrap();
    use fs2::FileExt;
    lock_file.lock_exclusive().unwrap();
    std::fs::write(&config.lock_path, b"12345").unwrap();

    match startup(&config).await {
        Err(LifecycleError::LockFailed(_)) => {}
        Err(e) => panic!("expected LockFailed, got: {e}"),
        Ok(_) => panic!("expected LockFailed, but startup succeeded"),
    }

    assert!(config.version_path.exists(), "version file must survive LockFailed");
    assert_eq!(std::fs::read_to_string(&config.lock_path).unwrap(), "12345");
}

#[tokio::test]
#[serial(env)]
async fn bind_failure_cleans_up() {
    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    config.port = taken.local_addr().unwrap().port();

    match startup(&config).await {
        Err(LifecycleError::BindFailed(addr, _)) => assert_eq!(addr, config.bind_addr()),
        Err(e) => panic!("expected BindFailed, got: {e}"),
        Ok(_) => panic!("expected BindFailed, but startup succeeded"),
    }

    assert!(!config.lock_path.exists());
    assert!(!config.version_path.exists());
}

#[test]
fn lock_file_not_truncated_before_lock_acquired() {
    let dir = tempdir().unwrap();
    let lock_path = dir.path().join("test.lock");

    let running_lock = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .unwrap();
    use fs2::FileExt;
    running_lock.lock_exclusive().unwrap();
    use std::io::Write;
    let mut f = &running_lock;
    writeln!(f, "99999").unwrap();

    // Same OpenOptions as startup_inner
    let _second = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .unwrap();

    let content = std::fs::read_to_string(&lock_path).unwrap();
    assert_eq!(content.trim(), "99999");
}

#[test]
#[serial(env)]
fn cleanup_on_failure_removes_created_files() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    std::fs::write(&config.version_path, b"0.1.0").unwrap();
    std::fs::write(&config.lock_path, b"12345").unwrap();

    cleanup_on_failure(&config);

    assert!(!config.version_path.exists());
    assert!(!config.lock_path.exists());
}
