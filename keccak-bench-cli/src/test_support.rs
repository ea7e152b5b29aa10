//! Fake toolchains for unit tests.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

static SCRIPT_LOCK: Mutex<()> = Mutex::new(());

/// Serializes script creation and execution across test threads.
///
/// A script still open for writing in a sibling thread's forked child makes
/// `exec` fail with ETXTBSY.
pub fn lock() -> MutexGuard<'static, ()> {
    SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

/// Write an executable `/bin/sh` script.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
