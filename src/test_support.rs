use crate::agent::{BackendKind, BackendSettings};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{LazyLock, Mutex, MutexGuard};
use std::time::Duration;

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // Changing the process current working directory is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// Write a stand-in for the `kind` agent CLI into `dir`.
///
/// The script answers the backend's availability probe and otherwise runs
/// `body` as `sh` code, with the agent's arguments in `$@`.
pub(crate) fn fake_agent(dir: &Path, kind: BackendKind, body: &str) -> PathBuf {
    let probe = kind.probe_args().join(" ");
    let script = format!(
        "#!/bin/sh\nif [ \"$*\" = \"{probe}\" ]; then echo \"{name} 0.0.0-test\"; exit 0; fi\n{body}\n",
        probe = probe,
        name = kind.name(),
        body = body,
    );
    let path = dir.join(kind.name());
    write_executable(&path, &script);
    path
}

/// Write an executable file without this process ever holding a writable
/// descriptor to it. Executing a file while any forked child still holds
/// such a descriptor fails with ETXTBSY.
pub(crate) fn write_executable(path: &Path, content: &str) {
    let mut child = Command::new("sh")
        .args(["-c", "cat > \"$1\" && chmod 755 \"$1\"", "sh"])
        .arg(path)
        .stdin(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(content.as_bytes())
        .unwrap();
    let status = child.wait().unwrap();
    assert!(status.success(), "failed to write {}", path.display());
}

pub(crate) fn settings_for(kind: BackendKind, binary: &Path, timeout: Duration) -> BackendSettings {
    BackendSettings::defaults(kind)
        .with_binary(binary.to_string_lossy())
        .with_timeout(timeout)
}
