use crate::daemon::Daemon;
use crate::Result;
use nextcmd_types::wire::{ErrorCode, ErrorEnvelope, IngestEvent, SuggestRequest};
use serde::Deserialize;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const APP_NAME: &str = "nextcmd";

/// One wire message over the socket: an ingest event or a suggestion
/// request, distinguished by shape (§6.1, §6.2). `IngestEvent` always
/// carries a `type` field that `SuggestRequest` lacks.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IpcMessage {
    Ingest(IngestEvent),
    Suggest(SuggestRequest),
}

/// Default socket path priority chain (§6.1): `$XDG_RUNTIME_DIR`, else
/// `$TMPDIR`, else `/tmp`, each under an app- and uid-scoped directory.
pub fn default_socket_path() -> PathBuf {
    let uid = unsafe { libc::getuid() };
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join(APP_NAME).join("daemon.sock");
    }
    if let Ok(tmpdir) = std::env::var("TMPDIR") {
        return PathBuf::from(tmpdir).join(format!("{APP_NAME}-{uid}")).join("daemon.sock");
    }
    PathBuf::from("/tmp").join(format!("{APP_NAME}-{uid}")).join("daemon.sock")
}

/// Bind the listener at `path`, creating the parent directory at `0700`
/// and the socket file at `0600` (§6.1). A stale socket file from a
/// prior crash is removed before binding.
pub fn bind(path: &Path) -> Result<UnixListener> {
    use std::os::unix::fs::PermissionsExt;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
        std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700))?;
    }
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    let listener = UnixListener::bind(path)?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(listener)
}

/// Accept loop: one thread per connection, each handling newline-
/// delimited JSON messages until the peer disconnects (§6.1).
pub fn serve(listener: UnixListener, daemon: Arc<Daemon>) {
    for conn in listener.incoming() {
        match conn {
            Ok(stream) => {
                let daemon = daemon.clone();
                std::thread::spawn(move || handle_connection(stream, &daemon));
            }
            Err(err) => tracing::warn!(error = %err, "failed to accept IPC connection"),
        }
    }
}

fn handle_connection(stream: UnixStream, daemon: &Daemon) {
    let reader = BufReader::new(stream.try_clone().expect("failed to clone unix stream"));
    let mut writer = stream;

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(error = %err, "IPC connection read error");
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<IpcMessage>(&line) {
            Ok(IpcMessage::Ingest(event)) => {
                if let Err(err) = daemon.ingest(event) {
                    tracing::warn!(error = %err, "ingest failed");
                }
                None
            }
            Ok(IpcMessage::Suggest(req)) => Some(daemon.suggest(&req)),
            Err(err) => {
                tracing::warn!(error = %err, "malformed IPC message");
                Some(nextcmd_types::wire::SuggestResponse {
                    suggestions: Vec::new(),
                    error: Some(ErrorEnvelope::new(ErrorCode::EInvalidArgument, err.to_string(), false)),
                })
            }
        };

        if let Some(response) = response {
            let Ok(mut encoded) = serde_json::to_string(&response) else { continue };
            encoded.push('\n');
            if writer.write_all(encoded.as_bytes()).is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_sets_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("nested").join("daemon.sock");

        let _listener = bind(&socket_path).unwrap();

        let parent_mode = std::fs::metadata(socket_path.parent().unwrap()).unwrap().permissions().mode() & 0o777;
        assert_eq!(parent_mode, 0o700);
        let socket_mode = std::fs::metadata(&socket_path).unwrap().permissions().mode() & 0o777;
        assert_eq!(socket_mode, 0o600);
    }

    #[test]
    fn bind_removes_a_stale_socket_file() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("daemon.sock");
        std::fs::write(&socket_path, b"stale").unwrap();

        let result = bind(&socket_path);
        assert!(result.is_ok());
    }

    #[test]
    fn ingest_and_suggest_messages_are_distinguished_by_shape() {
        let ingest_json = r#"{"version":1,"type":"command_end","ts":1000,"session_id":"s1","shell":"zsh","cwd":"/repo","cmd_raw":"git status","exit_code":0}"#;
        let suggest_json = r#"{"session_id":"s1","cwd":"/repo","buffer":"git"}"#;

        assert!(matches!(serde_json::from_str::<IpcMessage>(ingest_json).unwrap(), IpcMessage::Ingest(_)));
        assert!(matches!(serde_json::from_str::<IpcMessage>(suggest_json).unwrap(), IpcMessage::Suggest(_)));
    }
}
