use nextcmd_types::{ProjectTask, TaskKind};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// Byte budget for a single manifest file (§4.8).
pub const MAX_MANIFEST_BYTES: usize = 64 * 1024;

/// Cooperative cancellation flag shared across a discovery run (§4.8
/// "discovery is cancellable").
#[derive(Default)]
pub struct Cancellation(AtomicBool);

impl Cancellation {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Parse well-known manifest files at `repo_root` into `ProjectTask`
/// rows (§4.8). Checked for cancellation between manifests; a caller
/// that cancels mid-scan gets whatever tasks were already collected.
pub fn discover(repo_root: &Path, repo_key: &str, now_ms: i64, cancel: &Cancellation) -> Vec<ProjectTask> {
    let mut tasks = Vec::new();

    let makefile = repo_root.join("Makefile");
    if makefile.is_file() {
        if let Some(content) = read_bounded(&makefile) {
            tasks.extend(parse_makefile(&content, repo_key, now_ms));
        }
    }
    if cancel.is_cancelled() {
        return tasks;
    }

    let package_json = repo_root.join("package.json");
    if package_json.is_file() {
        if let Some(content) = read_bounded(&package_json) {
            tasks.extend(parse_package_scripts(&content, repo_key, now_ms));
        }
    }

    tasks
}

/// Read up to `MAX_MANIFEST_BYTES`, truncating at the last line boundary
/// and warning if the file was oversize (§4.8).
fn read_bounded(path: &Path) -> Option<String> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "discovery: failed to read manifest");
            return None;
        }
    };

    if bytes.len() <= MAX_MANIFEST_BYTES {
        return String::from_utf8(bytes).ok();
    }

    tracing::warn!(
        path = %path.display(),
        size = bytes.len(),
        budget = MAX_MANIFEST_BYTES,
        "discovery: manifest exceeds byte budget, truncating at a line boundary"
    );
    let truncated = &bytes[..MAX_MANIFEST_BYTES];
    let cutoff = truncated.iter().rposition(|&b| b == b'\n').unwrap_or(truncated.len());
    String::from_utf8(truncated[..cutoff].to_vec()).ok()
}

/// Non-phony, non-pattern, user-defined targets (§4.8). Special targets
/// (leading `.`, e.g. `.PHONY`) and pattern rules (containing `%`) are
/// skipped; everything else naming a target before a bare `:` is kept.
fn parse_makefile(content: &str, repo_key: &str, now_ms: i64) -> Vec<ProjectTask> {
    let mut tasks = Vec::new();
    for line in content.lines() {
        if line.starts_with([' ', '\t']) || line.starts_with('#') {
            continue;
        }
        let Some((name, rest)) = line.split_once(':') else { continue };
        if rest.starts_with('=') {
            continue;
        }
        let name = name.trim();
        if name.is_empty() || name.starts_with('.') || name.contains('%') || name.contains('$') {
            continue;
        }
        tasks.push(ProjectTask {
            repo_key: repo_key.to_string(),
            kind: TaskKind::Makefile,
            name: name.to_string(),
            command: format!("make {name}"),
            description: None,
            discovered_ms: now_ms,
        });
    }
    tasks
}

/// `package.json` `scripts` entries, by name (§4.8).
fn parse_package_scripts(content: &str, repo_key: &str, now_ms: i64) -> Vec<ProjectTask> {
    let Ok(manifest) = serde_json::from_str::<serde_json::Value>(content) else {
        tracing::warn!("discovery: package.json is not valid JSON, skipping");
        return Vec::new();
    };
    let Some(scripts) = manifest.get("scripts").and_then(|v| v.as_object()) else {
        return Vec::new();
    };
    scripts
        .iter()
        .filter_map(|(name, command)| {
            let command = command.as_str()?;
            Some(ProjectTask {
                repo_key: repo_key.to_string(),
                kind: TaskKind::PackageScript,
                name: name.clone(),
                command: format!("npm run {name}"),
                description: Some(command.to_string()),
                discovered_ms: now_ms,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn makefile_skips_special_and_pattern_targets() {
        let content = ".PHONY: test\ntest:\n\tcargo test\n%.o: %.c\n\tcc -c $<\nbuild:\n\tcargo build\n";
        let tasks = parse_makefile(content, "r1", 1_000);
        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["test", "build"]);
    }

    #[test]
    fn makefile_skips_variable_assignment_lines() {
        let content = "CC := gcc\nbuild:\n\t$(CC) -o out main.c\n";
        let tasks = parse_makefile(content, "r1", 1_000);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "build");
    }

    #[test]
    fn package_scripts_are_read_by_name() {
        let content = r#"{"name": "x", "scripts": {"build": "tsc", "test": "jest"}}"#;
        let tasks = parse_package_scripts(content, "r1", 1_000);
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().any(|t| t.name == "build" && t.command == "npm run build"));
    }

    #[test]
    fn oversize_manifest_is_truncated_at_a_line_boundary() {
        let line = "build:\n\tcargo build\n";
        let content = line.repeat((MAX_MANIFEST_BYTES / line.len()) + 10);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Makefile");
        std::fs::write(&path, &content).unwrap();

        let read = read_bounded(&path).unwrap();
        assert!(read.len() <= MAX_MANIFEST_BYTES);
        assert!(read.ends_with('\n') || read.is_empty());
    }

    #[test]
    fn cancellation_stops_discovery_between_manifests() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Makefile"), "build:\n\tcargo build\n").unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{"scripts": {"test": "jest"}}"#).unwrap();

        let cancel = Cancellation::default();
        cancel.cancel();
        let tasks = discover(dir.path(), "r1", 1_000, &cancel);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].kind, TaskKind::Makefile);
    }
}
