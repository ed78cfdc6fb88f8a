use crate::error::Result;
use nextcmd_types::{ProjectTask, TaskKind};
use rusqlite::{params, Connection};

fn kind_to_str(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::Makefile => "makefile",
        TaskKind::PackageScript => "package_script",
    }
}

fn kind_from_str(s: &str) -> TaskKind {
    match s {
        "package_script" => TaskKind::PackageScript,
        _ => TaskKind::Makefile,
    }
}

/// Replace all discovered tasks for a repo (§4.8: "repopulated on
/// manifest change"). Runs as delete-then-insert inside one
/// transaction so a partial discovery never leaves stale entries
/// mixed with fresh ones.
pub fn replace_for_repo(conn: &Connection, repo_key: &str, tasks: &[ProjectTask]) -> Result<()> {
    conn.execute("DELETE FROM project_tasks WHERE repo_key = ?1", params![repo_key])?;
    for task in tasks {
        conn.execute(
            "INSERT INTO project_tasks (repo_key, kind, name, command, description, discovered_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                task.repo_key,
                kind_to_str(task.kind),
                task.name,
                task.command,
                task.description,
                task.discovered_ms,
            ],
        )?;
    }
    Ok(())
}

pub fn for_repo(conn: &Connection, repo_key: &str) -> Result<Vec<ProjectTask>> {
    let mut stmt = conn.prepare_cached(
        "SELECT repo_key, kind, name, command, description, discovered_ms
         FROM project_tasks WHERE repo_key = ?1",
    )?;
    let rows = stmt.query_map(params![repo_key], |row| {
        let kind: String = row.get(1)?;
        Ok(ProjectTask {
            repo_key: row.get(0)?,
            kind: kind_from_str(&kind),
            name: row.get(2)?,
            command: row.get(3)?,
            description: row.get(4)?,
            discovered_ms: row.get(5)?,
        })
    })?;
    rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}
