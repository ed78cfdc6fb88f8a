use crate::error::Result;
use nextcmd_types::{Session, ShellKind};
use rusqlite::{params, Connection, OptionalExtension};

fn shell_to_str(shell: ShellKind) -> &'static str {
    match shell {
        ShellKind::Bash => "bash",
        ShellKind::Zsh => "zsh",
        ShellKind::Fish => "fish",
        ShellKind::Other => "other",
    }
}

fn shell_from_str(s: &str) -> ShellKind {
    match s {
        "bash" => ShellKind::Bash,
        "zsh" => ShellKind::Zsh,
        "fish" => ShellKind::Fish,
        _ => ShellKind::Other,
    }
}

/// Insert the session row if it doesn't already exist (§3 Session:
/// "created on first event; never mutated after creation except for an
/// end timestamp").
pub fn ensure_exists(conn: &Connection, session: &Session) -> Result<()> {
    conn.execute(
        "INSERT INTO sessions (id, shell, start_ts, end_ts, host, user, os)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO NOTHING",
        params![
            session.session_id,
            shell_to_str(session.shell),
            session.start_ts,
            session.end_ts,
            session.host,
            session.user,
            session.os,
        ],
    )?;
    Ok(())
}

pub fn end_session(conn: &Connection, session_id: &str, end_ts: i64) -> Result<()> {
    conn.execute(
        "UPDATE sessions SET end_ts = ?2 WHERE id = ?1",
        params![session_id, end_ts],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, session_id: &str) -> Result<Option<Session>> {
    let session = conn
        .query_row(
            "SELECT id, shell, start_ts, end_ts, host, user, os FROM sessions WHERE id = ?1",
            params![session_id],
            |row| {
                Ok(Session {
                    session_id: row.get(0)?,
                    shell: shell_from_str(&row.get::<_, String>(1)?),
                    start_ts: row.get(2)?,
                    end_ts: row.get(3)?,
                    host: row.get(4)?,
                    user: row.get(5)?,
                    os: row.get(6)?,
                })
            },
        )
        .optional()?;
    Ok(session)
}
