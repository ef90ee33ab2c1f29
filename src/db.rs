// ==========================================
// 毕业设计师生互选系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 统一建表入口，库文件首次打开即可使用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开连接并确保 schema 就绪
pub fn open_and_migrate(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = open_sqlite_connection(db_path)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 建表（幂等）
///
/// 时间统一以 `%Y-%m-%d %H:%M:%S` 文本存储（本地时间）。
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS selection_event (
            event_id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_name TEXT NOT NULL,
            stu_start_time TEXT NOT NULL,
            stu_end_time TEXT NOT NULL,
            tea_start_time TEXT NOT NULL,
            tea_end_time TEXT NOT NULL,
            teacher_choice_limit INTEGER NOT NULL DEFAULT 5 CHECK(teacher_choice_limit >= 0),
            group_member_limit INTEGER NOT NULL DEFAULT 5 CHECK(group_member_limit >= 1),
            created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime'))
        );

        CREATE TABLE IF NOT EXISTS teacher (
            teacher_id INTEGER PRIMARY KEY AUTOINCREMENT,
            teacher_no TEXT NOT NULL UNIQUE,
            teacher_name TEXT NOT NULL,
            research_direction TEXT
        );

        CREATE TABLE IF NOT EXISTS event_teacher (
            event_id INTEGER NOT NULL REFERENCES selection_event(event_id) ON DELETE CASCADE,
            teacher_id INTEGER NOT NULL REFERENCES teacher(teacher_id) ON DELETE CASCADE,
            PRIMARY KEY (event_id, teacher_id)
        );

        CREATE TABLE IF NOT EXISTS student (
            stu_id INTEGER PRIMARY KEY AUTOINCREMENT,
            stu_no TEXT NOT NULL UNIQUE,
            stu_name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS event_student (
            event_id INTEGER NOT NULL REFERENCES selection_event(event_id) ON DELETE CASCADE,
            stu_id INTEGER NOT NULL REFERENCES student(stu_id) ON DELETE CASCADE,
            PRIMARY KEY (event_id, stu_id)
        );

        CREATE TABLE IF NOT EXISTS team (
            team_id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id INTEGER NOT NULL REFERENCES selection_event(event_id) ON DELETE CASCADE,
            team_name TEXT NOT NULL,
            project_title TEXT NOT NULL DEFAULT '',
            captain_id INTEGER REFERENCES student(stu_id) ON DELETE SET NULL,
            preferred_advisor_1 INTEGER REFERENCES teacher(teacher_id) ON DELETE SET NULL,
            preferred_advisor_2 INTEGER REFERENCES teacher(teacher_id) ON DELETE SET NULL,
            preferred_advisor_3 INTEGER REFERENCES teacher(teacher_id) ON DELETE SET NULL,
            advisor INTEGER REFERENCES teacher(teacher_id) ON DELETE SET NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
            UNIQUE (event_id, team_name)
        );
        CREATE INDEX IF NOT EXISTS idx_team_event ON team(event_id);

        CREATE TABLE IF NOT EXISTS team_membership (
            team_id INTEGER NOT NULL REFERENCES team(team_id) ON DELETE CASCADE,
            event_id INTEGER NOT NULL REFERENCES selection_event(event_id) ON DELETE CASCADE,
            stu_id INTEGER NOT NULL REFERENCES student(stu_id) ON DELETE CASCADE,
            date_joined TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
            PRIMARY KEY (team_id, stu_id),
            UNIQUE (event_id, stu_id)
        );

        CREATE TABLE IF NOT EXISTS teacher_group_preference (
            teacher_id INTEGER NOT NULL REFERENCES teacher(teacher_id) ON DELETE CASCADE,
            team_id INTEGER NOT NULL REFERENCES team(team_id) ON DELETE CASCADE,
            event_id INTEGER NOT NULL REFERENCES selection_event(event_id) ON DELETE CASCADE,
            preference_rank INTEGER NOT NULL CHECK(preference_rank >= 1),
            PRIMARY KEY (teacher_id, team_id),
            UNIQUE (teacher_id, event_id, preference_rank)
        );
        CREATE INDEX IF NOT EXISTS idx_pref_event ON teacher_group_preference(event_id);

        CREATE TABLE IF NOT EXISTS provisional_assignment (
            event_id INTEGER NOT NULL REFERENCES selection_event(event_id) ON DELETE CASCADE,
            team_id INTEGER NOT NULL REFERENCES team(team_id) ON DELETE CASCADE,
            teacher_id INTEGER NOT NULL REFERENCES teacher(teacher_id) ON DELETE CASCADE,
            assignment_type TEXT NOT NULL CHECK(assignment_type IN ('auto', 'manual')),
            score REAL NOT NULL DEFAULT 0,
            explanation TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
            PRIMARY KEY (event_id, team_id)
        );
        CREATE INDEX IF NOT EXISTS idx_pa_teacher ON provisional_assignment(event_id, teacher_id);

        CREATE TABLE IF NOT EXISTS action_log (
            action_id TEXT PRIMARY KEY,
            event_id INTEGER,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor TEXT NOT NULL,
            payload_json TEXT,
            detail TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_action_log_event ON action_log(event_id, action_ts DESC);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);

        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }
}
