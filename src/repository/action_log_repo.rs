// ==========================================
// 毕业设计师生互选系统 - 操作日志数据仓储
// ==========================================
// 红线: 所有改变草稿台账或权威导师字段的操作必须记录
// ==========================================

use crate::domain::action_log::{ActionLog, ActionType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{format_ts, read_ts};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ActionLogRepository - 操作日志仓储
// ==========================================
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    /// 创建新的操作日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入操作日志
    ///
    /// # 返回
    /// - `Ok(action_id)`: 成功插入
    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        insert_action_log(&conn, log)?;
        Ok(log.action_id.clone())
    }

    /// 查询活动的操作日志（最新在前）
    pub fn list_by_event(&self, event_id: i64, limit: usize) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, event_id, action_type, action_ts, actor, payload_json, detail
            FROM action_log
            WHERE event_id = ?1
            ORDER BY action_ts DESC, rowid DESC
            LIMIT ?2
            "#,
        )?;

        let logs = stmt
            .query_map(params![event_id, limit as i64], |row| {
                let action_type_raw: String = row.get(2)?;
                let action_type = ActionType::parse(&action_type_raw).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        2,
                        rusqlite::types::Type::Text,
                        format!("未知操作类型: {}", action_type_raw).into(),
                    )
                })?;
                let payload_raw: Option<String> = row.get(5)?;
                Ok(ActionLog {
                    action_id: row.get(0)?,
                    event_id: row.get(1)?,
                    action_type,
                    action_ts: read_ts(row, 3)?,
                    actor: row.get(4)?,
                    payload_json: payload_raw.and_then(|s| serde_json::from_str(&s).ok()),
                    detail: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(logs)
    }
}

/// 在调用方的连接（通常是业务写入所在的事务）上写入操作日志
///
/// 业务写入与日志写入共用同一事务：日志写入失败时业务写入随事务一起回滚。
pub(crate) fn insert_action_log(conn: &Connection, log: &ActionLog) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO action_log (
            action_id, event_id, action_type, action_ts, actor, payload_json, detail
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            log.action_id,
            log.event_id,
            log.action_type.as_str(),
            format_ts(log.action_ts),
            log.actor,
            log.payload_json.as_ref().map(|v| v.to_string()),
            log.detail,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    #[test]
    fn test_insert_and_list_by_event() {
        let repo = ActionLogRepository::new(setup_test_db());

        let log = ActionLog::now(
            7,
            ActionType::AutoAssign,
            "admin",
            Some(json!({"assigned_count": 3})),
            "自动分配完成",
        );
        let id = repo.insert(&log).unwrap();
        assert_eq!(id, log.action_id);

        repo.insert(&ActionLog::now(8, ActionType::Publish, "admin", None, "其他活动"))
            .unwrap();

        let logs = repo.list_by_event(7, 10).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action_type, ActionType::AutoAssign);
        assert_eq!(logs[0].actor, "admin");
        assert_eq!(
            logs[0].payload_json.as_ref().unwrap()["assigned_count"],
            json!(3)
        );
    }

    #[test]
    fn test_list_by_event_respects_limit() {
        let repo = ActionLogRepository::new(setup_test_db());
        for _ in 0..5 {
            repo.insert(&ActionLog::now(1, ActionType::ManualAssign, "admin", None, "调整"))
                .unwrap();
        }
        assert_eq!(repo.list_by_event(1, 3).unwrap().len(), 3);
    }
}
