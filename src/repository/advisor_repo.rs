// ==========================================
// 毕业设计师生互选系统 - 导师与导师志愿数据仓储
// ==========================================
// 职责: teacher / teacher_group_preference 表的数据访问
// 约束: 导师重新提交志愿时，旧记录删除 + 新记录插入 + 操作日志在同一事务内完成
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::domain::advisor::{Teacher, TeacherPreference};
use crate::repository::action_log_repo::insert_action_log;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::sync::{Arc, Mutex};

// ==========================================
// TeacherRepository - 导师仓储
// ==========================================
pub struct TeacherRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TeacherRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新建导师
    pub fn insert(
        &self,
        teacher_no: &str,
        teacher_name: &str,
        research_direction: Option<&str>,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO teacher (teacher_no, teacher_name, research_direction) VALUES (?1, ?2, ?3)",
            params![teacher_no, teacher_name, research_direction],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按ID查询导师
    pub fn find_by_id(&self, teacher_id: i64) -> RepositoryResult<Option<Teacher>> {
        let conn = self.get_conn()?;
        let teacher = conn
            .query_row(
                r#"
                SELECT teacher_id, teacher_no, teacher_name, research_direction
                FROM teacher
                WHERE teacher_id = ?1
                "#,
                params![teacher_id],
                |row| {
                    Ok(Teacher {
                        teacher_id: row.get(0)?,
                        teacher_no: row.get(1)?,
                        teacher_name: row.get(2)?,
                        research_direction: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(teacher)
    }
}

// ==========================================
// TeacherPreferenceRepository - 导师志愿仓储
// ==========================================
pub struct TeacherPreferenceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TeacherPreferenceRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 整体替换导师在某活动中的志愿
    ///
    /// 先删除 (teacher, event) 的全部旧志愿，再批量插入新志愿；
    /// 任一插入失败（如唯一约束冲突）则整体回滚，旧志愿保持不变。
    ///
    /// # 参数
    /// - entries: (preference_rank, team_id) 列表
    /// - audit: 以插入条数构造操作日志
    ///
    /// # 返回
    /// - Ok(count): 插入的志愿条数
    pub fn replace_for_teacher(
        &self,
        event_id: i64,
        teacher_id: i64,
        entries: &[(i64, i64)],
        audit: impl FnOnce(usize) -> ActionLog,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "DELETE FROM teacher_group_preference WHERE teacher_id = ?1 AND event_id = ?2",
            params![teacher_id, event_id],
        )?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO teacher_group_preference (teacher_id, team_id, event_id, preference_rank)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            for (rank, team_id) in entries {
                stmt.execute(params![teacher_id, team_id, event_id, rank])?;
                count += 1;
            }
        }

        insert_action_log(&tx, &audit(count))?;
        tx.commit()?;
        Ok(count)
    }

    /// 查询活动内全部导师志愿（按导师、志愿顺序排序）
    pub fn list_by_event(&self, event_id: i64) -> RepositoryResult<Vec<TeacherPreference>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT teacher_id, team_id, event_id, preference_rank
            FROM teacher_group_preference
            WHERE event_id = ?1
            ORDER BY teacher_id, preference_rank
            "#,
        )?;
        let rows = stmt
            .query_map(params![event_id], map_preference_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 查询单个导师在活动内的志愿（按志愿顺序）
    pub fn list_by_teacher(
        &self,
        event_id: i64,
        teacher_id: i64,
    ) -> RepositoryResult<Vec<TeacherPreference>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT teacher_id, team_id, event_id, preference_rank
            FROM teacher_group_preference
            WHERE event_id = ?1 AND teacher_id = ?2
            ORDER BY preference_rank
            "#,
        )?;
        let rows = stmt
            .query_map(params![event_id, teacher_id], map_preference_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn map_preference_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TeacherPreference> {
    Ok(TeacherPreference {
        teacher_id: row.get(0)?,
        team_id: row.get(1)?,
        event_id: row.get(2)?,
        preference_rank: row.get(3)?,
    })
}
