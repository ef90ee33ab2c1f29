// ==========================================
// 毕业设计师生互选系统 - 互选活动数据仓储
// ==========================================
// 职责: selection_event / event_teacher / event_student 表的数据访问
// ==========================================

use crate::domain::advisor::Teacher;
use crate::domain::event::SelectionEvent;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{format_ts, read_ts};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// SelectionEventRepository - 互选活动仓储
// ==========================================
pub struct SelectionEventRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SelectionEventRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新建活动
    ///
    /// # 返回
    /// - Ok(event_id): 新活动ID
    pub fn insert(&self, event: &SelectionEvent) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO selection_event (
                event_name, stu_start_time, stu_end_time,
                tea_start_time, tea_end_time,
                teacher_choice_limit, group_member_limit
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                event.event_name,
                format_ts(event.stu_start_time),
                format_ts(event.stu_end_time),
                format_ts(event.tea_start_time),
                format_ts(event.tea_end_time),
                event.teacher_choice_limit,
                event.group_member_limit,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// 按ID查询活动
    pub fn find_by_id(&self, event_id: i64) -> RepositoryResult<Option<SelectionEvent>> {
        let conn = self.get_conn()?;

        let event = conn
            .query_row(
                r#"
                SELECT event_id, event_name, stu_start_time, stu_end_time,
                       tea_start_time, tea_end_time,
                       teacher_choice_limit, group_member_limit
                FROM selection_event
                WHERE event_id = ?1
                "#,
                params![event_id],
                map_event_row,
            )
            .optional()?;

        Ok(event)
    }

    /// 按ID查询活动（不存在则返回 NotFound）
    pub fn get(&self, event_id: i64) -> RepositoryResult<SelectionEvent> {
        self.find_by_id(event_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "SelectionEvent".to_string(),
                id: event_id.to_string(),
            })
    }

    // ==========================================
    // 参与者
    // ==========================================

    /// 添加参与导师（幂等）
    pub fn add_teacher(&self, event_id: i64, teacher_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO event_teacher (event_id, teacher_id) VALUES (?1, ?2)",
            params![event_id, teacher_id],
        )?;
        Ok(())
    }

    /// 添加参与学生（幂等）
    pub fn add_student(&self, event_id: i64, stu_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO event_student (event_id, stu_id) VALUES (?1, ?2)",
            params![event_id, stu_id],
        )?;
        Ok(())
    }

    /// 查询活动的参与导师（按 teacher_id 升序）
    pub fn list_teachers(&self, event_id: i64) -> RepositoryResult<Vec<Teacher>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT t.teacher_id, t.teacher_no, t.teacher_name, t.research_direction
            FROM event_teacher et
            JOIN teacher t ON t.teacher_id = et.teacher_id
            WHERE et.event_id = ?1
            ORDER BY t.teacher_id
            "#,
        )?;

        let teachers = stmt
            .query_map(params![event_id], |row| {
                Ok(Teacher {
                    teacher_id: row.get(0)?,
                    teacher_no: row.get(1)?,
                    teacher_name: row.get(2)?,
                    research_direction: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(teachers)
    }

    /// 导师是否参与该活动
    pub fn is_teacher_participant(&self, event_id: i64, teacher_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let hit = conn
            .query_row(
                "SELECT 1 FROM event_teacher WHERE event_id = ?1 AND teacher_id = ?2",
                params![event_id, teacher_id],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(hit)
    }

    /// 学生是否参与该活动
    pub fn is_student_participant(&self, event_id: i64, stu_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let hit = conn
            .query_row(
                "SELECT 1 FROM event_student WHERE event_id = ?1 AND stu_id = ?2",
                params![event_id, stu_id],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(hit)
    }

    /// 查询导师参与过且两侧窗口都已结束的活动（按教师截止时间倒序）
    pub fn list_ended_for_teacher(
        &self,
        teacher_id: i64,
        now: NaiveDateTime,
    ) -> RepositoryResult<Vec<SelectionEvent>> {
        let conn = self.get_conn()?;
        let now_str = format_ts(now);

        let mut stmt = conn.prepare(
            r#"
            SELECT e.event_id, e.event_name, e.stu_start_time, e.stu_end_time,
                   e.tea_start_time, e.tea_end_time,
                   e.teacher_choice_limit, e.group_member_limit
            FROM selection_event e
            JOIN event_teacher et ON et.event_id = e.event_id
            WHERE et.teacher_id = ?1
              AND e.stu_end_time <= ?2
              AND e.tea_end_time <= ?2
            ORDER BY e.tea_end_time DESC
            "#,
        )?;

        let events = stmt
            .query_map(params![teacher_id, now_str], map_event_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(events)
    }
}

fn map_event_row(row: &Row<'_>) -> rusqlite::Result<SelectionEvent> {
    Ok(SelectionEvent {
        event_id: row.get(0)?,
        event_name: row.get(1)?,
        stu_start_time: read_ts(row, 2)?,
        stu_end_time: read_ts(row, 3)?,
        tea_start_time: read_ts(row, 4)?,
        tea_end_time: read_ts(row, 5)?,
        teacher_choice_limit: row.get(6)?,
        group_member_limit: row.get(7)?,
    })
}
