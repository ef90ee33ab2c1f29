// ==========================================
// 毕业设计师生互选系统 - 临时分配（草稿台账）数据仓储
// ==========================================
// 职责: provisional_assignment 表读写 + 发布到 team.advisor
// 约束:
// - 自动分配: 删除活动全部草稿 + 批量插入，单事务
// - 手动调整: 删除团队草稿 + 容量校验 + 插入，单事务（校验失败整体回滚）
// - 发布: 清空权威字段 + 判空 + 回放草稿，单事务（判空失败整体回滚）
// - 每个写入方法的 action_log 与业务写入在同一事务内提交
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::domain::assignment::{AssignmentView, ProvisionalAssignment};
use crate::domain::types::AssignmentType;
use crate::repository::action_log_repo::insert_action_log;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// ProvisionalAssignmentRepository - 草稿台账仓储
// ==========================================
pub struct ProvisionalAssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProvisionalAssignmentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 整体替换活动草稿
    ///
    /// # 参数
    /// - audit: 以插入条数构造操作日志，随草稿同事务写入
    ///
    /// # 返回
    /// - Ok(count): 插入条数
    pub fn replace_for_event(
        &self,
        event_id: i64,
        assignments: &[ProvisionalAssignment],
        audit: impl FnOnce(usize) -> ActionLog,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "DELETE FROM provisional_assignment WHERE event_id = ?1",
            params![event_id],
        )?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO provisional_assignment (
                    event_id, team_id, teacher_id, assignment_type, score, explanation
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;
            for a in assignments {
                if a.event_id != event_id {
                    return Err(RepositoryError::ValidationError(format!(
                        "草稿记录 event_id={} 与目标活动 {} 不一致",
                        a.event_id, event_id
                    )));
                }
                stmt.execute(params![
                    a.event_id,
                    a.team_id,
                    a.teacher_id,
                    a.assignment_type.to_db_str(),
                    a.score,
                    a.explanation,
                ])?;
                count += 1;
            }
        }

        insert_action_log(&tx, &audit(count))?;
        tx.commit()?;
        Ok(count)
    }

    /// 手动调整单个团队的草稿
    ///
    /// 先删除该团队已有草稿；若 `assignment` 为 Some，则在同一事务内统计导师当前草稿负载，
    /// 负载 >= capacity_limit 时返回 CapacityExceeded 并回滚（草稿保持原样）。
    ///
    /// # 返回
    /// - Ok(removed): 被删除的旧草稿条数（0 或 1）
    pub fn assign_manual(
        &self,
        event_id: i64,
        team_id: i64,
        assignment: Option<(&ProvisionalAssignment, i64)>,
        audit: impl FnOnce(usize) -> ActionLog,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let removed = tx.execute(
            "DELETE FROM provisional_assignment WHERE event_id = ?1 AND team_id = ?2",
            params![event_id, team_id],
        )?;

        if let Some((a, capacity_limit)) = assignment {
            let current_load: i64 = tx.query_row(
                "SELECT COUNT(*) FROM provisional_assignment WHERE event_id = ?1 AND teacher_id = ?2",
                params![event_id, a.teacher_id],
                |row| row.get(0),
            )?;

            if current_load >= capacity_limit {
                // tx 未提交即 drop => 回滚，删除动作一并撤销
                return Err(RepositoryError::CapacityExceeded {
                    teacher_id: a.teacher_id,
                    limit: capacity_limit,
                    current_load,
                });
            }

            tx.execute(
                r#"
                INSERT INTO provisional_assignment (
                    event_id, team_id, teacher_id, assignment_type, score, explanation
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    event_id,
                    team_id,
                    a.teacher_id,
                    a.assignment_type.to_db_str(),
                    a.score,
                    a.explanation,
                ],
            )?;
        }

        insert_action_log(&tx, &audit(removed))?;
        tx.commit()?;
        Ok(removed)
    }

    /// 清空活动全部草稿（不触碰 team.advisor）
    pub fn clear_event(
        &self,
        event_id: i64,
        audit: impl FnOnce(usize) -> ActionLog,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let rows = tx.execute(
            "DELETE FROM provisional_assignment WHERE event_id = ?1",
            params![event_id],
        )?;
        insert_action_log(&tx, &audit(rows))?;
        tx.commit()?;
        Ok(rows)
    }

    // ==========================================
    // 发布
    // ==========================================

    /// 发布草稿到权威字段
    ///
    /// 步骤（单事务）:
    /// 1. 清空活动内所有团队的 advisor
    /// 2. 草稿为空 => 返回 BusinessRuleViolation，事务回滚（权威字段保持发布前状态）
    /// 3. 按草稿逐条写回 team.advisor
    /// 4. 写入操作日志
    ///
    /// 草稿台账本身不做任何修改。
    ///
    /// # 返回
    /// - Ok(count): 写入的团队数
    pub fn publish_to_teams(
        &self,
        event_id: i64,
        audit: impl FnOnce(usize) -> ActionLog,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "UPDATE team SET advisor = NULL WHERE event_id = ?1",
            params![event_id],
        )?;

        let draft_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM provisional_assignment WHERE event_id = ?1",
            params![event_id],
            |row| row.get(0),
        )?;
        if draft_count == 0 {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "活动(id={})没有临时分配结果，无法发布",
                event_id
            )));
        }

        let published = tx.execute(
            r#"
            UPDATE team
            SET advisor = (
                SELECT pa.teacher_id
                FROM provisional_assignment pa
                WHERE pa.event_id = team.event_id AND pa.team_id = team.team_id
            )
            WHERE event_id = ?1
              AND team_id IN (SELECT team_id FROM provisional_assignment WHERE event_id = ?1)
            "#,
            params![event_id],
        )?;

        insert_action_log(&tx, &audit(published))?;
        tx.commit()?;
        Ok(published)
    }

    /// 撤销发布：清空活动内所有团队的 advisor（草稿不变）
    pub fn reset_publication(
        &self,
        event_id: i64,
        audit: impl FnOnce(usize) -> ActionLog,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let rows = tx.execute(
            "UPDATE team SET advisor = NULL WHERE event_id = ?1 AND advisor IS NOT NULL",
            params![event_id],
        )?;
        insert_action_log(&tx, &audit(rows))?;
        tx.commit()?;
        Ok(rows)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 查询活动草稿（原始记录，按 team_id）
    pub fn list_by_event(&self, event_id: i64) -> RepositoryResult<Vec<ProvisionalAssignment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT event_id, team_id, teacher_id, assignment_type, score, explanation
            FROM provisional_assignment
            WHERE event_id = ?1
            ORDER BY team_id
            "#,
        )?;
        let rows = stmt
            .query_map(params![event_id], map_assignment_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 查询团队草稿
    pub fn find_by_team(
        &self,
        event_id: i64,
        team_id: i64,
    ) -> RepositoryResult<Option<ProvisionalAssignment>> {
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                r#"
                SELECT event_id, team_id, teacher_id, assignment_type, score, explanation
                FROM provisional_assignment
                WHERE event_id = ?1 AND team_id = ?2
                "#,
                params![event_id, team_id],
                map_assignment_row,
            )
            .optional()?;
        Ok(row)
    }

    /// 查询活动草稿展示视图（分数降序，手动调整排在最前）
    pub fn list_views(&self, event_id: i64) -> RepositoryResult<Vec<AssignmentView>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT pa.event_id, pa.team_id, tm.team_name, tm.project_title,
                   pa.teacher_id, t.teacher_no, t.teacher_name,
                   pa.score, pa.explanation, pa.assignment_type
            FROM provisional_assignment pa
            JOIN team tm ON tm.team_id = pa.team_id
            JOIN teacher t ON t.teacher_id = pa.teacher_id
            WHERE pa.event_id = ?1
            ORDER BY pa.score DESC, tm.created_at, pa.team_id
            "#,
        )?;
        let rows = stmt
            .query_map(params![event_id], |row| {
                Ok(AssignmentView {
                    event_id: row.get(0)?,
                    team_id: row.get(1)?,
                    team_name: row.get(2)?,
                    project_title: row.get(3)?,
                    teacher_id: row.get(4)?,
                    teacher_no: row.get(5)?,
                    teacher_name: row.get(6)?,
                    score: row.get(7)?,
                    explanation: row.get(8)?,
                    assignment_type: read_assignment_type(row, 9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 各导师当前草稿负载（teacher_id -> 团队数）
    pub fn load_by_teacher(&self, event_id: i64) -> RepositoryResult<HashMap<i64, i64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT teacher_id, COUNT(*)
            FROM provisional_assignment
            WHERE event_id = ?1
            GROUP BY teacher_id
            "#,
        )?;
        let rows = stmt
            .query_map(params![event_id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(rows)
    }
}

fn read_assignment_type(row: &Row<'_>, idx: usize) -> rusqlite::Result<AssignmentType> {
    let raw: String = row.get(idx)?;
    AssignmentType::from_db_str(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("未知分配类型: {}", raw).into(),
        )
    })
}

fn map_assignment_row(row: &Row<'_>) -> rusqlite::Result<ProvisionalAssignment> {
    Ok(ProvisionalAssignment {
        event_id: row.get(0)?,
        team_id: row.get(1)?,
        teacher_id: row.get(2)?,
        assignment_type: read_assignment_type(row, 3)?,
        score: row.get(4)?,
        explanation: row.get(5)?,
    })
}
