// ==========================================
// 毕业设计师生互选系统 - 团队数据仓储
// ==========================================
// 职责: team / team_membership / student 表的数据访问
// 红线: team.advisor 只能由发布流程写入（见 ProvisionalAssignmentRepository）
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::domain::team::{Team, TeamMember, PREFERRED_ADVISOR_SLOTS};
use crate::repository::action_log_repo::insert_action_log;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::read_ts;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::sync::{Arc, Mutex};

const TEAM_COLUMNS: &str = r#"
    team_id, event_id, team_name, project_title, captain_id,
    preferred_advisor_1, preferred_advisor_2, preferred_advisor_3,
    advisor, created_at
"#;

// ==========================================
// TeamRepository - 团队仓储
// ==========================================
pub struct TeamRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TeamRepository {
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

    /// 新建学生
    pub fn insert_student(&self, stu_no: &str, stu_name: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO student (stu_no, stu_name) VALUES (?1, ?2)",
            params![stu_no, stu_name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 新建团队，并把队长登记为首位成员（同一事务）
    ///
    /// # 返回
    /// - Ok(team_id)
    pub fn create_with_captain(
        &self,
        event_id: i64,
        team_name: &str,
        project_title: &str,
        captain_id: i64,
        preferred: &[Option<i64>; PREFERRED_ADVISOR_SLOTS],
    ) -> RepositoryResult<i64> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            r#"
            INSERT INTO team (
                event_id, team_name, project_title, captain_id,
                preferred_advisor_1, preferred_advisor_2, preferred_advisor_3
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                event_id,
                team_name,
                project_title,
                captain_id,
                preferred[0],
                preferred[1],
                preferred[2],
            ],
        )?;
        let team_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO team_membership (team_id, event_id, stu_id) VALUES (?1, ?2, ?3)",
            params![team_id, event_id, captain_id],
        )?;

        tx.commit()?;
        Ok(team_id)
    }

    /// 添加成员
    ///
    /// 同一活动内学生只能加入一个团队，由 (event_id, stu_id) 唯一约束保证。
    pub fn add_member(&self, team_id: i64, event_id: i64, stu_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO team_membership (team_id, event_id, stu_id) VALUES (?1, ?2, ?3)",
            params![team_id, event_id, stu_id],
        )?;
        Ok(())
    }

    /// 更新团队志愿导师三个槽位（与操作日志同一事务）
    pub fn update_preferred_advisors(
        &self,
        team_id: i64,
        preferred: &[Option<i64>; PREFERRED_ADVISOR_SLOTS],
        audit: &ActionLog,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let rows = tx.execute(
            r#"
            UPDATE team
            SET preferred_advisor_1 = ?1,
                preferred_advisor_2 = ?2,
                preferred_advisor_3 = ?3
            WHERE team_id = ?4
            "#,
            params![preferred[0], preferred[1], preferred[2], team_id],
        )?;

        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Team".to_string(),
                id: team_id.to_string(),
            });
        }
        insert_action_log(&tx, audit)?;
        tx.commit()?;
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查询团队
    pub fn find_by_id(&self, team_id: i64) -> RepositoryResult<Option<Team>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM team WHERE team_id = ?1", TEAM_COLUMNS);
        let team = conn
            .query_row(&sql, params![team_id], map_team_row)
            .optional()?;
        Ok(team)
    }

    /// 查询活动内全部团队（按创建顺序：created_at, team_id）
    pub fn list_by_event(&self, event_id: i64) -> RepositoryResult<Vec<Team>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM team WHERE event_id = ?1 ORDER BY created_at, team_id",
            TEAM_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let teams = stmt
            .query_map(params![event_id], map_team_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(teams)
    }

    /// 查询导师在活动内最终指导的团队（权威字段）
    pub fn list_by_advisor(&self, event_id: i64, teacher_id: i64) -> RepositoryResult<Vec<Team>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM team WHERE event_id = ?1 AND advisor = ?2 ORDER BY created_at, team_id",
            TEAM_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let teams = stmt
            .query_map(params![event_id, teacher_id], map_team_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(teams)
    }

    /// 查询团队成员（队长在前）
    pub fn list_members(&self, team_id: i64) -> RepositoryResult<Vec<TeamMember>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT s.stu_id, s.stu_no, s.stu_name,
                   CASE WHEN t.captain_id = s.stu_id THEN 1 ELSE 0 END AS is_captain
            FROM team_membership m
            JOIN student s ON s.stu_id = m.stu_id
            JOIN team t ON t.team_id = m.team_id
            WHERE m.team_id = ?1
            ORDER BY is_captain DESC, m.date_joined, s.stu_id
            "#,
        )?;
        let members = stmt
            .query_map(params![team_id], |row| {
                Ok(TeamMember {
                    stu_id: row.get(0)?,
                    stu_no: row.get(1)?,
                    stu_name: row.get(2)?,
                    is_captain: row.get::<_, i64>(3)? == 1,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(members)
    }

    /// 团队当前成员数（含队长）
    pub fn count_members(&self, team_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM team_membership WHERE team_id = ?1",
            params![team_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 学生在活动内所在团队
    pub fn find_team_of_student(&self, event_id: i64, stu_id: i64) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let team_id = conn
            .query_row(
                "SELECT team_id FROM team_membership WHERE event_id = ?1 AND stu_id = ?2",
                params![event_id, stu_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(team_id)
    }
}

fn map_team_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        team_id: row.get(0)?,
        event_id: row.get(1)?,
        team_name: row.get(2)?,
        project_title: row.get(3)?,
        captain_id: row.get(4)?,
        preferred_advisors: [row.get(5)?, row.get(6)?, row.get(7)?],
        advisor: row.get(8)?,
        created_at: read_ts(row, 9)?,
    })
}
