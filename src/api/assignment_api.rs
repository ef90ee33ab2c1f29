// ==========================================
// 毕业设计师生互选系统 - 分配管理 API
// ==========================================
// 职责: 自动分配、草稿台账查询/手动调整/清空、发布/撤销发布、候选诊断
// 约束:
// - 前置条件全部在写入前校验，失败时不产生任何写入
// - 同一活动的变更操作经 EventLockRegistry 串行执行
// - 每个变更操作的 action_log 与业务写入在同一事务内提交
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::api::dto::{
    AutoAssignResponse, ClearAssignmentsResponse, ManualAssignResponse, PublishResponse,
    ResetPublicationResponse, TeamMatchOptions,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::event_lock::EventLockRegistry;
use crate::config::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::advisor::Teacher;
use crate::domain::assignment::{AssignmentView, ProvisionalAssignment};
use crate::domain::event::SelectionEvent;
use crate::domain::team::Team;
use crate::engine::allocator::AllocationEngine;
use crate::engine::recommendation::match_options_for_team;
use crate::engine::scoring::{MatchScorer, PreferenceIndex};
use crate::repository::{
    ActionLogRepository, ProvisionalAssignmentRepository, RepositoryError,
    SelectionEventRepository, TeacherPreferenceRepository, TeacherRepository, TeamRepository,
};

// ==========================================
// AssignmentApi - 分配管理 API
// ==========================================

/// 分配管理API
///
/// 职责：
/// 1. 自动分配（三阶段）写入草稿台账
/// 2. 草稿台账查询、手动调整、清空
/// 3. 发布草稿到团队权威导师字段、撤销发布
/// 4. 候选导师诊断（只读）
/// 5. ActionLog记录
pub struct AssignmentApi {
    event_repo: Arc<SelectionEventRepository>,
    team_repo: Arc<TeamRepository>,
    teacher_repo: Arc<TeacherRepository>,
    preference_repo: Arc<TeacherPreferenceRepository>,
    assignment_repo: Arc<ProvisionalAssignmentRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    config_manager: Arc<ConfigManager>,
    event_locks: Arc<EventLockRegistry>,
}

impl AssignmentApi {
    /// 创建新的AssignmentApi实例
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        event_repo: Arc<SelectionEventRepository>,
        team_repo: Arc<TeamRepository>,
        teacher_repo: Arc<TeacherRepository>,
        preference_repo: Arc<TeacherPreferenceRepository>,
        assignment_repo: Arc<ProvisionalAssignmentRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        config_manager: Arc<ConfigManager>,
        event_locks: Arc<EventLockRegistry>,
    ) -> Self {
        Self {
            event_repo,
            team_repo,
            teacher_repo,
            preference_repo,
            assignment_repo,
            action_log_repo,
            config_manager,
            event_locks,
        }
    }

    // ==========================================
    // 自动分配
    // ==========================================

    /// 执行自动分配（以当前本地时间判定活动是否结束）
    pub fn run_auto_assign(&self, event_id: i64, operator: &str) -> ApiResult<AutoAssignResponse> {
        self.run_auto_assign_at(event_id, chrono::Local::now().naive_local(), operator)
    }

    /// 执行自动分配
    ///
    /// # 前置条件
    /// - 学生端、教师端窗口都已结束
    /// - 活动至少有一个团队、一位参与导师
    ///
    /// # 返回
    /// - Ok(AutoAssignResponse): 三阶段统计 + 超额导师告警
    /// - Err(ApiError::PreconditionFailed): 未做任何写入
    #[instrument(skip(self))]
    pub fn run_auto_assign_at(
        &self,
        event_id: i64,
        now: NaiveDateTime,
        operator: &str,
    ) -> ApiResult<AutoAssignResponse> {
        self.event_locks.with_event_lock(event_id, || {
            let event = self.event_repo.get(event_id)?;

            if !event.both_windows_closed(now) {
                return Err(ApiError::PreconditionFailed(format!(
                    "活动「{}」尚未结束（学生截止 {}，教师截止 {}），不能自动分配",
                    event.event_name, event.stu_end_time, event.tea_end_time
                )));
            }

            let teams = self.team_repo.list_by_event(event_id)?;
            if teams.is_empty() {
                return Err(ApiError::PreconditionFailed(format!(
                    "活动「{}」没有任何团队",
                    event.event_name
                )));
            }

            let teachers = self.event_repo.list_teachers(event_id)?;
            if teachers.is_empty() {
                return Err(ApiError::PreconditionFailed(format!(
                    "活动「{}」没有参与导师",
                    event.event_name
                )));
            }

            let preferences = self.preference_repo.list_by_event(event_id)?;
            let index = PreferenceIndex::from_preferences(&preferences);
            let engine = AllocationEngine::new(self.scorer_for(event_id)?);

            let seed = self
                .config_manager
                .get_shuffle_seed(Some(event_id))
                .map_err(|e| ApiError::InternalError(e.to_string()))?;
            let mut rng = match seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_entropy(),
            };

            let outcome = engine.allocate(
                event_id,
                &teams,
                &teachers,
                &index,
                event.teacher_choice_limit,
                &mut rng,
            );

            if outcome.over_capacity_count > 0 {
                warn!(
                    event_id,
                    over_capacity_count = outcome.over_capacity_count,
                    teachers = ?outcome.over_capacity_teachers,
                    "自动分配出现超额分配"
                );
            }

            let response = AutoAssignResponse::from_outcome(event_id, &outcome);

            let action_log = ActionLog::now(
                event_id,
                ActionType::AutoAssign,
                operator,
                Some(json!({
                    "total_teams": response.total_teams,
                    "total_teachers": response.total_teachers,
                    "assigned_count": response.assigned_count,
                    "preference_matched": response.preference_matched,
                    "random_assigned": response.random_assigned,
                    "over_capacity_count": response.over_capacity_count,
                    "over_capacity_teacher_ids": response.over_capacity_teacher_ids,
                    "shuffle_seed": seed,
                })),
                response.message.clone(),
            );
            self.assignment_repo
                .replace_for_event(event_id, &outcome.assignments(), move |_| action_log)?;

            info!(
                event_id,
                assigned_count = response.assigned_count,
                preference_matched = response.preference_matched,
                random_assigned = response.random_assigned,
                over_capacity_count = response.over_capacity_count,
                "自动分配完成"
            );

            Ok(response)
        })
    }

    // ==========================================
    // 草稿台账
    // ==========================================

    /// 查询活动的临时分配（手动调整在前，其余按分数降序）
    pub fn list_assignments(&self, event_id: i64) -> ApiResult<Vec<AssignmentView>> {
        self.event_repo.get(event_id)?;
        Ok(self.assignment_repo.list_views(event_id)?)
    }

    /// 手动调整团队的临时分配
    ///
    /// # 参数
    /// - teacher_id: Some => 指定导师（需参与活动且草稿负载未达上限）; None => 仅删除草稿
    ///
    /// # 返回
    /// - Err(ApiError::CapacityExceeded): 导师已满，草稿保持不变
    #[instrument(skip(self))]
    pub fn manual_assign(
        &self,
        event_id: i64,
        team_id: i64,
        teacher_id: Option<i64>,
        operator: &str,
    ) -> ApiResult<ManualAssignResponse> {
        self.event_locks.with_event_lock(event_id, || {
            let event = self.event_repo.get(event_id)?;
            let team = self.load_team_in_event(event_id, team_id)?;

            let message = match teacher_id {
                Some(tid) => format!("团队「{}」已手动分配给导师(id={})", team.team_name, tid),
                None => format!("团队「{}」的临时分配已移除", team.team_name),
            };
            let audit = |removed: usize| {
                ActionLog::now(
                    event_id,
                    ActionType::ManualAssign,
                    operator,
                    Some(json!({
                        "team_id": team_id,
                        "teacher_id": teacher_id,
                        "replaced_existing": removed > 0,
                    })),
                    message.clone(),
                )
            };

            let removed = match teacher_id {
                None => self.assignment_repo.assign_manual(event_id, team_id, None, audit)?,
                Some(tid) => {
                    let teacher = self.load_participating_teacher(event_id, tid)?;
                    let assignment = ProvisionalAssignment::manual(event_id, team_id, tid);
                    self.assignment_repo
                        .assign_manual(
                            event_id,
                            team_id,
                            Some((&assignment, event.teacher_choice_limit)),
                            audit,
                        )
                        .map_err(|e| match e {
                            RepositoryError::CapacityExceeded {
                                teacher_id,
                                limit,
                                current_load,
                            } => ApiError::CapacityExceeded {
                                teacher_id,
                                teacher_name: teacher.teacher_name.clone(),
                                limit,
                                current_load,
                            },
                            other => other.into(),
                        })?
                }
            };

            info!(event_id, team_id, teacher_id = ?teacher_id, "手动调整完成");

            Ok(ManualAssignResponse {
                event_id,
                team_id,
                teacher_id,
                replaced_existing: removed > 0,
                message,
            })
        })
    }

    /// 清空活动的全部临时分配（不影响已发布结果）
    pub fn clear_assignments(
        &self,
        event_id: i64,
        operator: &str,
    ) -> ApiResult<ClearAssignmentsResponse> {
        self.event_locks.with_event_lock(event_id, || {
            self.event_repo.get(event_id)?;
            let removed_count = self.assignment_repo.clear_event(event_id, |removed_count| {
                ActionLog::now(
                    event_id,
                    ActionType::ClearAssignments,
                    operator,
                    Some(json!({ "removed_count": removed_count })),
                    format!("清空临时分配 {} 条", removed_count),
                )
            })?;

            info!(event_id, removed_count, "临时分配已清空");
            Ok(ClearAssignmentsResponse {
                event_id,
                removed_count,
            })
        })
    }

    // ==========================================
    // 发布
    // ==========================================

    /// 发布临时分配到团队最终导师
    ///
    /// 先清空活动内全部团队的最终导师，再按草稿回放；草稿为空时整体回滚并报错。
    /// 草稿台账本身不受影响，可重复发布。
    #[instrument(skip(self))]
    pub fn publish(&self, event_id: i64, operator: &str) -> ApiResult<PublishResponse> {
        self.event_locks.with_event_lock(event_id, || {
            let event = self.event_repo.get(event_id)?;

            let message_for = |count: usize| {
                format!("活动「{}」已发布 {} 个团队的指导老师", event.event_name, count)
            };

            let published_count = self
                .assignment_repo
                .publish_to_teams(event_id, |published_count| {
                    ActionLog::now(
                        event_id,
                        ActionType::Publish,
                        operator,
                        Some(json!({ "published_count": published_count })),
                        message_for(published_count),
                    )
                })
                .map_err(|e| match e {
                    RepositoryError::BusinessRuleViolation(msg) => ApiError::PreconditionFailed(msg),
                    other => other.into(),
                })?;
            let message = message_for(published_count);

            info!(event_id, published_count, "发布完成");
            Ok(PublishResponse {
                event_id,
                published_count,
                message,
            })
        })
    }

    /// 撤销发布：清空活动内全部团队的最终导师（草稿不变）
    pub fn reset_publication(
        &self,
        event_id: i64,
        operator: &str,
    ) -> ApiResult<ResetPublicationResponse> {
        self.event_locks.with_event_lock(event_id, || {
            self.event_repo.get(event_id)?;
            let cleared_count = self.assignment_repo.reset_publication(event_id, |cleared_count| {
                ActionLog::now(
                    event_id,
                    ActionType::ResetPublication,
                    operator,
                    Some(json!({ "cleared_count": cleared_count })),
                    format!("撤销发布 {} 个团队", cleared_count),
                )
            })?;

            info!(event_id, cleared_count, "发布已撤销");
            Ok(ResetPublicationResponse {
                event_id,
                cleared_count,
            })
        })
    }

    // ==========================================
    // 候选诊断（只读）
    // ==========================================

    /// 单个团队的候选导师（分数、草稿负载、推荐等级）
    pub fn get_match_options(&self, event_id: i64, team_id: i64) -> ApiResult<TeamMatchOptions> {
        let ctx = self.load_diagnostic_context(event_id)?;
        let team = self.load_team_in_event(event_id, team_id)?;
        Ok(ctx.options_for(&team))
    }

    /// 全部团队的候选导师
    pub fn get_all_match_options(&self, event_id: i64) -> ApiResult<Vec<TeamMatchOptions>> {
        let ctx = self.load_diagnostic_context(event_id)?;
        let teams = self.team_repo.list_by_event(event_id)?;
        Ok(teams.iter().map(|t| ctx.options_for(t)).collect())
    }

    /// 查询活动操作日志
    pub fn list_action_logs(&self, event_id: i64, limit: usize) -> ApiResult<Vec<ActionLog>> {
        self.event_repo.get(event_id)?;
        self.action_log_repo
            .list_by_event(event_id, limit)
            .map_err(|e| ApiError::DatabaseError(e.to_string()))
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn scorer_for(&self, event_id: i64) -> ApiResult<MatchScorer> {
        let weights = self
            .config_manager
            .get_scoring_weights(Some(event_id))
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        Ok(MatchScorer::new(weights))
    }

    fn load_team_in_event(&self, event_id: i64, team_id: i64) -> ApiResult<Team> {
        let team = self
            .team_repo
            .find_by_id(team_id)?
            .ok_or_else(|| ApiError::NotFound(format!("团队(id={})不存在", team_id)))?;
        if team.event_id != event_id {
            return Err(ApiError::NotFound(format!(
                "团队(id={})不属于活动(id={})",
                team_id, event_id
            )));
        }
        Ok(team)
    }

    fn load_participating_teacher(&self, event_id: i64, teacher_id: i64) -> ApiResult<Teacher> {
        let teacher = self
            .teacher_repo
            .find_by_id(teacher_id)?
            .ok_or_else(|| ApiError::NotFound(format!("导师(id={})不存在", teacher_id)))?;
        if !self.event_repo.is_teacher_participant(event_id, teacher_id)? {
            return Err(ApiError::BusinessRuleViolation(format!(
                "导师{}(id={})未参与活动(id={})",
                teacher.teacher_name, teacher_id, event_id
            )));
        }
        Ok(teacher)
    }

    fn load_diagnostic_context(&self, event_id: i64) -> ApiResult<DiagnosticContext> {
        let event = self.event_repo.get(event_id)?;
        let teachers = self.event_repo.list_teachers(event_id)?;
        let preferences = self.preference_repo.list_by_event(event_id)?;
        let drafts = self.assignment_repo.list_by_event(event_id)?;
        let load = self.assignment_repo.load_by_teacher(event_id)?;

        Ok(DiagnosticContext {
            scorer: self.scorer_for(event_id)?,
            index: PreferenceIndex::from_preferences(&preferences),
            current: drafts.iter().map(|d| (d.team_id, d.teacher_id)).collect(),
            event,
            teachers,
            load,
        })
    }
}

/// 诊断计算所需的一次性快照
struct DiagnosticContext {
    event: SelectionEvent,
    teachers: Vec<Teacher>,
    scorer: MatchScorer,
    index: PreferenceIndex,
    load: HashMap<i64, i64>,
    current: HashMap<i64, i64>,
}

impl DiagnosticContext {
    fn options_for(&self, team: &Team) -> TeamMatchOptions {
        TeamMatchOptions {
            team_id: team.team_id,
            team_name: team.team_name.clone(),
            current_teacher_id: self.current.get(&team.team_id).copied(),
            options: match_options_for_team(
                &self.scorer,
                team,
                &self.teachers,
                &self.index,
                &self.load,
                self.event.teacher_choice_limit,
            ),
        }
    }
}
