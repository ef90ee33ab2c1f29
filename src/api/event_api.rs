// ==========================================
// 毕业设计师生互选系统 - 活动与团队 API
// ==========================================
// 职责: 活动创建与状态查询、参与者登记、团队组建与成员规则
// 约束:
// - 活动状态不落库，始终由当前时间推导
// - 同一活动内学生只能加入一个团队；团队人数不超过 group_member_limit
// ==========================================

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::info;

use crate::api::dto::EventStatusResponse;
use crate::api::error::{ApiError, ApiResult};
use crate::api::preference_api::check_preferred_advisors;
use crate::config::ConfigManager;
use crate::domain::event::SelectionEvent;
use crate::domain::team::{Team, TeamMember, PREFERRED_ADVISOR_SLOTS};
use crate::repository::{
    ProvisionalAssignmentRepository, SelectionEventRepository, TeacherRepository, TeamRepository,
};

/// 新建活动参数
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub event_name: String,
    pub stu_start_time: NaiveDateTime,
    pub stu_end_time: NaiveDateTime,
    pub tea_start_time: NaiveDateTime,
    pub tea_end_time: NaiveDateTime,
    /// None => 使用配置 default_teacher_choice_limit
    pub teacher_choice_limit: Option<i64>,
    /// None => 使用配置 default_group_member_limit
    pub group_member_limit: Option<i64>,
}

// ==========================================
// EventApi - 活动与团队 API
// ==========================================
pub struct EventApi {
    event_repo: Arc<SelectionEventRepository>,
    team_repo: Arc<TeamRepository>,
    teacher_repo: Arc<TeacherRepository>,
    assignment_repo: Arc<ProvisionalAssignmentRepository>,
    config_manager: Arc<ConfigManager>,
}

impl EventApi {
    pub fn new(
        event_repo: Arc<SelectionEventRepository>,
        team_repo: Arc<TeamRepository>,
        teacher_repo: Arc<TeacherRepository>,
        assignment_repo: Arc<ProvisionalAssignmentRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            event_repo,
            team_repo,
            teacher_repo,
            assignment_repo,
            config_manager,
        }
    }

    // ==========================================
    // 活动
    // ==========================================

    /// 创建活动
    ///
    /// # 返回
    /// - Ok(event_id)
    /// - Err(ApiError::ValidationError): 窗口或容量参数不合法
    pub fn create_event(&self, input: NewEvent) -> ApiResult<i64> {
        let teacher_choice_limit = match input.teacher_choice_limit {
            Some(v) => v,
            None => self
                .config_manager
                .get_default_teacher_choice_limit()
                .map_err(|e| ApiError::InternalError(e.to_string()))?,
        };
        let group_member_limit = match input.group_member_limit {
            Some(v) => v,
            None => self
                .config_manager
                .get_default_group_member_limit()
                .map_err(|e| ApiError::InternalError(e.to_string()))?,
        };

        let event = SelectionEvent {
            event_id: 0,
            event_name: input.event_name.trim().to_string(),
            stu_start_time: input.stu_start_time,
            stu_end_time: input.stu_end_time,
            tea_start_time: input.tea_start_time,
            tea_end_time: input.tea_end_time,
            teacher_choice_limit,
            group_member_limit,
        };
        event.validate().map_err(ApiError::ValidationError)?;

        let event_id = self.event_repo.insert(&event)?;
        info!(event_id, event_name = %event.event_name, "活动已创建");
        Ok(event_id)
    }

    /// 查询活动
    pub fn get_event(&self, event_id: i64) -> ApiResult<SelectionEvent> {
        Ok(self.event_repo.get(event_id)?)
    }

    /// 活动状态概览（当前本地时间）
    pub fn event_status(&self, event_id: i64) -> ApiResult<EventStatusResponse> {
        self.event_status_at(event_id, chrono::Local::now().naive_local())
    }

    /// 活动状态概览
    pub fn event_status_at(&self, event_id: i64, now: NaiveDateTime) -> ApiResult<EventStatusResponse> {
        let event = self.event_repo.get(event_id)?;
        let teams = self.team_repo.list_by_event(event_id)?;
        let teachers = self.event_repo.list_teachers(event_id)?;
        let drafts = self.assignment_repo.list_by_event(event_id)?;
        let status = event.status_at(now);

        Ok(EventStatusResponse {
            event_id,
            event_name: event.event_name.clone(),
            status,
            status_label: status.label_cn().to_string(),
            student_window_open: event.is_student_window_open(now),
            teacher_window_open: event.is_teacher_window_open(now),
            team_count: teams.len(),
            teacher_count: teachers.len(),
            draft_count: drafts.len(),
            published_count: teams.iter().filter(|t| t.advisor.is_some()).count(),
        })
    }

    // ==========================================
    // 参与者
    // ==========================================

    /// 登记参与导师
    pub fn add_teacher(&self, event_id: i64, teacher_id: i64) -> ApiResult<()> {
        self.event_repo.get(event_id)?;
        self.teacher_repo
            .find_by_id(teacher_id)?
            .ok_or_else(|| ApiError::NotFound(format!("导师(id={})不存在", teacher_id)))?;
        self.event_repo.add_teacher(event_id, teacher_id)?;
        Ok(())
    }

    /// 登记参与学生
    pub fn add_student(&self, event_id: i64, stu_id: i64) -> ApiResult<()> {
        self.event_repo.get(event_id)?;
        self.event_repo.add_student(event_id, stu_id)?;
        Ok(())
    }

    // ==========================================
    // 团队
    // ==========================================

    /// 组建团队（创建者为队长并自动成为成员）
    ///
    /// # 规则
    /// - 队长必须是活动参与学生，且尚未加入该活动的其他团队
    /// - 志愿导师必须是活动参与导师，且不得重复
    pub fn create_team(
        &self,
        event_id: i64,
        captain_id: i64,
        team_name: &str,
        project_title: &str,
        preferred: [Option<i64>; PREFERRED_ADVISOR_SLOTS],
    ) -> ApiResult<i64> {
        self.event_repo.get(event_id)?;

        if team_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("团队名称不能为空".to_string()));
        }
        if !self.event_repo.is_student_participant(event_id, captain_id)? {
            return Err(ApiError::BusinessRuleViolation(format!(
                "学生(id={})未参与活动(id={})",
                captain_id, event_id
            )));
        }
        if let Some(existing) = self.team_repo.find_team_of_student(event_id, captain_id)? {
            return Err(ApiError::BusinessRuleViolation(format!(
                "学生(id={})已加入团队(id={})",
                captain_id, existing
            )));
        }
        check_preferred_advisors(&self.event_repo, event_id, &preferred)?;

        let team_id = self.team_repo.create_with_captain(
            event_id,
            team_name.trim(),
            project_title.trim(),
            captain_id,
            &preferred,
        )?;
        info!(event_id, team_id, captain_id, "团队已创建");
        Ok(team_id)
    }

    /// 添加团队成员
    ///
    /// # 规则
    /// - 学生必须是活动参与学生，且尚未加入该活动的任何团队
    /// - 加入后人数不超过 group_member_limit（含队长）
    pub fn add_team_member(&self, team_id: i64, stu_id: i64) -> ApiResult<()> {
        let team = self.load_team(team_id)?;
        let event = self.event_repo.get(team.event_id)?;

        if !self.event_repo.is_student_participant(event.event_id, stu_id)? {
            return Err(ApiError::BusinessRuleViolation(format!(
                "学生(id={})未参与活动(id={})",
                stu_id, event.event_id
            )));
        }
        if let Some(existing) = self.team_repo.find_team_of_student(event.event_id, stu_id)? {
            return Err(ApiError::BusinessRuleViolation(format!(
                "学生(id={})已加入团队(id={})",
                stu_id, existing
            )));
        }
        let count = self.team_repo.count_members(team_id)?;
        if count >= event.group_member_limit {
            return Err(ApiError::BusinessRuleViolation(format!(
                "团队「{}」人数已达上限({})",
                team.team_name, event.group_member_limit
            )));
        }

        self.team_repo.add_member(team_id, event.event_id, stu_id)?;
        Ok(())
    }

    /// 查询团队
    pub fn get_team(&self, team_id: i64) -> ApiResult<Team> {
        self.load_team(team_id)
    }

    /// 查询团队成员（队长在前）
    pub fn list_team_members(&self, team_id: i64) -> ApiResult<Vec<TeamMember>> {
        self.load_team(team_id)?;
        Ok(self.team_repo.list_members(team_id)?)
    }

    fn load_team(&self, team_id: i64) -> ApiResult<Team> {
        self.team_repo
            .find_by_id(team_id)?
            .ok_or_else(|| ApiError::NotFound(format!("团队(id={})不存在", team_id)))
    }
}
