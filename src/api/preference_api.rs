// ==========================================
// 毕业设计师生互选系统 - 志愿管理 API
// ==========================================
// 职责: 导师志愿提交、团队志愿导师维护、导师工作台与历史
// 约束:
// - 导师志愿只能在教师端窗口内提交，重新提交整体替换
// - 团队志愿导师只能由队长在学生端窗口内修改
// ==========================================

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde_json::json;
use tracing::{info, instrument};

use crate::api::dto::{
    AdvisedTeam, ChosenByTeam, TeacherDashboard, TeacherHistoryEntry, WishlistEntry,
};
use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::advisor::validate_wishlist;
use crate::domain::team::{validate_preferred_advisors, PREFERRED_ADVISOR_SLOTS};
use crate::repository::{
    SelectionEventRepository, TeacherPreferenceRepository, TeacherRepository, TeamRepository,
};

/// 校验团队志愿导师：无重复且均为活动参与导师
pub(crate) fn check_preferred_advisors(
    event_repo: &SelectionEventRepository,
    event_id: i64,
    preferred: &[Option<i64>; PREFERRED_ADVISOR_SLOTS],
) -> ApiResult<()> {
    validate_preferred_advisors(preferred).map_err(ApiError::ValidationError)?;
    for teacher_id in preferred.iter().flatten() {
        if !event_repo.is_teacher_participant(event_id, *teacher_id)? {
            return Err(ApiError::ValidationError(format!(
                "志愿导师(id={})未参与活动(id={})",
                teacher_id, event_id
            )));
        }
    }
    Ok(())
}

// ==========================================
// PreferenceApi - 志愿管理 API
// ==========================================
pub struct PreferenceApi {
    event_repo: Arc<SelectionEventRepository>,
    team_repo: Arc<TeamRepository>,
    teacher_repo: Arc<TeacherRepository>,
    preference_repo: Arc<TeacherPreferenceRepository>,
}

impl PreferenceApi {
    pub fn new(
        event_repo: Arc<SelectionEventRepository>,
        team_repo: Arc<TeamRepository>,
        teacher_repo: Arc<TeacherRepository>,
        preference_repo: Arc<TeacherPreferenceRepository>,
    ) -> Self {
        Self {
            event_repo,
            team_repo,
            teacher_repo,
            preference_repo,
        }
    }

    // ==========================================
    // 导师志愿
    // ==========================================

    /// 导师提交志愿（当前本地时间）
    pub fn submit_teacher_preferences(
        &self,
        event_id: i64,
        teacher_id: i64,
        wishlist: &BTreeMap<i64, i64>,
    ) -> ApiResult<usize> {
        self.submit_teacher_preferences_at(
            event_id,
            teacher_id,
            wishlist,
            chrono::Local::now().naive_local(),
        )
    }

    /// 导师提交志愿
    ///
    /// # 参数
    /// - wishlist: 志愿顺序 -> team_id
    ///
    /// # 规则
    /// - 教师端窗口开放；导师参与该活动
    /// - 条目数 <= teacher_choice_limit；志愿顺序位于 1..=limit 且唯一；团队不重复且属于该活动
    /// - 旧志愿删除与新志愿插入在同一事务内完成
    #[instrument(skip(self, wishlist), fields(entries = wishlist.len()))]
    pub fn submit_teacher_preferences_at(
        &self,
        event_id: i64,
        teacher_id: i64,
        wishlist: &BTreeMap<i64, i64>,
        now: NaiveDateTime,
    ) -> ApiResult<usize> {
        let event = self.event_repo.get(event_id)?;

        if !event.is_teacher_window_open(now) {
            return Err(ApiError::PreconditionFailed(format!(
                "活动「{}」教师端志愿窗口未开放（{} ~ {}）",
                event.event_name, event.tea_start_time, event.tea_end_time
            )));
        }
        if !self.event_repo.is_teacher_participant(event_id, teacher_id)? {
            return Err(ApiError::BusinessRuleViolation(format!(
                "导师(id={})未参与活动(id={})",
                teacher_id, event_id
            )));
        }

        validate_wishlist(wishlist, event.teacher_choice_limit)
            .map_err(ApiError::ValidationError)?;

        for team_id in wishlist.values() {
            let team = self
                .team_repo
                .find_by_id(*team_id)?
                .ok_or_else(|| ApiError::NotFound(format!("团队(id={})不存在", team_id)))?;
            if team.event_id != event_id {
                return Err(ApiError::ValidationError(format!(
                    "团队(id={})不属于活动(id={})",
                    team_id, event_id
                )));
            }
        }

        let entries: Vec<(i64, i64)> = wishlist.iter().map(|(r, t)| (*r, *t)).collect();
        let count = self
            .preference_repo
            .replace_for_teacher(event_id, teacher_id, &entries, |count| {
                ActionLog::now(
                    event_id,
                    ActionType::SubmitPreferences,
                    &format!("teacher:{}", teacher_id),
                    Some(json!({ "teacher_id": teacher_id, "wishlist": wishlist })),
                    format!("导师提交志愿 {} 条", count),
                )
            })?;

        info!(event_id, teacher_id, count, "导师志愿已提交");
        Ok(count)
    }

    // ==========================================
    // 团队志愿导师
    // ==========================================

    /// 队长修改团队志愿导师（当前本地时间）
    pub fn set_team_preferences(
        &self,
        event_id: i64,
        team_id: i64,
        captain_id: i64,
        preferred: [Option<i64>; PREFERRED_ADVISOR_SLOTS],
    ) -> ApiResult<()> {
        self.set_team_preferences_at(
            event_id,
            team_id,
            captain_id,
            preferred,
            chrono::Local::now().naive_local(),
        )
    }

    /// 队长修改团队志愿导师
    ///
    /// # 规则
    /// - 仅队长可修改；学生端窗口开放
    /// - 志愿导师均为活动参与导师且不重复
    #[instrument(skip(self))]
    pub fn set_team_preferences_at(
        &self,
        event_id: i64,
        team_id: i64,
        captain_id: i64,
        preferred: [Option<i64>; PREFERRED_ADVISOR_SLOTS],
        now: NaiveDateTime,
    ) -> ApiResult<()> {
        let event = self.event_repo.get(event_id)?;
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

        if team.captain_id != Some(captain_id) {
            return Err(ApiError::BusinessRuleViolation(format!(
                "只有队长可以修改团队「{}」的志愿导师",
                team.team_name
            )));
        }
        if !event.is_student_window_open(now) {
            return Err(ApiError::PreconditionFailed(format!(
                "活动「{}」学生端志愿窗口未开放（{} ~ {}）",
                event.event_name, event.stu_start_time, event.stu_end_time
            )));
        }

        check_preferred_advisors(&self.event_repo, event_id, &preferred)?;

        let action_log = ActionLog::now(
            event_id,
            ActionType::UpdateTeamPreferences,
            &format!("student:{}", captain_id),
            Some(json!({ "team_id": team_id, "preferred_advisors": preferred })),
            format!("团队「{}」更新志愿导师", team.team_name),
        );
        self.team_repo
            .update_preferred_advisors(team_id, &preferred, &action_log)?;

        info!(event_id, team_id, "团队志愿导师已更新");
        Ok(())
    }

    // ==========================================
    // 导师工作台 / 历史
    // ==========================================

    /// 导师在活动内的工作台（当前本地时间）
    pub fn teacher_dashboard(&self, event_id: i64, teacher_id: i64) -> ApiResult<TeacherDashboard> {
        self.teacher_dashboard_at(event_id, teacher_id, chrono::Local::now().naive_local())
    }

    /// 导师在活动内的工作台：已提交志愿 + 把自己列为志愿导师的团队
    pub fn teacher_dashboard_at(
        &self,
        event_id: i64,
        teacher_id: i64,
        now: NaiveDateTime,
    ) -> ApiResult<TeacherDashboard> {
        let event = self.event_repo.get(event_id)?;
        if !self.event_repo.is_teacher_participant(event_id, teacher_id)? {
            return Err(ApiError::NotFound(format!(
                "导师(id={})未参与活动(id={})",
                teacher_id, event_id
            )));
        }

        let teams = self.team_repo.list_by_event(event_id)?;
        let by_id: HashMap<i64, _> = teams.iter().map(|t| (t.team_id, t)).collect();

        let wishlist = self
            .preference_repo
            .list_by_teacher(event_id, teacher_id)?
            .into_iter()
            .filter_map(|p| {
                by_id.get(&p.team_id).map(|t| WishlistEntry {
                    preference_rank: p.preference_rank,
                    team_id: t.team_id,
                    team_name: t.team_name.clone(),
                    project_title: t.project_title.clone(),
                })
            })
            .collect();

        let chosen_by_teams = teams
            .iter()
            .filter_map(|t| {
                t.preferred_slot_of(teacher_id).map(|slot| ChosenByTeam {
                    team_id: t.team_id,
                    team_name: t.team_name.clone(),
                    slot,
                })
            })
            .collect();

        Ok(TeacherDashboard {
            event_id,
            teacher_id,
            teacher_choice_limit: event.teacher_choice_limit,
            teacher_window_open: event.is_teacher_window_open(now),
            wishlist,
            chosen_by_teams,
        })
    }

    /// 导师历史活动（当前本地时间）
    pub fn teacher_history(&self, teacher_id: i64) -> ApiResult<Vec<TeacherHistoryEntry>> {
        self.teacher_history_at(teacher_id, chrono::Local::now().naive_local())
    }

    /// 导师参与过且已结束的活动，附带已发布的指导团队
    pub fn teacher_history_at(
        &self,
        teacher_id: i64,
        now: NaiveDateTime,
    ) -> ApiResult<Vec<TeacherHistoryEntry>> {
        self.teacher_repo
            .find_by_id(teacher_id)?
            .ok_or_else(|| ApiError::NotFound(format!("导师(id={})不存在", teacher_id)))?;

        let events = self.event_repo.list_ended_for_teacher(teacher_id, now)?;
        let mut history = Vec::with_capacity(events.len());
        for event in events {
            let advised_teams = self
                .team_repo
                .list_by_advisor(event.event_id, teacher_id)?
                .into_iter()
                .map(|t| AdvisedTeam {
                    team_id: t.team_id,
                    team_name: t.team_name,
                    project_title: t.project_title,
                })
                .collect();
            history.push(TeacherHistoryEntry {
                event_id: event.event_id,
                event_name: event.event_name,
                advised_teams,
            });
        }
        Ok(history)
    }
}
