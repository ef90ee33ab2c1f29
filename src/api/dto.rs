// ==========================================
// 毕业设计师生互选系统 - API 响应结构
// ==========================================

use crate::domain::types::EventStatus;
use crate::engine::allocator::AllocationOutcome;
use crate::engine::recommendation::MatchOption;
use serde::{Deserialize, Serialize};

// ==========================================
// 自动分配
// ==========================================

/// 自动分配响应（管理员的主要观测面）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoAssignResponse {
    pub event_id: i64,
    pub total_teams: usize,
    pub total_teachers: usize,
    pub assigned_count: usize,
    pub preference_matched: usize,
    pub random_assigned: usize,
    pub over_capacity_count: usize,
    /// 非错误告警：发生超额分配的导师姓名
    pub over_capacity_teachers: Vec<String>,
    pub over_capacity_teacher_ids: Vec<i64>,
    pub message: String,
}

impl AutoAssignResponse {
    pub fn from_outcome(event_id: i64, outcome: &AllocationOutcome) -> Self {
        let message = if outcome.over_capacity_count > 0 {
            format!(
                "已为 {} 个团队生成临时分配，其中 {} 个超额分配，请检查导师: {}",
                outcome.assigned_count(),
                outcome.over_capacity_count,
                outcome.over_capacity_teachers.join("、")
            )
        } else {
            format!("已为 {} 个团队生成临时分配", outcome.assigned_count())
        };

        Self {
            event_id,
            total_teams: outcome.total_teams,
            total_teachers: outcome.total_teachers,
            assigned_count: outcome.assigned_count(),
            preference_matched: outcome.preference_matched,
            random_assigned: outcome.random_assigned,
            over_capacity_count: outcome.over_capacity_count,
            over_capacity_teachers: outcome.over_capacity_teachers.clone(),
            over_capacity_teacher_ids: outcome.over_capacity_teacher_ids.clone(),
            message,
        }
    }
}

// ==========================================
// 草稿台账
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualAssignResponse {
    pub event_id: i64,
    pub team_id: i64,
    pub teacher_id: Option<i64>,
    /// 是否替换/删除了已有草稿
    pub replaced_existing: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearAssignmentsResponse {
    pub event_id: i64,
    pub removed_count: usize,
}

// ==========================================
// 发布
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResponse {
    pub event_id: i64,
    pub published_count: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPublicationResponse {
    pub event_id: i64,
    pub cleared_count: usize,
}

// ==========================================
// 诊断
// ==========================================

/// 单个团队的候选导师列表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMatchOptions {
    pub team_id: i64,
    pub team_name: String,
    /// 当前草稿中的导师
    pub current_teacher_id: Option<i64>,
    pub options: Vec<MatchOption>,
}

// ==========================================
// 活动 / 导师视图
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventStatusResponse {
    pub event_id: i64,
    pub event_name: String,
    pub status: EventStatus,
    pub status_label: String,
    pub student_window_open: bool,
    pub teacher_window_open: bool,
    pub team_count: usize,
    pub teacher_count: usize,
    pub draft_count: usize,
    pub published_count: usize,
}

/// 导师志愿条目（含团队名称）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub preference_rank: i64,
    pub team_id: i64,
    pub team_name: String,
    pub project_title: String,
}

/// 导师在活动内的工作台
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherDashboard {
    pub event_id: i64,
    pub teacher_id: i64,
    pub teacher_choice_limit: i64,
    pub teacher_window_open: bool,
    pub wishlist: Vec<WishlistEntry>,
    /// 团队把该导师列为志愿的情况: (team_id, team_name, slot)
    pub chosen_by_teams: Vec<ChosenByTeam>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChosenByTeam {
    pub team_id: i64,
    pub team_name: String,
    pub slot: usize,
}

/// 导师历史活动（仅两侧窗口都已结束的活动）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherHistoryEntry {
    pub event_id: i64,
    pub event_name: String,
    pub advised_teams: Vec<AdvisedTeam>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisedTeam {
    pub team_id: i64,
    pub team_name: String,
    pub project_title: String,
}
