// ==========================================
// 毕业设计师生互选系统 - 临时分配（草稿台账）领域模型
// ==========================================
// 每个活动每个团队至多一条；发布前不影响 team.advisor
// ==========================================

use super::types::AssignmentType;
use serde::{Deserialize, Serialize};

/// 手动调整的分数哨兵值（高于任何自动匹配得分，列表中排在最前）
pub const MANUAL_OVERRIDE_SCORE: f64 = 999.0;

/// 手动调整说明
pub const EXPLANATION_MANUAL: &str = "administrator override";

// ==========================================
// ProvisionalAssignment - 临时分配
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionalAssignment {
    pub event_id: i64,
    pub team_id: i64,
    pub teacher_id: i64,
    pub assignment_type: AssignmentType,
    pub score: f64,
    pub explanation: String,
}

impl ProvisionalAssignment {
    /// 构造手动调整记录
    pub fn manual(event_id: i64, team_id: i64, teacher_id: i64) -> Self {
        Self {
            event_id,
            team_id,
            teacher_id,
            assignment_type: AssignmentType::Manual,
            score: MANUAL_OVERRIDE_SCORE,
            explanation: EXPLANATION_MANUAL.to_string(),
        }
    }
}

// ==========================================
// AssignmentView - 临时分配展示视图（含团队/导师冗余信息）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentView {
    pub event_id: i64,
    pub team_id: i64,
    pub team_name: String,
    pub project_title: String,
    pub teacher_id: i64,
    pub teacher_no: String,
    pub teacher_name: String,
    pub score: f64,
    pub explanation: String,
    pub assignment_type: AssignmentType,
}
