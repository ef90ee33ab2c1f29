// ==========================================
// 毕业设计师生互选系统 - 操作日志领域模型
// ==========================================
// 所有改变草稿台账或权威导师字段的操作都必须记录
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,
    pub event_id: Option<i64>,
    pub action_type: ActionType,
    pub action_ts: NaiveDateTime,
    pub actor: String,

    // ===== 操作负载（统计结果/参数） =====
    pub payload_json: Option<JsonValue>,

    pub detail: Option<String>,
}

impl ActionLog {
    /// 以当前本地时间构造日志，action_id 由 uuid v4 生成
    pub fn now(
        event_id: i64,
        action_type: ActionType,
        actor: &str,
        payload_json: Option<JsonValue>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            event_id: Some(event_id),
            action_type,
            action_ts: chrono::Local::now().naive_local(),
            actor: actor.to_string(),
            payload_json,
            detail: Some(detail.into()),
        }
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    AutoAssign,          // 自动分配
    ManualAssign,        // 手动调整
    ClearAssignments,    // 清空草稿
    Publish,             // 发布
    ResetPublication,    // 撤销发布
    SubmitPreferences,   // 导师提交志愿
    UpdateTeamPreferences, // 团队更新志愿导师
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::AutoAssign => "AUTO_ASSIGN",
            ActionType::ManualAssign => "MANUAL_ASSIGN",
            ActionType::ClearAssignments => "CLEAR_ASSIGNMENTS",
            ActionType::Publish => "PUBLISH",
            ActionType::ResetPublication => "RESET_PUBLICATION",
            ActionType::SubmitPreferences => "SUBMIT_PREFERENCES",
            ActionType::UpdateTeamPreferences => "UPDATE_TEAM_PREFERENCES",
        }
    }

    pub fn parse(s: &str) -> Option<ActionType> {
        match s.trim().to_uppercase().as_str() {
            "AUTO_ASSIGN" => Some(ActionType::AutoAssign),
            "MANUAL_ASSIGN" => Some(ActionType::ManualAssign),
            "CLEAR_ASSIGNMENTS" => Some(ActionType::ClearAssignments),
            "PUBLISH" => Some(ActionType::Publish),
            "RESET_PUBLICATION" => Some(ActionType::ResetPublication),
            "SUBMIT_PREFERENCES" => Some(ActionType::SubmitPreferences),
            "UPDATE_TEAM_PREFERENCES" => Some(ActionType::UpdateTeamPreferences),
            _ => None,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
