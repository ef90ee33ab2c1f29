// ==========================================
// 毕业设计师生互选系统 - 团队领域模型
// ==========================================
// 团队隶属于唯一活动；有且仅有一名队长；
// 三个有序志愿导师槽位 + 一个权威导师字段（发布前为空）
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 志愿导师槽位数量
pub const PREFERRED_ADVISOR_SLOTS: usize = 3;

// ==========================================
// Team - 团队
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub team_id: i64,
    pub event_id: i64,
    pub team_name: String,
    pub project_title: String,
    pub captain_id: Option<i64>,

    /// 第一/二/三志愿导师（按槽位顺序）
    pub preferred_advisors: [Option<i64>; PREFERRED_ADVISOR_SLOTS],

    /// 最终指导老师（仅由发布写入）
    pub advisor: Option<i64>,

    pub created_at: NaiveDateTime,
}

impl Team {
    /// 查询导师在本团队志愿中的槽位（1 起始）
    pub fn preferred_slot_of(&self, teacher_id: i64) -> Option<usize> {
        self.preferred_advisors
            .iter()
            .position(|slot| *slot == Some(teacher_id))
            .map(|idx| idx + 1)
    }

    /// 已填写的志愿导师（按槽位顺序，跳过空位）
    pub fn preferred_advisor_ids(&self) -> Vec<i64> {
        self.preferred_advisors.iter().flatten().copied().collect()
    }
}

/// 校验志愿导师列表：同一导师不得占用多个槽位
pub fn validate_preferred_advisors(
    slots: &[Option<i64>; PREFERRED_ADVISOR_SLOTS],
) -> Result<(), String> {
    let filled: Vec<i64> = slots.iter().flatten().copied().collect();
    for (i, id) in filled.iter().enumerate() {
        if filled[i + 1..].contains(id) {
            return Err(format!("导师(id={})在志愿中重复出现", id));
        }
    }
    Ok(())
}

// ==========================================
// TeamMember - 团队成员
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub stu_id: i64,
    pub stu_no: String,
    pub stu_name: String,
    pub is_captain: bool,
}
