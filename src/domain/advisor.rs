// ==========================================
// 毕业设计师生互选系统 - 导师领域模型
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// ==========================================
// Teacher - 导师
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub teacher_id: i64,
    pub teacher_no: String,
    pub teacher_name: String,
    pub research_direction: Option<String>,
}

// ==========================================
// TeacherPreference - 导师对团队的志愿
// ==========================================
// (导师, 团队, 志愿顺序)；同一活动内志愿顺序唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherPreference {
    pub teacher_id: i64,
    pub team_id: i64,
    pub event_id: i64,
    pub preference_rank: i64,
}

/// 校验导师志愿表（rank -> team_id）
///
/// 规则:
/// - 条目数不超过 limit
/// - rank 位于 1..=limit
/// - 同一团队不得出现两次
///
/// rank 唯一性由 BTreeMap 的键天然保证。
pub fn validate_wishlist(wishlist: &BTreeMap<i64, i64>, limit: i64) -> Result<(), String> {
    if wishlist.len() as i64 > limit {
        return Err(format!(
            "志愿数量({})超过上限({})",
            wishlist.len(),
            limit
        ));
    }

    let mut seen = HashSet::new();
    for (rank, team_id) in wishlist {
        if *rank < 1 || *rank > limit {
            return Err(format!("志愿顺序 {} 超出范围 1..={}", rank, limit));
        }
        if !seen.insert(*team_id) {
            return Err(format!("团队(id={})被重复选择", team_id));
        }
    }
    Ok(())
}
