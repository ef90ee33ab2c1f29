// ==========================================
// 毕业设计师生互选系统 - 匹配候选诊断
// ==========================================
// 红线: 只读诊断,不产生任何持久化影响
// ==========================================
// 职责: 为团队列出全部导师的匹配分、当前草稿负载与推荐等级
// 推荐等级阈值: strong >= 18, recommended >= 10, optional >= 5, poor > 0, none = 0
// ==========================================

use crate::domain::advisor::Teacher;
use crate::domain::team::Team;
use crate::domain::types::RecommendationTier;
use crate::engine::scoring::{MatchScorer, PreferenceIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const TIER_STRONG_MIN: f64 = 18.0;
pub const TIER_RECOMMENDED_MIN: f64 = 10.0;
pub const TIER_OPTIONAL_MIN: f64 = 5.0;

/// 按匹配分划分推荐等级
pub fn tier_for_score(score: f64) -> RecommendationTier {
    if score >= TIER_STRONG_MIN {
        RecommendationTier::Strong
    } else if score >= TIER_RECOMMENDED_MIN {
        RecommendationTier::Recommended
    } else if score >= TIER_OPTIONAL_MIN {
        RecommendationTier::Optional
    } else if score > 0.0 {
        RecommendationTier::Poor
    } else {
        RecommendationTier::None
    }
}

// ==========================================
// MatchOption - 单个导师候选
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOption {
    pub teacher_id: i64,
    pub teacher_no: String,
    pub teacher_name: String,

    // ===== 评分 =====
    pub score: f64,
    pub explanation: String,
    pub advisor_rank: Option<i64>,
    pub team_slot: Option<usize>,
    pub tier: RecommendationTier,

    // ===== 容量 =====
    pub current_load: i64,
    pub capacity_limit: i64,
    /// 草稿负载已达上限（手动调整会被拒绝）
    pub is_full: bool,
    /// 草稿负载已超过上限（超额分配所致）
    pub is_over_capacity: bool,
}

/// 计算团队对全部导师的候选列表（分数降序，同分按 teacher_id 升序）
///
/// # 参数
/// - `load`: 当前草稿负载（teacher_id -> 团队数）
pub fn match_options_for_team(
    scorer: &MatchScorer,
    team: &Team,
    teachers: &[Teacher],
    index: &PreferenceIndex,
    load: &HashMap<i64, i64>,
    capacity_limit: i64,
) -> Vec<MatchOption> {
    let mut options: Vec<MatchOption> = teachers
        .iter()
        .map(|t| {
            let s = scorer.score(team, t.teacher_id, index);
            let current_load = load.get(&t.teacher_id).copied().unwrap_or(0);
            MatchOption {
                teacher_id: t.teacher_id,
                teacher_no: t.teacher_no.clone(),
                teacher_name: t.teacher_name.clone(),
                tier: tier_for_score(s.value),
                score: s.value,
                explanation: s.explanation,
                advisor_rank: s.advisor_rank,
                team_slot: s.team_slot,
                current_load,
                capacity_limit,
                is_full: current_load >= capacity_limit,
                is_over_capacity: current_load > capacity_limit,
            }
        })
        .collect();

    options.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.teacher_id.cmp(&b.teacher_id))
    });
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::advisor::TeacherPreference;
    use chrono::NaiveDate;

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(tier_for_score(22.0), RecommendationTier::Strong);
        assert_eq!(tier_for_score(18.0), RecommendationTier::Strong);
        assert_eq!(tier_for_score(14.6), RecommendationTier::Recommended);
        assert_eq!(tier_for_score(10.0), RecommendationTier::Recommended);
        assert_eq!(tier_for_score(5.0), RecommendationTier::Optional);
        assert_eq!(tier_for_score(2.4), RecommendationTier::Poor);
        assert_eq!(tier_for_score(0.0), RecommendationTier::None);
    }

    #[test]
    fn test_options_sorted_with_load_flags() {
        let team = Team {
            team_id: 1,
            event_id: 1,
            team_name: "T1".to_string(),
            project_title: String::new(),
            captain_id: None,
            preferred_advisors: [Some(2), None, None],
            advisor: None,
            created_at: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        };
        let teachers: Vec<Teacher> = (1..=3)
            .map(|id| Teacher {
                teacher_id: id,
                teacher_no: format!("T{:03}", id),
                teacher_name: format!("导师{}", id),
                research_direction: None,
            })
            .collect();
        let index = PreferenceIndex::from_preferences(&[TeacherPreference {
            teacher_id: 3,
            team_id: 1,
            event_id: 1,
            preference_rank: 1,
        }]);
        let load = HashMap::from([(2, 2), (3, 3)]);

        let options =
            match_options_for_team(&MatchScorer::default(), &team, &teachers, &index, &load, 2);

        let ids: Vec<i64> = options.iter().map(|o| o.teacher_id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(options[0].tier, RecommendationTier::Recommended);
        assert!(options[0].is_over_capacity);
        assert!(options[1].is_full && !options[1].is_over_capacity);
        assert_eq!(options[2].tier, RecommendationTier::None);
        assert!(!options[2].is_full);
    }
}
