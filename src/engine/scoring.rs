// ==========================================
// 毕业设计师生互选系统 - 匹配评分引擎
// ==========================================
// 红线: 纯函数,不访问数据库,每个分数必须附带说明
// ==========================================
// 职责: 计算 (团队, 导师) 组合的双向志愿匹配分
// 输入: 团队志愿导师槽位 + 导师志愿顺序索引
// 输出: MatchScore { value, explanation }
// ==========================================

use crate::config::scoring_profile::ScoringWeights;
use crate::domain::advisor::TeacherPreference;
use crate::domain::team::Team;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 无志愿关联时的说明
pub const EXPLANATION_NO_MATCH: &str = "no preference match";

// ==========================================
// PreferenceIndex - 导师志愿索引
// ==========================================
// (teacher_id, team_id) -> preference_rank
#[derive(Debug, Clone, Default)]
pub struct PreferenceIndex {
    ranks: HashMap<(i64, i64), i64>,
}

impl PreferenceIndex {
    pub fn from_preferences(preferences: &[TeacherPreference]) -> Self {
        let ranks = preferences
            .iter()
            .map(|p| ((p.teacher_id, p.team_id), p.preference_rank))
            .collect();
        Self { ranks }
    }

    /// 导师对团队的志愿顺序
    pub fn rank_of(&self, teacher_id: i64, team_id: i64) -> Option<i64> {
        self.ranks.get(&(teacher_id, team_id)).copied()
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

// ==========================================
// MatchScore - 匹配得分
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub value: f64,
    pub explanation: String,

    /// 导师给该团队的志愿顺序（未选择为 None）
    pub advisor_rank: Option<i64>,

    /// 团队给该导师的志愿槽位（未选择为 None）
    pub team_slot: Option<usize>,
}

impl MatchScore {
    /// 是否存在非零的志愿贡献
    pub fn has_preference_match(&self) -> bool {
        self.value > 0.0
    }
}

// ==========================================
// MatchScorer - 匹配评分器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct MatchScorer {
    weights: ScoringWeights,
}

impl MatchScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// 计算团队与导师的匹配分
    ///
    /// 总分 = 导师志愿分 × 导师加权系数 + 团队志愿分，按配置小数位四舍五入
    pub fn score(&self, team: &Team, teacher_id: i64, index: &PreferenceIndex) -> MatchScore {
        let advisor_rank = index.rank_of(teacher_id, team.team_id);
        let team_slot = team.preferred_slot_of(teacher_id);

        let advisor_part = advisor_rank
            .map(|r| self.weights.advisor_rank_score(r) * self.weights.advisor_weight)
            .unwrap_or(0.0);
        let team_part = team_slot
            .map(|s| self.weights.team_slot_score(s))
            .unwrap_or(0.0);

        let value = round_to(advisor_part + team_part, self.weights.decimal_places);

        let mut parts = Vec::with_capacity(2);
        if advisor_part > 0.0 {
            if let Some(r) = advisor_rank {
                parts.push(format!("advisor rank {}", r));
            }
        }
        if team_part > 0.0 {
            if let Some(s) = team_slot {
                parts.push(format!("team rank {}", s));
            }
        }
        let explanation = if parts.is_empty() {
            EXPLANATION_NO_MATCH.to_string()
        } else {
            parts.join(" + ")
        };

        MatchScore {
            value,
            explanation,
            advisor_rank,
            team_slot,
        }
    }
}

fn round_to(value: f64, decimal_places: u32) -> f64 {
    let factor = 10f64.powi(decimal_places as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn team(team_id: i64, preferred: [Option<i64>; 3]) -> Team {
        Team {
            team_id,
            event_id: 1,
            team_name: format!("T{}", team_id),
            project_title: String::new(),
            captain_id: None,
            preferred_advisors: preferred,
            advisor: None,
            created_at: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        }
    }

    fn pref(teacher_id: i64, team_id: i64, rank: i64) -> TeacherPreference {
        TeacherPreference {
            teacher_id,
            team_id,
            event_id: 1,
            preference_rank: rank,
        }
    }

    #[test]
    fn test_mutual_top_pick() {
        let scorer = MatchScorer::default();
        let index = PreferenceIndex::from_preferences(&[pref(10, 1, 1)]);
        let s = scorer.score(&team(1, [Some(10), None, None]), 10, &index);
        assert_eq!(s.value, 22.0);
        assert_eq!(s.explanation, "advisor rank 1 + team rank 1");
        assert_eq!(s.advisor_rank, Some(1));
        assert_eq!(s.team_slot, Some(1));
    }

    #[test]
    fn test_single_side_contributions() {
        let scorer = MatchScorer::default();
        let index = PreferenceIndex::from_preferences(&[pref(10, 1, 2)]);

        let advisor_only = scorer.score(&team(1, [None, None, None]), 10, &index);
        assert_eq!(advisor_only.value, 9.6);
        assert_eq!(advisor_only.explanation, "advisor rank 2");

        let team_only = scorer.score(&team(1, [None, Some(20), None]), 20, &index);
        assert_eq!(team_only.value, 5.0);
        assert_eq!(team_only.explanation, "team rank 2");
    }

    #[test]
    fn test_no_match() {
        let scorer = MatchScorer::default();
        let s = scorer.score(&team(1, [Some(11), None, None]), 10, &PreferenceIndex::default());
        assert_eq!(s.value, 0.0);
        assert_eq!(s.explanation, EXPLANATION_NO_MATCH);
        assert!(!s.has_preference_match());
    }

    #[test]
    fn test_rank_beyond_table_contributes_nothing() {
        let scorer = MatchScorer::default();
        let index = PreferenceIndex::from_preferences(&[pref(10, 1, 7)]);
        let s = scorer.score(&team(1, [None, None, None]), 10, &index);
        assert_eq!(s.value, 0.0);
        assert_eq!(s.explanation, EXPLANATION_NO_MATCH);
        assert_eq!(s.advisor_rank, Some(7));
    }

    #[test]
    fn test_score_is_pure() {
        let scorer = MatchScorer::default();
        let index = PreferenceIndex::from_preferences(&[pref(10, 1, 3)]);
        let t = team(1, [None, None, Some(10)]);
        assert_eq!(scorer.score(&t, 10, &index), scorer.score(&t, 10, &index));
    }
}
